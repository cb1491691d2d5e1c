pub mod change_feed;
pub mod config_service;
pub mod memory_thread_repository;
pub mod notifying_repository;
pub mod paths;
pub mod storage;
pub mod toml_thread_repository;
pub mod user_service;

pub use crate::change_feed::BroadcastChangeFeed;
pub use crate::config_service::ConfigService;
pub use crate::memory_thread_repository::InMemoryThreadRepository;
pub use crate::notifying_repository::NotifyingThreadRepository;
pub use crate::toml_thread_repository::TomlThreadRepository;
pub use crate::user_service::ConfigBasedIdentity;
