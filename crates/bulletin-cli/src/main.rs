use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use tokio::task::JoinHandle;

use bulletin_application::{ChatError, ChatSession, ChatView, SubmitOutcome};
use bulletin_core::chat::ThreadRepository;
use bulletin_core::identity::IdentityProvider;
use bulletin_infrastructure::paths::BulletinPaths;
use bulletin_infrastructure::{
    BroadcastChangeFeed, ConfigBasedIdentity, ConfigService, InMemoryThreadRepository,
    NotifyingThreadRepository, TomlThreadRepository,
};

mod commands;
mod helper;
mod logging;
mod render;

use commands::ReplCommand;
use helper::CliHelper;

#[derive(Parser)]
#[command(name = "bulletin")]
#[command(about = "Bulletin - realtime chat rooms for marketplace categories", long_about = None)]
struct Cli {
    /// Category whose chat to open on start
    #[arg(short, long)]
    category: Option<String>,

    /// Post as this user instead of the configured `user.email`
    #[arg(short, long)]
    user: Option<String>,

    /// Directory for config.toml, threads.toml and logs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep threads in memory only; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,

    /// Log filter, e.g. `debug` or `bulletin_application=trace`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ===== Configuration & Logging =====
    let paths = BulletinPaths::new(cli.data_dir.clone());
    let config = ConfigService::new(paths.config_file()?).load()?;
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let _log_guard = logging::init(&paths.logs_dir()?, log_level)?;
    tracing::info!(
        "[Main] Starting bulletin (ephemeral: {}, category: {:?})",
        cli.ephemeral,
        cli.category
    );

    // ===== Backend Initialization =====
    let feed = BroadcastChangeFeed::new();
    let repository: Arc<dyn ThreadRepository> = if cli.ephemeral {
        Arc::new(NotifyingThreadRepository::new(
            InMemoryThreadRepository::new(),
            feed.clone(),
        ))
    } else {
        Arc::new(NotifyingThreadRepository::new(
            TomlThreadRepository::new(paths.threads_file()?),
            feed.clone(),
        ))
    };
    let identity = Arc::new(ConfigBasedIdentity::new(&config, cli.user.clone()));
    let signed_in = identity.current_user();
    let session = Arc::new(ChatSession::new(
        repository,
        Arc::new(feed),
        identity,
        config.chat.clone(),
    ));

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Bulletin chat ===".bright_magenta().bold());
    match &signed_in {
        Some(user) => println!("{}", format!("Signed in as {}", user).bright_black()),
        None => println!(
            "{}",
            "Not signed in: read-only. Pass --user <email> or set user.email in config.toml."
                .yellow()
        ),
    }
    println!("{}", "Type /help for commands, or 'quit' to exit.".bright_black());

    if let Err(e) = session.open(cli.category.as_deref()).await {
        tracing::warn!("[Main] Initial open failed: {}", e);
    }
    render::print_view(&session.view().await);

    let renderer = spawn_renderer(Arc::clone(&session));

    // ===== Main REPL Loop =====
    loop {
        let draft = session.draft().await;
        let readline = if session.editing_id().await.is_some() {
            rl.readline_with_initial("edit> ", (draft.as_str(), ""))
        } else {
            rl.readline(">> ")
        };

        match readline {
            Ok(line) => {
                let Some(command) = commands::parse(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(line.as_str());

                if command == ReplCommand::Quit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                // The renderer prints the session's notice for every failure.
                if let Err(e) = run_command(&session, command).await {
                    tracing::debug!("[Main] Command failed: {}", e);
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                if session.editing_id().await.is_some() {
                    session.cancel_edit().await;
                    println!("{}", "Edit cancelled.".bright_black());
                } else {
                    println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                }
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                render::print_error(format!("{:?}", err));
                break;
            }
        }
    }

    renderer.abort();
    session.close().await;
    tracing::info!("[Main] Bye");

    Ok(())
}

async fn run_command(session: &ChatSession, command: ReplCommand) -> Result<(), ChatError> {
    match command {
        ReplCommand::Say(text) => {
            session.set_draft(text).await;
            match session.submit().await? {
                SubmitOutcome::Ignored => {}
                SubmitOutcome::Sent => tracing::debug!("[Main] Sent"),
                SubmitOutcome::Edited => println!("{}", "Message updated.".bright_black()),
            }
        }
        ReplCommand::Edit(index) => session.request_edit(index).await?,
        ReplCommand::Delete(index) => session.delete(index).await?,
        ReplCommand::Cancel => session.cancel_edit().await,
        ReplCommand::Open(category) => session.open(Some(&category)).await?,
        ReplCommand::Threads => render::print_threads(&session.thread_labels().await),
        ReplCommand::List => render::print_view(&session.view().await),
        ReplCommand::Help => render::print_help(),
        ReplCommand::Invalid(hint) => render::print_error(hint),
        ReplCommand::Quit => {}
    }
    Ok(())
}

/// Re-renders the chat whenever the session reports a change.
fn spawn_renderer(session: Arc<ChatSession>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut changes = session.changes();
        let mut shown = screen(session.view().await);
        while changes.changed().await.is_ok() {
            if let Some(notice) = session.take_notice().await {
                render::print_notice(&notice);
            }
            let view = screen(session.view().await);
            if view != shown {
                render::print_view(&view);
                shown = view;
            }
        }
    })
}

/// The parts of a view worth a redraw; typing into the draft is not.
fn screen(mut view: ChatView) -> ChatView {
    if let ChatView::Thread(thread) = &mut view {
        thread.notice = None;
        if let Some(composer) = &mut thread.composer {
            composer.draft.clear();
        }
    }
    view
}
