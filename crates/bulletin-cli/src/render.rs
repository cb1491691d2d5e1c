//! Terminal rendering of the chat view.

use colored::Colorize;

use bulletin_application::{ChannelStatus, ChatView, ThreadView};

/// Prints the whole chat screen.
pub fn print_view(view: &ChatView) {
    match view {
        ChatView::Placeholder { threads } => print_placeholder(threads),
        ChatView::Thread(thread) => print_thread(thread),
    }
}

fn print_placeholder(threads: &[String]) {
    println!("{}", "No chat selected.".bright_black());
    print_threads(threads);
    println!("{}", "Use /open <category> to join one.".bright_black());
}

pub fn print_threads(threads: &[String]) {
    if threads.is_empty() {
        println!("{}", "No category chats yet.".bright_black());
        return;
    }
    println!("{}", "Category chats:".bright_yellow());
    for label in threads {
        println!("  {}", format!("- {}", label).yellow());
    }
}

fn print_thread(view: &ThreadView) {
    println!();
    println!("{}", format!("=== {} ===", view.label).bright_magenta().bold());
    if view.channel == ChannelStatus::Dropped {
        println!("{}", "(live updates stopped; /open the category again)".red());
    }

    if view.messages.is_empty() {
        println!("{}", "No messages yet.".bright_black());
    }
    for message in &view.messages {
        let marker = if message.edited { " (edited)" } else { "" };
        let header = format!(
            "[{}] {} {}{}",
            message.index + 1,
            message.time,
            message.sender,
            marker
        );
        if message.is_mine {
            println!("{}", header.bright_green());
            println!("  {}", message.text.green());
        } else {
            println!("{}", header.bright_magenta());
            println!("  {}", message.text.bright_blue());
        }
    }

    match &view.composer {
        None => println!(
            "{}",
            "Sign in to chat: pass --user <email> or set user.email in config.toml.".yellow()
        ),
        Some(composer) => {
            if let Some(index) = composer.editing_index {
                println!(
                    "{}",
                    format!(
                        "Editing message {}. Enter the new text to {}, or /cancel.",
                        index + 1,
                        composer.submit_label()
                    )
                    .bright_yellow()
                );
            }
        }
    }
}

pub fn print_notice(notice: &str) {
    println!("{}", format!("! {}", notice).yellow());
}

pub fn print_error(message: impl std::fmt::Display) {
    eprintln!("{}", format!("Error: {}", message).red());
}

pub fn print_help() {
    println!("{}", "Type a message and press Enter to send it.".bright_black());
    for (form, what) in [
        ("/edit N", "edit your message number N"),
        ("/delete N", "delete your message number N"),
        ("/cancel", "stop editing"),
        ("/open <category>", "switch to a category chat"),
        ("/threads", "list category chats"),
        ("/list", "show the current chat again"),
        ("/help", "show this help"),
        ("quit", "leave"),
    ] {
        println!("  {} {}", format!("{:<18}", form).bright_cyan(), what.bright_black());
    }
}
