//! REPL input parsing.

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text: send it, or save it when editing.
    Say(String),
    /// Start editing the message at a zero-based position.
    Edit(usize),
    /// Delete the message at a zero-based position.
    Delete(usize),
    Cancel,
    Open(String),
    Threads,
    List,
    Help,
    Quit,
    /// Unknown slash command or bad argument, with a usage hint.
    Invalid(String),
}

/// Slash commands offered for completion.
pub const SLASH_COMMANDS: &[&str] = &[
    "/cancel", "/delete", "/edit", "/help", "/list", "/open", "/threads",
];

/// Parses a line. Returns `None` for blank input.
///
/// Message numbers are one-based, as printed by the list.
pub fn parse(line: &str) -> Option<ReplCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "quit" || trimmed == "exit" {
        return Some(ReplCommand::Quit);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Some(ReplCommand::Say(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    Some(match name {
        "edit" => position(arg).map_or_else(|| usage("/edit N"), ReplCommand::Edit),
        "delete" => position(arg).map_or_else(|| usage("/delete N"), ReplCommand::Delete),
        "cancel" => ReplCommand::Cancel,
        "open" if !arg.is_empty() => ReplCommand::Open(arg.to_string()),
        "open" => usage("/open <category>"),
        "threads" => ReplCommand::Threads,
        "list" => ReplCommand::List,
        "help" => ReplCommand::Help,
        other => ReplCommand::Invalid(format!("Unknown command '/{}'. Type /help.", other)),
    })
}

fn position(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok()?.checked_sub(1)
}

fn usage(form: &str) -> ReplCommand {
    ReplCommand::Invalid(format!("Usage: {}", form))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_kept_verbatim() {
        assert_eq!(
            parse("  hello there "),
            Some(ReplCommand::Say("  hello there ".to_string()))
        );
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn test_positions_are_one_based() {
        assert_eq!(parse("/edit 1"), Some(ReplCommand::Edit(0)));
        assert_eq!(parse("/delete 3"), Some(ReplCommand::Delete(2)));
        assert!(matches!(parse("/edit 0"), Some(ReplCommand::Invalid(_))));
        assert!(matches!(parse("/delete x"), Some(ReplCommand::Invalid(_))));
    }

    #[test]
    fn test_open_requires_category() {
        assert_eq!(
            parse("/open  home appliances "),
            Some(ReplCommand::Open("home appliances".to_string()))
        );
        assert!(matches!(parse("/open"), Some(ReplCommand::Invalid(_))));
    }

    #[test]
    fn test_quit_and_unknown() {
        assert_eq!(parse("exit"), Some(ReplCommand::Quit));
        assert_eq!(parse("quit"), Some(ReplCommand::Quit));
        assert!(matches!(parse("/frobnicate"), Some(ReplCommand::Invalid(_))));
    }
}
