//! Line input parsing for the `branch-chat` REPL.

pub const HELP_TEXT: &str = "\
Commands:
  /help                                   show this help
  /new                                    start a new session
  /sessions                               list sessions
  /switch <n>                             activate session n (see /sessions)
  /delete <n>                             delete session n
  /tree                                   show the active session's tree
  /focus <slug>                           jump to a node (see /tree)
  /current <slug>                         send prompts to a node on the active branch
  /branch <msg#> <start> <end> <prompt>   fork chars [start, end) of message msg# of the current node
  /header <text>                          rename the current node
  /history                                show the model context for the active branch
  /quit                                   save and exit
Any other line is sent as a prompt to the current node.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    New,
    Sessions,
    Switch(usize),
    Delete(usize),
    Tree,
    Focus(String),
    Current(String),
    Branch {
        message: usize,
        start: usize,
        end: usize,
        prompt: String,
    },
    Header(String),
    History,
    Quit,
    Prompt(String),
    Usage(&'static str),
    Unknown(String),
}

/// Parses one input line; blank lines yield `None`.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.starts_with('/') {
        return Some(Command::Prompt(trimmed.to_string()));
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/help" => Command::Help,
        "/new" => Command::New,
        "/sessions" => Command::Sessions,
        "/switch" => index_arg(rest).map_or(Command::Usage("/switch <n>"), Command::Switch),
        "/delete" => index_arg(rest).map_or(Command::Usage("/delete <n>"), Command::Delete),
        "/tree" => Command::Tree,
        "/focus" if !rest.is_empty() => Command::Focus(rest.to_string()),
        "/focus" => Command::Usage("/focus <slug>"),
        "/current" if !rest.is_empty() => Command::Current(rest.to_string()),
        "/current" => Command::Usage("/current <slug>"),
        "/branch" => parse_branch(rest)
            .unwrap_or(Command::Usage("/branch <msg#> <start> <end> <prompt>")),
        "/header" if !rest.is_empty() => Command::Header(rest.to_string()),
        "/header" => Command::Usage("/header <text>"),
        "/history" => Command::History,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(command.to_string()),
    };

    Some(parsed)
}

fn index_arg(rest: &str) -> Option<usize> {
    rest.parse::<usize>().ok().filter(|index| *index > 0)
}

fn parse_branch(rest: &str) -> Option<Command> {
    let mut parts = rest.splitn(4, char::is_whitespace);
    let message = index_arg(parts.next()?)?;
    let start = parts.next()?.parse().ok()?;
    let end = parts.next()?.parse().ok()?;
    let prompt = parts.next()?.trim();
    if prompt.is_empty() {
        return None;
    }

    Some(Command::Branch {
        message,
        start,
        end,
        prompt: prompt.to_string(),
    })
}
