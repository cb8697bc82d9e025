//! Command parsing for the line protocol
//!
//! One received line becomes one [`Command`]: the line is trimmed and
//! split on whitespace, the first token selects the command
//! (case-sensitive), and the remaining tokens are positional arguments.
//! Anything that is not a recognized command is a broadcast message whose
//! body is the original, untrimmed line.

use crate::types::PROMPT;

/// Help text sent in response to `help`.
pub const HELP_TEXT: &str = "Commands:
  login <username>    - login with username
  create <room>       - create a room
  join <room>         - join a room
  leave <room>        - leave a room
  users               - list all users
  rooms               - list all rooms
  connect <user>      - connect to user (DM)
  disconnect <user>   - disconnect from user (DM)
  exit / logout       - exit chat
  help                - show this help
";

/// A parsed client command
///
/// Extra positional arguments beyond the expected arity are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rename the current user (no uniqueness check)
    Login(String),
    /// Create a room (idempotent)
    Create(String),
    /// Join a room, creating it if absent
    Join(String),
    /// Leave a room, then collect empty rooms
    Leave(String),
    /// Direct-connect to a user by name
    Connect(String),
    /// Drop the direct connection to a user by name
    Disconnect(String),
    /// List all room names
    Rooms,
    /// List all user display names
    Users,
    /// Static help text
    Help,
    /// `exit` or `logout`: tear the session down
    Quit,
    /// Unrecognized input: broadcast the original line
    Broadcast(String),
    /// Blank line: re-prompt, no side effects
    Empty,
}

/// Missing required argument; carries the usage hint for the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage(pub &'static str);

impl Command {
    /// Parse one received line (newline already stripped)
    pub fn parse(line: &str) -> Result<Self, Usage> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Ok(Command::Empty);
        };

        let mut arg = |hint| tokens.next().map(str::to_string).ok_or(Usage(hint));

        match head {
            "login" => Ok(Command::Login(arg("login <username>")?)),
            "create" => Ok(Command::Create(arg("create <room>")?)),
            "join" => Ok(Command::Join(arg("join <room>")?)),
            "leave" => Ok(Command::Leave(arg("leave <room>")?)),
            "connect" => Ok(Command::Connect(arg("connect <user>")?)),
            "disconnect" => Ok(Command::Disconnect(arg("disconnect <user>")?)),
            "rooms" => Ok(Command::Rooms),
            "users" => Ok(Command::Users),
            "help" => Ok(Command::Help),
            "exit" | "logout" => Ok(Command::Quit),
            _ => Ok(Command::Broadcast(line.to_string())),
        }
    }
}

/// Terminate a reply with the prompt marker
pub fn with_prompt(msg: &str) -> String {
    format!("{msg}\n{PROMPT}")
}

/// Format a `Users:`/`Rooms:` listing, prompt included
pub fn listing(header: &str, names: &[String]) -> String {
    let mut out = String::from(header);
    out.push('\n');
    for name in names {
        out.push_str("  ");
        out.push_str(name);
        out.push('\n');
    }
    out.push_str(PROMPT);
    out
}
