//! Chat command grammar: `<trigger> show <ISSUE-KEY>`.

/// Trigger used when none is configured.
pub const DEFAULT_TRIGGER: &str = "!jira";

/// A recognized bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look up an issue and relay its summary.
    Show { issue_key: String },
}

impl Command {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Show { .. } => "show",
        }
    }
}

/// Maps raw message bodies to commands.
#[derive(Debug, Clone)]
pub struct CommandParser {
    trigger: String,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER)
    }
}

impl CommandParser {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
        }
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Parse a message body. Returns `None` for anything that is not a
    /// well-formed command, including a bare trigger or a trigger followed
    /// by an unknown verb. Tokens after the issue key are ignored.
    pub fn parse(&self, body: &str) -> Option<Command> {
        let mut tokens = body
            .split_whitespace()
            .skip_while(|token| *token != self.trigger);
        tokens.next()?;
        let verb = tokens.next()?;
        let argument = tokens.next()?;
        match verb {
            "show" => Some(Command::Show {
                issue_key: argument.to_string(),
            }),
            _ => None,
        }
    }
}
