//! Parsing of inbound chat text.

/// Slash commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Jobs,
    Exit,
}

impl BotCommand {
    /// All commands, in menu order.
    pub const ALL: [BotCommand; 4] = [Self::Start, Self::Help, Self::Jobs, Self::Exit];

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Jobs => "jobs",
            Self::Exit => "exit",
        }
    }

    /// Menu description shown by chat clients.
    pub fn description(self) -> &'static str {
        match self {
            Self::Start => "Start the bot",
            Self::Help => "Show help information",
            Self::Jobs => "Search for jobs",
            Self::Exit => "Stop interacting with the bot",
        }
    }

    /// `(name, description)` pairs for the command menu.
    pub fn menu() -> Vec<(&'static str, &'static str)> {
        Self::ALL
            .iter()
            .map(|command| (command.name(), command.description()))
            .collect()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

/// What a text message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(BotCommand),
    /// A `/word` that is not one of ours.
    UnknownCommand(String),
    /// Anything else is a search query.
    Query(String),
}

/// Parses message text into [`Input`].
pub struct InputParser;

impl InputParser {
    /// Commands are matched case-insensitively, with or without the
    /// `@botname` suffix group chats add. Arguments after a command are
    /// ignored.
    pub fn parse(text: &str) -> Input {
        let trimmed = text.trim();

        let Some(rest) = trimmed.strip_prefix('/') else {
            return Input::Query(trimmed.to_string());
        };

        let word = rest.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default().to_lowercase();

        match BotCommand::from_name(&name) {
            Some(command) => Input::Command(command),
            None => Input::UnknownCommand(name),
        }
    }
}
