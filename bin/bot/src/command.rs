//! Administrative commands.

use crate::error::CommandError;
use crate::transport::InboundEvent;
use parley_core::ConversationId;
use rootcause::Report;

/// Name of the reset command.
pub const RESET_COMMAND: &str = "resetChat";

/// `resetChat [--user <target>]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetCommand {
    /// User whose direct conversation to reset; defaults to the caller's
    /// own conversation.
    pub target: Option<String>,
}

impl ResetCommand {
    /// Returns true if `text` invokes the reset command.
    #[must_use]
    pub fn matches(text: &str) -> bool {
        text.split_whitespace().next() == Some(RESET_COMMAND)
    }

    /// Parses a full command line.
    ///
    /// # Errors
    ///
    /// Returns an error for a different command, a dangling flag, or an
    /// argument the command does not take.
    pub fn parse(text: &str) -> Result<Self, Report<CommandError>> {
        let mut words = text.split_whitespace();
        match words.next() {
            Some(RESET_COMMAND) => {}
            other => {
                return Err(CommandError::UnknownCommand {
                    name: other.unwrap_or_default().to_string(),
                }
                .into());
            }
        }

        let mut command = Self::default();
        while let Some(word) = words.next() {
            let value = match word {
                "--user" | "-u" => words.next().ok_or_else(|| CommandError::MissingValue {
                    flag: word.to_string(),
                })?,
                _ => match word.strip_prefix("--user=") {
                    Some(value) if !value.is_empty() => value,
                    Some(_) => {
                        return Err(CommandError::MissingValue {
                            flag: "--user".to_string(),
                        }
                        .into());
                    }
                    None => {
                        return Err(CommandError::UnexpectedArgument {
                            argument: word.to_string(),
                        }
                        .into());
                    }
                },
            };
            if command.target.is_some() {
                return Err(CommandError::UnexpectedArgument {
                    argument: value.to_string(),
                }
                .into());
            }
            command.target = Some(value.to_string());
        }

        Ok(command)
    }

    /// Returns true if the command targets someone other than the caller.
    #[must_use]
    pub fn targets_other(&self, caller: &InboundEvent) -> bool {
        self.target
            .as_deref()
            .is_some_and(|target| target != caller.sender_id)
    }

    /// Resolves the conversation to reset.
    #[must_use]
    pub fn resolve(&self, caller: &InboundEvent) -> ConversationId {
        match &self.target {
            Some(target) => ConversationId::direct(target),
            None => caller.conversation(),
        }
    }
}
