//! # Commands
//!
//! Commands are the only way the document state is modified. They are plain descriptions of an intent,
//! sent to the [store](crate::store::CanvasStore) which hands them to the reducer ([`CommandConsumer`]) -
//! the single place where they're validated.

pub use state::canvas::commands::Command as CanvasCommand;
pub use state::params::commands::Command as GenerationCommand;
pub use state::session::commands::Command as SessionCommand;

use crate::state;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("entity referenced by the command is not found")]
    UnknownEntity,
    #[error("an entity with this ID already exists")]
    DuplicateEntity,
    #[error("invalid {0}")]
    InvalidValue(&'static str),
    #[error("command makes no changes")]
    NoOp,
}
pub trait CommandConsumer<C> {
    /// Apply a single command. If this generates an error,
    /// the state of `self` should *not* be observably changed.
    fn apply(&mut self, command: &C) -> Result<(), CommandError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Canvas(CanvasCommand),
    Generation(GenerationCommand),
    Session(SessionCommand),
}
impl From<CanvasCommand> for Command {
    fn from(value: CanvasCommand) -> Self {
        Self::Canvas(value)
    }
}
impl From<GenerationCommand> for Command {
    fn from(value: GenerationCommand) -> Self {
        Self::Generation(value)
    }
}
impl From<SessionCommand> for Command {
    fn from(value: SessionCommand) -> Self {
        Self::Session(value)
    }
}
