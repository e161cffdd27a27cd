//! Errors surfaced by the engine and the simulation.
//!
//! Content problems stay [`ConfigError`]s; this type adds the failures that
//! only exist once templates meet a concrete world.

use brain_core::{AgentId, ConfigError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("template `{name}` is not loaded")]
    UnknownTemplate { name: String },

    #[error("template `{name}` was disabled at load time")]
    DisabledTemplate { name: String },

    #[error("agent {id} already exists")]
    DuplicateAgent { id: AgentId },

    #[error("agent {id} does not exist")]
    UnknownAgent { id: AgentId },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
