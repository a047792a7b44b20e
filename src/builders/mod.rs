//! Sub-builders layered on the session.

pub mod command;
pub mod concat;

pub use command::{CommandBuilder, Target};
pub use concat::ConcatBuilder;
