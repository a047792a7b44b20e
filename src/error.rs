//! Error type shared by the graph engine, the catalog and the script loader.
//!
//! Every failure aborts the compilation in progress; there is no recoverable
//! subset. Messages name the offending pipe as `[label]` so the construction
//! call responsible can be located.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Double-binding a pipe side, connecting an already-connected chain, or
    /// handing a pipe to a session that did not create it.
    #[error("binding error: {0}")]
    Binding(String),

    /// Extending/forking a chain that already has a successor, connecting an
    /// empty chain, or creating a cycle with `link`.
    #[error("structural error: {0}")]
    Structural(String),

    /// Renaming a fixed pipe, duplicate final names, conflicting media types.
    #[error("naming error: {0}")]
    Naming(String),

    #[error(
        "unbounded iteration: {0} was asked for more than {limit} outputs; \
         request an explicit count instead of unpacking everything",
        limit = crate::graph::UNBOUNDED_LIMIT
    )]
    UnboundedIteration(String),

    /// No fan-out/pass-through/sink operation exists for a media type.
    #[error("missing mapping: {0}")]
    MissingMapping(String),

    #[error("operation {name} has {count} output pad(s); output {index} does not exist")]
    Arity {
        name: String,
        count: usize,
        index: usize,
    },

    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("graph already completed; {0} is not allowed anymore")]
    Completed(&'static str),

    #[error("script error: {0}")]
    Script(String),
}

/// Format a pipe reference for messages: `[name]` plus the hint, if any.
pub(crate) fn describe(name: &str, hint: Option<&str>) -> String {
    match hint {
        Some(h) => format!("[{}] ({})", name, h),
        None => format!("[{}]", name),
    }
}
