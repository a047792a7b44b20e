//! Operations the engine inserts on its own, per media type.

use crate::error::GraphError;
use crate::graph::MediaType;
use crate::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    /// Duplicate one pipe into N.
    Split,
    /// Identity, used to re-label a pipe whose name is fixed.
    PassThrough,
    /// Swallow a pipe nobody reads.
    Sink,
    /// Timed command list.
    Commands,
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Helper::Split => "fan-out",
            Helper::PassThrough => "pass-through",
            Helper::Sink => "sink",
            Helper::Commands => "command",
        };
        f.write_str(s)
    }
}

/// Filter name implementing `helper` for `media`.
///
/// `subject` names the pipe or builder that needed it, for the message.
pub fn helper_filter(helper: Helper, media: MediaType, subject: &str) -> Result<&'static str> {
    let name = match (helper, media) {
        (_, MediaType::Unknown) => {
            return Err(GraphError::MissingMapping(format!(
                "no {} operation for {}: its media type is unknown; \
                 annotate it with an explicit media type (video or audio)",
                helper, subject
            )));
        }
        (Helper::Split, MediaType::Video) => "split",
        (Helper::Split, MediaType::Audio) => "asplit",
        (Helper::PassThrough, MediaType::Video) => "null",
        (Helper::PassThrough, MediaType::Audio) => "anull",
        (Helper::Sink, MediaType::Video) => "nullsink",
        (Helper::Sink, MediaType::Audio) => "anullsink",
        (Helper::Commands, MediaType::Video) => "sendcmd",
        (Helper::Commands, MediaType::Audio) => "asendcmd",
        (helper, media) => {
            return Err(GraphError::MissingMapping(format!(
                "no {} equivalent exists for {} pipes ({})",
                helper, media, subject
            )));
        }
    };
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_media_specific_names() {
        assert_eq!(helper_filter(Helper::Split, MediaType::Audio, "[a]").unwrap(), "asplit");
        assert_eq!(helper_filter(Helper::Sink, MediaType::Video, "[a]").unwrap(), "nullsink");
    }

    #[test]
    fn unknown_media_asks_for_annotation() {
        let err = helper_filter(Helper::Split, MediaType::Unknown, "[_0]").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("[_0]") && msg.contains("annotate"));
    }

    #[test]
    fn unsupported_media_has_no_equivalent() {
        let err = helper_filter(Helper::PassThrough, MediaType::Subtitle, "[s]").unwrap_err();
        assert!(err.to_string().contains("no pass-through equivalent exists"));
    }
}
