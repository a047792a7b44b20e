//! Pipes between operations.
//!
//! Naming note: binding sides are seen from the operations. `bind_input`
//! marks the pipe as fed by some operation's output pad; `bind_output`
//! marks it as read by some operation's input pad.

use crate::error::{GraphError, describe};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a pipe owned by one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId {
    pub(crate) session: u32,
    pub(crate) index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Unknown,
    Video,
    Audio,
    Data,
    Subtitle,
    Attachment,
    Nb,
}

impl MediaType {
    /// Guess the media type from a stream specifier such as `0:v` or `1:a:0`.
    pub fn from_stream_specifier(spec: &str) -> Self {
        for part in spec.split(':') {
            match part {
                "v" | "V" => return MediaType::Video,
                "a" => return MediaType::Audio,
                "s" => return MediaType::Subtitle,
                "d" => return MediaType::Data,
                "t" => return MediaType::Attachment,
                _ => {}
            }
        }
        MediaType::Unknown
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaType::Unknown => "unknown",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Data => "data",
            MediaType::Subtitle => "subtitle",
            MediaType::Attachment => "attachment",
            MediaType::Nb => "nb",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) name: String,
    pub(crate) fixed: bool,
    pub(crate) media: MediaType,
    pub(crate) bound_input: bool,
    pub(crate) bound_output: bool,
    /// Input-stream references may be read by any number of consumers.
    pub(crate) shared: bool,
    pub(crate) hint: Option<String>,
}

impl Link {
    pub(crate) fn anonymous(name: String) -> Self {
        Self {
            name,
            fixed: false,
            media: MediaType::Unknown,
            bound_input: false,
            bound_output: false,
            shared: false,
            hint: None,
        }
    }

    pub(crate) fn named(name: String) -> Self {
        Self {
            fixed: true,
            ..Self::anonymous(name)
        }
    }

    pub(crate) fn stream(spec: String) -> Self {
        Self {
            media: MediaType::from_stream_specifier(&spec),
            bound_input: true,
            shared: true,
            ..Self::named(spec)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn media_type(&self) -> MediaType {
        self.media
    }

    pub fn is_bound_input(&self) -> bool {
        self.bound_input
    }

    pub fn is_bound_output(&self) -> bool {
        self.bound_output
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// `[name]` plus hint, for error messages.
    pub fn describe(&self) -> String {
        describe(&self.name, self.hint.as_deref())
    }

    /// Label as it appears in the compiled graph.
    pub fn label(&self) -> String {
        format!("[{}]", self.name)
    }

    pub(crate) fn bind_input(&mut self) -> Result<()> {
        if self.bound_input {
            return Err(GraphError::Binding(format!(
                "pipe {} is already fed by an operation output",
                self.describe()
            )));
        }
        self.bound_input = true;
        Ok(())
    }

    pub(crate) fn bind_output(&mut self) -> Result<()> {
        if self.shared {
            return Ok(());
        }
        if self.bound_output {
            return Err(GraphError::Binding(format!(
                "pipe {} is already read by an operation input",
                self.describe()
            )));
        }
        self.bound_output = true;
        Ok(())
    }

    pub(crate) fn mark_media_type(&mut self, media: MediaType) -> Result<()> {
        if self.media == media || media == MediaType::Unknown {
            return Ok(());
        }
        if self.media != MediaType::Unknown {
            return Err(GraphError::Naming(format!(
                "pipe {} is {} and cannot become {}",
                self.describe(),
                self.media,
                media
            )));
        }
        self.media = media;
        Ok(())
    }

    pub(crate) fn rename(&mut self, name: &str) -> Result<()> {
        if self.fixed {
            return Err(GraphError::Naming(format!(
                "pipe {} already has a fixed name; cannot rename it to [{}]",
                self.describe(),
                name
            )));
        }
        self.name = name.to_string();
        self.fixed = true;
        Ok(())
    }
}
