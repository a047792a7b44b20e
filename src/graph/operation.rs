use crate::args::{Arg, encode_args, quote_args};
use crate::catalog::Pads;
use std::fmt;

/// Handle to an operation stored in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId {
    pub(crate) session: u32,
    pub(crate) index: usize,
}

/// One processing step: `name[@id][=args]`.
///
/// `args` holds the already encoded (unquoted) argument string; quoting
/// happens at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    name: String,
    id: Option<String>,
    args: String,
    outputs: Pads,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            args: String::new(),
            outputs: Pads::Dynamic,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_args(mut self, args: &[Arg]) -> Self {
        self.args = encode_args(args);
        self
    }

    /// Declared output pads; fixed pads bound iteration and tag outputs.
    pub fn with_outputs(mut self, outputs: Pads) -> Self {
        self.outputs = outputs;
        self
    }

    pub(crate) fn set_args(&mut self, args: &[Arg]) {
        self.args = encode_args(args);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn outputs(&self) -> &Pads {
        &self.outputs
    }

    /// `name` or `name@id`; the form command targets use.
    pub fn target(&self) -> String {
        match &self.id {
            Some(id) => format!("{}@{}", self.name, id),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target())?;
        if !self.args.is_empty() {
            write!(f, "={}", quote_args(&self.args))?;
        }
        Ok(())
    }
}
