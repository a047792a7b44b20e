//! Timed command lists for `sendcmd` / `asendcmd`.
//!
//! Rendered form, intervals joined by `;`:
//! `<start>[-<end>] [<flags>] <target> <command> <arg>, ...`

use crate::args::Arg;
use crate::catalog::{Helper, helper_filter};
use crate::error::GraphError;
use crate::graph::{MediaType, OpId, Operation, Session};
use crate::Result;
use std::fmt;

/// What a command is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Filter name, optionally `name@id`.
    Name(String),
    /// An operation placed in the session; rendered as `name[@id]`.
    Operation(OpId),
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::Name(s.to_string())
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Target::Name(s)
    }
}

impl From<OpId> for Target {
    fn from(op: OpId) -> Self {
        Target::Operation(op)
    }
}

#[derive(Debug, Clone)]
struct Command {
    flags: Vec<String>,
    target: Target,
    command: String,
    arg: String,
}

#[derive(Debug, Clone)]
struct Interval {
    start: String,
    end: Option<String>,
    commands: Vec<Command>,
}

#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    intervals: Vec<Interval>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an interval starting at `start`; following commands go into it.
    pub fn at(&mut self, start: impl fmt::Display) -> &mut Self {
        self.intervals.push(Interval {
            start: start.to_string(),
            end: None,
            commands: Vec::new(),
        });
        self
    }

    /// Open an interval covering `start` to `end`.
    pub fn between(&mut self, start: impl fmt::Display, end: impl fmt::Display) -> &mut Self {
        self.intervals.push(Interval {
            start: start.to_string(),
            end: Some(end.to_string()),
            commands: Vec::new(),
        });
        self
    }

    pub fn command(
        &mut self,
        target: impl Into<Target>,
        command: &str,
        arg: impl fmt::Display,
    ) -> Result<&mut Self> {
        self.command_with_flags(&[], target, command, arg)
    }

    /// Add a command with flags such as `enter` or `leave`.
    pub fn command_with_flags(
        &mut self,
        flags: &[&str],
        target: impl Into<Target>,
        command: &str,
        arg: impl fmt::Display,
    ) -> Result<&mut Self> {
        let interval = self.intervals.last_mut().ok_or_else(|| {
            GraphError::Structural(format!(
                "command {} has no interval; call at() or between() first",
                command
            ))
        })?;
        interval.commands.push(Command {
            flags: flags.iter().map(|f| f.to_string()).collect(),
            target: target.into(),
            command: command.to_string(),
            arg: arg.to_string(),
        });
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Render the command list; operation targets are looked up in `session`.
    pub fn render(&self, session: &Session) -> Result<String> {
        let mut intervals = Vec::with_capacity(self.intervals.len());
        for interval in &self.intervals {
            let mut commands = Vec::with_capacity(interval.commands.len());
            for cmd in &interval.commands {
                let target = match &cmd.target {
                    Target::Name(name) => name.clone(),
                    Target::Operation(op) => session.operation(*op)?.target(),
                };
                let mut parts = Vec::with_capacity(4);
                if !cmd.flags.is_empty() {
                    parts.push(format!("[{}]", cmd.flags.join("+")));
                }
                parts.push(target);
                parts.push(cmd.command.clone());
                if !cmd.arg.is_empty() {
                    parts.push(cmd.arg.clone());
                }
                commands.push(parts.join(" "));
            }
            let time = match &interval.end {
                Some(end) => format!("{}-{}", interval.start, end),
                None => interval.start.clone(),
            };
            intervals.push(format!("{} {}", time, commands.join(", ")));
        }
        Ok(intervals.join(";"))
    }

    /// The `sendcmd`/`asendcmd` operation carrying this command list.
    pub fn to_operation(&self, session: &Session, media: MediaType) -> Result<Operation> {
        let name = helper_filter(Helper::Commands, media, "command list")?;
        let rendered = self.render(session)?;
        Ok(Operation::new(name)
            .with_args(&[Arg::Scalar(rendered)])
            .with_outputs(crate::catalog::Pads::Fixed(vec![media])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_intervals_and_flags() {
        let s = Session::new();
        let mut cmds = CommandBuilder::new();
        cmds.between(1, 2.5)
            .command_with_flags(&["enter"], "drawtext@title", "reinit", "text=hi")
            .unwrap()
            .command("volume", "volume", 0.5)
            .unwrap();
        cmds.at(4).command("hue", "s", 0).unwrap();
        assert_eq!(
            cmds.render(&s).unwrap(),
            "1-2.5 [enter] drawtext@title reinit text=hi, volume volume 0.5;4 hue s 0"
        );
    }

    #[test]
    fn command_without_interval_fails() {
        let mut cmds = CommandBuilder::new();
        assert!(cmds.command("hue", "s", 0).is_err());
    }

    #[test]
    fn operation_targets_use_instance_id() {
        let mut s = Session::new();
        let input = s.input_stream("0:v").unwrap();
        let chain = s.start(&[input]).unwrap();
        let chain = s
            .extend(chain, Operation::new("drawtext").with_id("t"))
            .unwrap();
        let op = s.chain_operation(chain).unwrap().unwrap();

        let mut cmds = CommandBuilder::new();
        cmds.at(0).command(op, "reinit", "text=x").unwrap();
        let sendcmd = cmds.to_operation(&s, MediaType::Video).unwrap();
        assert_eq!(sendcmd.to_string(), "sendcmd='0 drawtext@t reinit text=x'");
    }
}
