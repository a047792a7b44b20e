//! Graph scripts (graph.json): a declarative way to drive a session.
//!
//! JSON shape:
//! {
//!   "inputs": { "v": "0:v", "music": { "stream": "1:a", "media": "audio" } },
//!   "steps": [
//!     { "from": ["v"],
//!       "filters": [ { "name": "crop", "args": [{ "w": 640, "h": 360 }] },
//!                    { "name": "drawtext", "id": "title", "args": [{ "text": "hi" }] } ],
//!       "to": ["small"] },
//!     { "from": ["small"],
//!       "filters": [ { "media": "video", "commands": [
//!           { "start": 2, "commands": [ { "target": "drawtext@title", "command": "reinit", "arg": "text=bye" } ] }
//!       ] } ],
//!       "to": ["timed"] },
//!     { "concat": [["timed", "music"]], "to": ["cv", "ca"] }
//!   ],
//!   "exports": [["videoOutput", "cv"], ["audioOutput", "ca"]]
//! }
//!
//! Aliases name pipes inside the script only; exported names are what ends
//! up in the graph. Reading an alias twice fans it out automatically.

pub mod value;

use crate::builders::{CommandBuilder, ConcatBuilder};
use crate::compile::Exports;
use crate::error::GraphError;
use crate::graph::{LinkId, MediaType, Operation, Session};
use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct GraphScript {
    #[serde(default)]
    pub inputs: BTreeMap<String, InputSpec>,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
    /// `[exported name, alias]` pairs.
    #[serde(default)]
    pub exports: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    Stream(String),
    Explicit {
        stream: String,
        #[serde(default)]
        media: Option<MediaType>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StepSpec {
    /// Rows are segments, columns are streams.
    Concat {
        concat: Vec<Vec<String>>,
        #[serde(default)]
        to: Vec<String>,
    },
    Chain {
        #[serde(default)]
        from: Vec<String>,
        filters: Vec<FilterStep>,
        #[serde(default)]
        to: Vec<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterStep {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub args: Vec<Json>,
    /// A command list; turns the step into sendcmd/asendcmd.
    #[serde(default)]
    pub commands: Vec<IntervalSpec>,
    #[serde(default)]
    pub media: Option<MediaType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntervalSpec {
    pub start: Json,
    #[serde(default)]
    pub end: Option<Json>,
    pub commands: Vec<CommandSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    #[serde(default)]
    pub flags: Vec<String>,
    pub target: String,
    pub command: String,
    #[serde(default)]
    pub arg: Option<Json>,
}

impl GraphScript {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("parse graph script json")
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read graph script {}", path))?;
        Self::from_json(&text).with_context(|| format!("load graph script {}", path))
    }

    /// Run every step against `session`; returns the exports to complete with.
    pub fn build(&self, session: &mut Session) -> Result<Exports> {
        let mut aliases = Aliases::default();

        for (alias, input) in &self.inputs {
            let (stream, media) = match input {
                InputSpec::Stream(s) => (s, None),
                InputSpec::Explicit { stream, media } => (stream, *media),
            };
            let link = session.input_stream(stream.as_str())?;
            if let Some(media) = media {
                session.set_media_type(link, media)?;
            }
            aliases.bind(alias, link)?;
        }

        for (i, step) in self.steps.iter().enumerate() {
            match step {
                StepSpec::Chain { from, filters, to } => {
                    let inputs = aliases.resolve_all(from)?;
                    let outputs = build_chain(session, &inputs, filters)
                        .and_then(|chain| session.take_outputs(chain, to.len()))
                        .map_err(|e| step_error(i, e))?;
                    aliases.bind_all(to, &outputs)?;
                }
                StepSpec::Concat { concat, to } => {
                    let mut builder = ConcatBuilder::new();
                    for segment in concat {
                        builder.add_segment(&aliases.resolve_all(segment)?)?;
                    }
                    let outputs = builder.finalize(session).map_err(|e| step_error(i, e))?;
                    if to.len() > outputs.len() {
                        return Err(GraphError::Script(format!(
                            "step {}: concat has {} outputs but {} aliases were given",
                            i,
                            outputs.len(),
                            to.len()
                        )));
                    }
                    aliases.bind_all(to, &outputs[..to.len()])?;
                }
            }
        }

        self.exports
            .iter()
            .map(|[name, alias]| Ok((name.clone(), aliases.resolve(alias)?)))
            .collect()
    }
}

fn step_error(i: usize, e: GraphError) -> GraphError {
    match e {
        GraphError::Script(msg) => GraphError::Script(format!("step {}: {}", i, msg)),
        other => other,
    }
}

fn build_chain(
    session: &mut Session,
    inputs: &[LinkId],
    filters: &[FilterStep],
) -> Result<crate::graph::ChainId> {
    let Some((first, rest)) = filters.split_first() else {
        return Err(GraphError::Script("chain step has no filters".to_string()));
    };

    let mut chain = match (&first.name, session.catalog().entry(name_of(first))) {
        (Some(name), Some(_)) => {
            if first.id.is_some() {
                return Err(GraphError::Script(format!(
                    "{} is an entry point and cannot carry an id",
                    name
                )));
            }
            let args = value::to_args(&first.args)?;
            session.invoke(name, inputs, &args)?
        }
        _ => {
            let op = filter_op(session, first)?;
            session.place(inputs, op)?
        }
    };
    for step in rest {
        let op = filter_op(session, step)?;
        chain = session.extend(chain, op)?;
    }
    Ok(chain)
}

fn name_of(step: &FilterStep) -> &str {
    step.name.as_deref().unwrap_or_default()
}

fn filter_op(session: &Session, step: &FilterStep) -> Result<Operation> {
    let op = match (&step.name, step.commands.is_empty()) {
        (Some(_), false) => {
            return Err(GraphError::Script(
                "a filter has either a name or commands, not both".to_string(),
            ));
        }
        (None, true) => {
            return Err(GraphError::Script(
                "a filter needs a name or commands".to_string(),
            ));
        }
        (None, false) => commands_op(session, step)?,
        (Some(name), true) => {
            let op = match session.filter(name) {
                Ok(op) => op,
                Err(GraphError::UnknownFilter(_)) => {
                    warn!(filter = %name, "filter not in catalog; output pads are unknown");
                    Operation::new(name.as_str())
                }
                Err(e) => return Err(e),
            };
            op.with_args(&value::to_args(&step.args)?)
        }
    };
    Ok(match &step.id {
        Some(id) => op.with_id(id.as_str()),
        None => op,
    })
}

fn commands_op(session: &Session, step: &FilterStep) -> Result<Operation> {
    let media = step.media.unwrap_or_default();
    let mut builder = CommandBuilder::new();
    for interval in &step.commands {
        let start = value::scalar(&interval.start)?;
        match &interval.end {
            Some(end) => builder.between(start, value::scalar(end)?),
            None => builder.at(start),
        };
        for cmd in &interval.commands {
            let flags: Vec<&str> = cmd.flags.iter().map(String::as_str).collect();
            let arg = match &cmd.arg {
                Some(v) => value::scalar(v)?,
                None => String::new(),
            };
            builder.command_with_flags(&flags, cmd.target.as_str(), &cmd.command, arg)?;
        }
    }
    builder.to_operation(session, media)
}

#[derive(Default)]
struct Aliases {
    map: HashMap<String, LinkId>,
}

impl Aliases {
    fn bind(&mut self, alias: &str, link: LinkId) -> Result<()> {
        if self.map.insert(alias.to_string(), link).is_some() {
            return Err(GraphError::Script(format!("alias {} is defined twice", alias)));
        }
        Ok(())
    }

    fn bind_all(&mut self, aliases: &[String], links: &[LinkId]) -> Result<()> {
        for (alias, &link) in aliases.iter().zip(links) {
            self.bind(alias, link)?;
        }
        Ok(())
    }

    fn resolve(&self, alias: &str) -> Result<LinkId> {
        self.map
            .get(alias)
            .copied()
            .ok_or_else(|| GraphError::Script(format!("unknown alias {}", alias)))
    }

    fn resolve_all(&self, aliases: &[String]) -> Result<Vec<LinkId>> {
        aliases.iter().map(|a| self.resolve(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use pretty_assertions::assert_eq;

    fn run(json: &str) -> Result<String> {
        let script = GraphScript::from_json(json).unwrap();
        let mut session = Session::with_catalog(Catalog::builtin());
        let exports = script.build(&mut session)?;
        session.complete(exports)?;
        Ok(session.render())
    }

    #[test]
    fn chain_step_with_exports() {
        let out = run(r#"{
            "inputs": { "v": "0:v" },
            "steps": [ { "from": ["v"], "filters": [
                { "name": "crop", "args": [{ "w": 640, "h": 360 }] },
                { "name": "hflip" } ], "to": ["out"] } ],
            "exports": [["videoOutput", "out"]]
        }"#)
        .unwrap();
        assert_eq!(out, "[0:v]crop='w=640:h=360',hflip[videoOutput]");
    }

    #[test]
    fn keyed_args_keep_written_order() {
        let out = run(r#"{
            "inputs": { "v": "0:v" },
            "steps": [ { "from": ["v"], "filters": [
                { "name": "drawtext", "args": [{ "text": "a", "fontsize": 12, "x": 1 }] } ],
                "to": ["out"] } ],
            "exports": [["o", "out"]]
        }"#)
        .unwrap();
        assert_eq!(out, "[0:v]drawtext='text=a:fontsize=12:x=1'[o]");
    }

    #[test]
    fn entry_point_with_id_is_reported() {
        let err = run(r#"{
            "inputs": { "v": "0:v" },
            "steps": [ { "from": ["v"], "filters": [ { "name": "split", "id": "s", "args": [2] } ],
                "to": ["a", "b"] } ],
            "exports": [["left", "a"], ["right", "b"]]
        }"#)
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::Script("step 0: split is an entry point and cannot carry an id".to_string())
        );
    }

    #[test]
    fn empty_concat_segment_is_an_error() {
        let err = run(r#"{
            "inputs": { "v": "0:v", "a": "0:a" },
            "steps": [ { "concat": [[], ["v", "a"]], "to": ["cv", "ca"] } ],
            "exports": [["videoOutput", "cv"], ["audioOutput", "ca"]]
        }"#)
        .unwrap_err();
        assert!(matches!(err, GraphError::Structural(_)));
    }

    #[test]
    fn split_entry_point_is_used() {
        let out = run(r#"{
            "inputs": { "v": "0:v" },
            "steps": [ { "from": ["v"], "filters": [ { "name": "split", "args": [2] } ], "to": ["a", "b"] } ],
            "exports": [["left", "a"], ["right", "b"]]
        }"#)
        .unwrap();
        assert_eq!(out, "[0:v]split='2'[left][right]");
    }

    #[test]
    fn command_step_renders_sendcmd() {
        let out = run(r#"{
            "inputs": { "v": "0:v" },
            "steps": [ { "from": ["v"], "filters": [
                { "name": "drawtext", "id": "t", "args": [{ "text": "hi" }] },
                { "media": "video", "commands": [
                    { "start": 1, "end": 2, "commands": [
                        { "flags": ["enter"], "target": "drawtext@t", "command": "reinit", "arg": "text=bye" } ] } ] }
            ], "to": ["out"] } ],
            "exports": [["o", "out"]]
        }"#)
        .unwrap();
        assert_eq!(
            out,
            "[0:v]drawtext@t='text=hi',sendcmd='1-2 [enter] drawtext@t reinit text=bye'[o]"
        );
    }

    #[test]
    fn unknown_alias_is_reported() {
        let err = run(r#"{ "steps": [ { "from": ["nope"], "filters": [ { "name": "hflip" } ] } ] }"#)
            .unwrap_err();
        assert_eq!(err, GraphError::Script("unknown alias nope".to_string()));
    }

    #[test]
    fn duplicate_alias_is_reported() {
        let err = run(r#"{
            "inputs": { "v": "0:v" },
            "steps": [ { "from": ["v"], "filters": [ { "name": "split" } ], "to": ["v"] } ]
        }"#)
        .unwrap_err();
        assert!(matches!(err, GraphError::Script(_)));
    }
}
