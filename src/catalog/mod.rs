//! Filter catalog: what the engine knows about operation names.
//!
//! JSON shape (catalog.json):
//! {
//!   "filters": [
//!     { "name": "crop", "description": "Crop the input video.",
//!       "inputs": ["video"], "outputs": ["video"],
//!       "flags": { "timeline": true, "command": true } },
//!     { "name": "split", "inputs": ["video"], "outputs": "dynamic" },
//!     { "name": "nullsink", "inputs": ["video"], "outputs": "none" }
//!   ]
//! }
//!
//! Only pad arity and pad media types are consumed; option schemas are not.
//! The catalog also holds the entry-point registry: named functions that
//! build chains through the session and take precedence over plain filters.

mod helpers;
pub mod parse;

pub use helpers::{Helper, helper_filter};
pub use parse::{parse_filters_file, parse_filters_text};

use crate::args::Arg;
use crate::error::GraphError;
use crate::graph::{ChainId, LinkId, MediaType, Session};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pad layout on one side of a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PadsRepr", into = "PadsRepr")]
pub enum Pads {
    /// Source (no inputs) or sink (no outputs).
    None,
    Fixed(Vec<MediaType>),
    /// Count and types depend on the arguments.
    Dynamic,
}

impl Pads {
    /// Fixed pad count, `None` for dynamic pads.
    pub fn count(&self) -> Option<usize> {
        match self {
            Pads::None => Some(0),
            Pads::Fixed(pads) => Some(pads.len()),
            Pads::Dynamic => None,
        }
    }

    /// Media type of pad `i`, unknown when not declared.
    pub fn media(&self, i: usize) -> MediaType {
        match self {
            Pads::Fixed(pads) => pads.get(i).copied().unwrap_or_default(),
            _ => MediaType::Unknown,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PadsRepr {
    Keyword(String),
    Fixed(Vec<MediaType>),
}

impl TryFrom<PadsRepr> for Pads {
    type Error = String;

    fn try_from(repr: PadsRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            PadsRepr::Fixed(pads) => Ok(Pads::Fixed(pads)),
            PadsRepr::Keyword(k) => match k.as_str() {
                "none" => Ok(Pads::None),
                "dynamic" => Ok(Pads::Dynamic),
                other => Err(format!(
                    "pads must be \"none\", \"dynamic\" or a list of media types, got {:?}",
                    other
                )),
            },
        }
    }
}

impl From<Pads> for PadsRepr {
    fn from(pads: Pads) -> Self {
        match pads {
            Pads::None => PadsRepr::Keyword("none".to_string()),
            Pads::Dynamic => PadsRepr::Keyword("dynamic".to_string()),
            Pads::Fixed(pads) => PadsRepr::Fixed(pads),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFlags {
    #[serde(default)]
    pub timeline: bool,
    #[serde(default)]
    pub slice_threads: bool,
    /// Accepts runtime commands (sendcmd targets).
    #[serde(default)]
    pub command: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub inputs: Pads,
    pub outputs: Pads,
    #[serde(default)]
    pub flags: FilterFlags,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>, inputs: Pads, outputs: Pads) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            inputs,
            outputs,
            flags: FilterFlags::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// A named way of building a chain, registered by the catalog owner.
pub type EntryPoint = fn(&mut Session, &[LinkId], &[Arg]) -> Result<ChainId>;

#[derive(Clone, Default)]
pub struct Catalog {
    filters: BTreeMap<String, FilterSpec>,
    entries: BTreeMap<String, EntryPoint>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("filters", &self.filters.len())
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Helper filters the engine inserts itself, plus the `split` and
    /// `discard` entry points.
    pub fn builtin() -> Self {
        use MediaType::{Audio, Video};

        let fixed = |m: MediaType| Pads::Fixed(vec![m]);
        let mut catalog = Self::new();
        for spec in [
            FilterSpec::new("split", fixed(Video), Pads::Dynamic),
            FilterSpec::new("asplit", fixed(Audio), Pads::Dynamic),
            FilterSpec::new("null", fixed(Video), fixed(Video)),
            FilterSpec::new("anull", fixed(Audio), fixed(Audio)),
            FilterSpec::new("nullsink", fixed(Video), Pads::None),
            FilterSpec::new("anullsink", fixed(Audio), Pads::None),
            FilterSpec::new("concat", Pads::Dynamic, Pads::Dynamic),
            FilterSpec::new("sendcmd", fixed(Video), fixed(Video)),
            FilterSpec::new("asendcmd", fixed(Audio), fixed(Audio)),
        ] {
            catalog.insert(spec);
        }
        catalog.register("split", split_entry);
        catalog.register("discard", discard_entry);
        catalog
    }

    /// Builtin helpers plus the filters of a catalog.json file.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let file: CatalogFile = serde_json::from_str(text).context("parse catalog json")?;
        let mut catalog = Self::builtin();
        catalog.extend(file.filters);
        Ok(catalog)
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("read catalog file {}", path))?;
        Self::from_json(&text).with_context(|| format!("load catalog {}", path))
    }

    pub fn insert(&mut self, spec: FilterSpec) {
        self.filters.insert(spec.name.clone(), spec);
    }

    pub fn extend(&mut self, specs: impl IntoIterator<Item = FilterSpec>) {
        for spec in specs {
            self.insert(spec);
        }
    }

    /// Register a named entry point; it shadows a filter of the same name
    /// when invoked through `Session::invoke`.
    pub fn register(&mut self, name: impl Into<String>, entry: EntryPoint) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&FilterSpec> {
        self.filters.get(name)
    }

    pub fn entry(&self, name: &str) -> Option<EntryPoint> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name) || self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            filters: self.filters.values().cloned().collect(),
        }
    }
}

fn split_entry(session: &mut Session, inputs: &[LinkId], args: &[Arg]) -> Result<ChainId> {
    let [input] = inputs else {
        return Err(GraphError::Structural(format!(
            "split takes exactly one input, got {}",
            inputs.len()
        )));
    };
    let count = match args {
        [] => 2,
        [Arg::Scalar(n)] => n.parse().map_err(|_| {
            GraphError::Script(format!("split count must be a number, got {:?}", n))
        })?,
        _ => {
            return Err(GraphError::Script(
                "split takes a single count argument".to_string(),
            ));
        }
    };
    session.split_chain(*input, count)
}

fn discard_entry(session: &mut Session, inputs: &[LinkId], _args: &[Arg]) -> Result<ChainId> {
    let [input] = inputs else {
        return Err(GraphError::Structural(format!(
            "discard takes exactly one input, got {}",
            inputs.len()
        )));
    };
    session.discard(*input)
}
