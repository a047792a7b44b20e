//! Graph session: pipes, chains and the state of one compilation.
//!
//! Construction happens through `&mut Session` calls:
//! - `start` / `extend` / `connect` / `fork` / `link` build chains
//! - `outputs` / `output` / `take_outputs` hand out output pipes lazily
//! - `complete` resolves exports and validates, `render` serializes
//!
//! Everything lives in arenas addressed by ids carrying the session number,
//! so ids from another session are rejected instead of aliasing.

mod apply;
mod build;
mod chain;
mod complete;
mod fanout;
mod link;
mod operation;
mod render;
#[cfg(test)]
mod tests;

pub use build::Outputs;
pub use chain::ChainId;
pub use link::{Link, LinkId, MediaType};
pub use operation::{OpId, Operation};

use crate::args::Arg;
use crate::catalog::Catalog;
use crate::error::GraphError;
use crate::Result;
use chain::{ChainNode, Slot, SlotId, SlotOwner};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Output allocation stops here unless the caller asked for a count.
pub const UNBOUNDED_LIMIT: usize = 10_000;

static NEXT_SESSION: AtomicU32 = AtomicU32::new(0);

/// Consumers of one non-shared pipe, plus its fan-out chain once needed.
#[derive(Debug, Default)]
struct RefGroup {
    slots: Vec<SlotId>,
    splitter: Option<usize>,
}

pub struct Session {
    id: u32,
    catalog: Rc<Catalog>,
    links: Vec<Link>,
    slots: Vec<Slot>,
    ops: Vec<Operation>,
    chains: Vec<ChainNode>,
    groups: HashMap<usize, RefGroup>,
    /// Top-level chains in creation order.
    roots: Vec<usize>,
    streams: HashMap<String, LinkId>,
    counter: usize,
    completed: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_catalog(Catalog::builtin())
    }

    pub fn with_catalog(catalog: impl Into<Rc<Catalog>>) -> Self {
        Self {
            id: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            catalog: catalog.into(),
            links: Vec::new(),
            slots: Vec::new(),
            ops: Vec::new(),
            chains: Vec::new(),
            groups: HashMap::new(),
            roots: Vec::new(),
            streams: HashMap::new(),
            counter: 0,
            completed: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn ensure_open(&self, what: &'static str) -> Result<()> {
        if self.completed {
            return Err(GraphError::Completed(what));
        }
        Ok(())
    }

    // ---- pipes ----------------------------------------------------------

    /// Allocate an anonymous pipe.
    pub fn pipe(&mut self) -> Result<LinkId> {
        self.ensure_open("pipe")?;
        let name = self.next_name();
        Ok(self.push_link(Link::anonymous(name)))
    }

    /// Allocate a pipe with a caller-chosen, fixed name.
    pub fn named_pipe(&mut self, name: impl Into<String>) -> Result<LinkId> {
        self.ensure_open("pipe")?;
        Ok(self.push_link(Link::named(name.into())))
    }

    /// The shared pipe for an input stream such as `0:v`.
    pub fn input_stream(&mut self, spec: impl Into<String>) -> Result<LinkId> {
        self.ensure_open("input_stream")?;
        let spec = spec.into();
        if let Some(id) = self.streams.get(&spec) {
            return Ok(*id);
        }
        let id = self.push_link(Link::stream(spec.clone()));
        self.streams.insert(spec, id);
        Ok(id)
    }

    pub fn get_link(&self, id: LinkId) -> Result<&Link> {
        let i = self.link_index(id)?;
        Ok(&self.links[i])
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn set_media_type(&mut self, id: LinkId, media: MediaType) -> Result<()> {
        let i = self.link_index(id)?;
        self.links[i].mark_media_type(media)
    }

    pub fn rename(&mut self, id: LinkId, name: &str) -> Result<()> {
        self.ensure_open("rename")?;
        let i = self.link_index(id)?;
        self.links[i].rename(name)
    }

    /// Attach a diagnostic hint shown in error messages about this pipe.
    pub fn set_hint(&mut self, id: LinkId, hint: impl Into<String>) -> Result<()> {
        let i = self.link_index(id)?;
        self.links[i].hint = Some(hint.into());
        Ok(())
    }

    /// Number of consumer positions currently reading `id`.
    pub fn reference_count(&self, id: LinkId) -> Result<usize> {
        let i = self.link_index(id)?;
        Ok(self.groups.get(&i).map(|g| g.slots.len()).unwrap_or(0))
    }

    // ---- operations -----------------------------------------------------

    pub fn operation(&self, id: OpId) -> Result<&Operation> {
        let i = self.op_index(id)?;
        Ok(&self.ops[i])
    }

    /// Replace the arguments of an operation already placed in a chain.
    /// Rendering always reflects the latest value.
    pub fn set_args(&mut self, id: OpId, args: &[Arg]) -> Result<()> {
        self.ensure_open("set_args")?;
        let i = self.op_index(id)?;
        self.ops[i].set_args(args);
        Ok(())
    }

    pub fn chain_operation(&self, chain: ChainId) -> Result<Option<OpId>> {
        let i = self.chain_index(chain)?;
        Ok(self.chains[i].op)
    }

    // ---- arena helpers --------------------------------------------------

    fn next_name(&mut self) -> String {
        let name = format!("_{}", self.counter);
        self.counter += 1;
        name
    }

    fn push_link(&mut self, link: Link) -> LinkId {
        self.links.push(link);
        LinkId {
            session: self.id,
            index: self.links.len() - 1,
        }
    }

    fn push_op(&mut self, op: Operation) -> OpId {
        self.ops.push(op);
        OpId {
            session: self.id,
            index: self.ops.len() - 1,
        }
    }

    fn push_chain(&mut self, node: ChainNode) -> usize {
        self.chains.push(node);
        self.chains.len() - 1
    }

    fn push_slot(&mut self, link: LinkId, owner: SlotOwner) -> SlotId {
        let slot = SlotId(self.slots.len());
        self.slots.push(Slot {
            link,
            owner,
            resolved: false,
        });
        if !self.links[link.index].shared {
            self.groups.entry(link.index).or_default().slots.push(slot);
        }
        slot
    }

    fn chain_id(&self, index: usize) -> ChainId {
        ChainId {
            session: self.id,
            index,
        }
    }

    fn link_index(&self, id: LinkId) -> Result<usize> {
        if id.session != self.id || id.index >= self.links.len() {
            return Err(GraphError::Binding(format!(
                "pipe #{} was not created by this session",
                id.index
            )));
        }
        Ok(id.index)
    }

    fn chain_index(&self, id: ChainId) -> Result<usize> {
        if id.session != self.id || id.index >= self.chains.len() {
            return Err(GraphError::Binding(format!(
                "chain #{} was not created by this session",
                id.index
            )));
        }
        Ok(id.index)
    }

    fn op_index(&self, id: OpId) -> Result<usize> {
        if id.session != self.id || id.index >= self.ops.len() {
            return Err(GraphError::Binding(format!(
                "operation #{} was not created by this session",
                id.index
            )));
        }
        Ok(id.index)
    }

    /// Short description of a chain segment for messages.
    fn describe_chain(&self, index: usize) -> String {
        match self.chains[index].op {
            Some(op) => format!("chain '{}'", self.ops[op.index].target()),
            None => {
                let inputs: Vec<String> = self.chains[index]
                    .inputs
                    .iter()
                    .map(|s| self.links[self.slots[s.0].link.index].label())
                    .collect();
                format!("empty chain on {}", inputs.join(""))
            }
        }
    }
}
