//! Chain segments and reference slots.
//!
//! A chain is a doubly linked run of segments stored in the session arena.
//! Each segment owns at most one operation; inputs live on the first
//! segment, outputs on the last.

use crate::graph::{LinkId, OpId};

/// Handle to one chain segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId {
    pub(crate) session: u32,
    pub(crate) index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotOwner {
    Chain(usize),
    /// A caller export; it reads the pipe under the exported name.
    Export,
}

/// One consumer position pointing at a pipe.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) link: LinkId,
    pub(crate) owner: SlotOwner,
    pub(crate) resolved: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ChainNode {
    pub(crate) op: Option<OpId>,
    pub(crate) inputs: Vec<SlotId>,
    pub(crate) outputs: Vec<LinkId>,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl ChainNode {
    pub(crate) fn is_placeholder(&self) -> bool {
        self.op.is_none()
    }
}
