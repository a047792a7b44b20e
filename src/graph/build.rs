//! Chain construction primitives.

use super::chain::{ChainNode, SlotOwner};
use super::{ChainId, Link, LinkId, Operation, Session, UNBOUNDED_LIMIT};
use crate::error::GraphError;
use crate::Result;
use tracing::{debug, trace};

/// Lazily allocating iterator over a chain's outputs.
///
/// Yields connected outputs first, then fresh pipes on demand. Operations
/// with dynamic outputs never run dry, so collecting without `take` ends in
/// an `UnboundedIteration` error.
pub struct Outputs<'s> {
    session: &'s mut Session,
    chain: usize,
    index: usize,
    done: bool,
}

impl Iterator for Outputs<'_> {
    type Item = Result<LinkId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.session.output_at(self.chain, self.index) {
            Ok(Some(link)) => {
                self.index += 1;
                Some(Ok(link))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Session {
    /// Start a placeholder chain reading `inputs`.
    pub fn start(&mut self, inputs: &[LinkId]) -> Result<ChainId> {
        self.ensure_open("start")?;
        for &link in inputs {
            self.link_index(link)?;
        }
        let index = self.push_chain(ChainNode::default());
        let slots = inputs
            .iter()
            .map(|&link| self.push_slot(link, SlotOwner::Chain(index)))
            .collect();
        self.chains[index].inputs = slots;
        self.roots.push(index);
        Ok(self.chain_id(index))
    }

    /// Give `chain` its operation, or append a new segment after it.
    ///
    /// Returns the segment now holding `op`, which is the handle to keep
    /// extending.
    pub fn extend(&mut self, chain: ChainId, op: Operation) -> Result<ChainId> {
        self.ensure_open("extend")?;
        let index = self.chain_index(chain)?;
        self.ensure_tail(index)?;

        if self.chains[index].is_placeholder() {
            let op = self.push_op(op);
            self.chains[index].op = Some(op);
            self.resolve_inputs(index)?;
            return Ok(chain);
        }

        if !self.chains[index].outputs.is_empty() {
            return Err(GraphError::Structural(format!(
                "{} already has outputs and cannot be extended",
                self.describe_chain(index)
            )));
        }
        let op = self.push_op(op);
        let segment = self.push_chain(ChainNode {
            op: Some(op),
            prev: Some(index),
            ..ChainNode::default()
        });
        self.chains[index].next = Some(segment);
        Ok(self.chain_id(segment))
    }

    /// Attach explicit output pipes to `chain`.
    pub fn connect(&mut self, chain: ChainId, outputs: &[LinkId]) -> Result<()> {
        self.ensure_open("connect")?;
        let index = self.chain_index(chain)?;
        if self.chains[index].is_placeholder() {
            return Err(GraphError::Structural(format!(
                "cannot connect outputs to {}",
                self.describe_chain(index)
            )));
        }
        self.ensure_tail(index)?;
        if !self.chains[index].outputs.is_empty() {
            return Err(GraphError::Binding(format!(
                "{} already has connected outputs",
                self.describe_chain(index)
            )));
        }
        for &link in outputs {
            self.link_index(link)?;
        }
        for &link in outputs {
            self.links[link.index].bind_input()?;
        }
        self.chains[index].outputs = outputs.to_vec();
        Ok(())
    }

    /// Branch off a new placeholder chain.
    ///
    /// Without an operation this reuses the first `n` declared inputs; with
    /// one it reads `n` of the chain's outputs.
    pub fn fork(&mut self, chain: ChainId, n: usize) -> Result<ChainId> {
        self.ensure_open("fork")?;
        let index = self.chain_index(chain)?;
        self.ensure_tail(index)?;

        let links = if self.chains[index].is_placeholder() {
            let inputs = &self.chains[index].inputs;
            if n > inputs.len() {
                return Err(GraphError::Structural(format!(
                    "cannot fork {} inputs from {} with {} inputs",
                    n,
                    self.describe_chain(index),
                    inputs.len()
                )));
            }
            inputs[..n]
                .iter()
                .map(|s| self.slots[s.0].link)
                .collect::<Vec<_>>()
        } else {
            self.take_outputs(chain, n)?
        };
        self.start(&links)
    }

    /// Iterate the chain's pipes: declared inputs for a placeholder,
    /// outputs otherwise.
    pub fn outputs(&mut self, chain: ChainId) -> Result<Outputs<'_>> {
        let index = self.chain_index(chain)?;
        Ok(Outputs {
            session: self,
            chain: index,
            index: 0,
            done: false,
        })
    }

    /// Output pipe number `i`, allocating it (and any before it) if needed.
    pub fn output(&mut self, chain: ChainId, i: usize) -> Result<LinkId> {
        let index = self.chain_index(chain)?;
        match self.output_at(index, i)? {
            Some(link) => Ok(link),
            None => match self.chains[index].op {
                Some(op) => Err(GraphError::Arity {
                    name: self.ops[op.index].target(),
                    count: self.ops[op.index].outputs().count().unwrap_or(0),
                    index: i,
                }),
                None => Err(GraphError::Structural(format!(
                    "{} has no input {}",
                    self.describe_chain(index),
                    i
                ))),
            },
        }
    }

    /// The first `n` output pipes.
    pub fn take_outputs(&mut self, chain: ChainId, n: usize) -> Result<Vec<LinkId>> {
        (0..n).map(|i| self.output(chain, i)).collect()
    }

    /// Splice the whole sequence containing `to` after `from`.
    pub fn link(&mut self, from: ChainId, to: ChainId) -> Result<()> {
        self.ensure_open("link")?;
        let a = self.chain_index(from)?;
        let b = self.chain_index(to)?;

        if self.chains[a].is_placeholder() {
            return Err(GraphError::Structural(format!(
                "cannot link from {}",
                self.describe_chain(a)
            )));
        }
        self.ensure_tail(a)?;
        if !self.chains[a].outputs.is_empty() {
            return Err(GraphError::Structural(format!(
                "{} already has outputs and cannot be linked",
                self.describe_chain(a)
            )));
        }

        let head = self.head(b);
        if self.sequence(head).contains(&a) {
            return Err(GraphError::Structural(format!(
                "linking {} to {} would create a cycle",
                self.describe_chain(a),
                self.describe_chain(b)
            )));
        }

        self.chains[a].next = Some(head);
        self.chains[head].prev = Some(a);
        self.roots.retain(|&r| r != head);
        debug!(
            from = %self.describe_chain(a),
            to = %self.describe_chain(head),
            "spliced chains"
        );
        Ok(())
    }

    pub(super) fn output_at(&mut self, index: usize, i: usize) -> Result<Option<LinkId>> {
        let Some(op) = self.chains[index].op else {
            let node = &self.chains[index];
            return Ok(node.inputs.get(i).map(|s| self.slots[s.0].link));
        };
        if let Some(&link) = self.chains[index].outputs.get(i) {
            return Ok(Some(link));
        }

        self.ensure_open("outputs")?;
        self.ensure_tail(index)?;
        let pads = self.ops[op.index].outputs().clone();
        if let Some(count) = pads.count() {
            if i >= count {
                return Ok(None);
            }
        }
        if i >= UNBOUNDED_LIMIT {
            return Err(GraphError::UnboundedIteration(self.describe_chain(index)));
        }

        while self.chains[index].outputs.len() <= i {
            let n = self.chains[index].outputs.len();
            let mut link = Link::anonymous(self.next_name());
            link.hint = Some(format!("{}.output.{}", self.ops[op.index].name(), n));
            link.media = pads.media(n);
            link.bound_input = true;
            trace!(pipe = %link.name, hint = ?link.hint, "allocated output");
            let id = self.push_link(link);
            self.chains[index].outputs.push(id);
        }
        Ok(Some(self.chains[index].outputs[i]))
    }

    fn ensure_tail(&self, index: usize) -> Result<()> {
        if self.chains[index].next.is_some() {
            return Err(GraphError::Structural(format!(
                "{} is already linked to a successor",
                self.describe_chain(index)
            )));
        }
        Ok(())
    }

    pub(super) fn head(&self, mut index: usize) -> usize {
        while let Some(prev) = self.chains[index].prev {
            index = prev;
        }
        index
    }

    /// All segments from `head` forward.
    pub(super) fn sequence(&self, head: usize) -> Vec<usize> {
        let mut out = vec![head];
        let mut cur = head;
        while let Some(next) = self.chains[cur].next {
            out.push(next);
            cur = next;
        }
        out
    }
}
