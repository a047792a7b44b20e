//! Input resolution and automatic fan-out.
//!
//! A non-shared pipe feeds exactly one consumer. When a second consumer
//! shows up, a split operation is inserted once per pipe: it reads the
//! original pipe, the consumers already reading it are moved to split
//! output 0, and every further consumer gets the next split output. The
//! split argument is rewritten with the running output count.

use super::chain::{ChainNode, SlotId, SlotOwner};
use super::{LinkId, Operation, Session};
use crate::args::Arg;
use crate::catalog::{Helper, helper_filter};
use crate::error::GraphError;
use crate::Result;
use tracing::debug;

impl Session {
    pub(super) fn resolve_inputs(&mut self, index: usize) -> Result<()> {
        let slots = self.chains[index].inputs.clone();
        for slot in slots {
            self.resolve_slot(slot)?;
        }
        Ok(())
    }

    /// Bind the consumer at `slot`, fanning out if its pipe is taken.
    pub(super) fn resolve_slot(&mut self, slot: SlotId) -> Result<()> {
        let link = self.slots[slot.0].link;
        let l = &self.links[link.index];
        let target = if l.shared || !l.bound_output {
            self.links[link.index].bind_output()?;
            link
        } else {
            self.fan_out(link)?
        };
        self.slots[slot.0].resolved = true;
        if target != link {
            self.rebind(slot, target);
        }
        Ok(())
    }

    fn fan_out(&mut self, link: LinkId) -> Result<LinkId> {
        let splitter = match self.groups.get(&link.index).and_then(|g| g.splitter) {
            Some(index) => index,
            None => self.insert_splitter(link)?,
        };
        self.next_split_output(splitter)
    }

    fn insert_splitter(&mut self, link: LinkId) -> Result<usize> {
        let media = self.links[link.index].media;
        let name = helper_filter(Helper::Split, media, &self.links[link.index].describe())?;

        let index = self.push_chain(ChainNode::default());
        let slot = self.push_slot(link, SlotOwner::Chain(index));
        self.slots[slot.0].resolved = true;
        let op = self.push_op(Operation::new(name).with_args(&[Arg::scalar(0)]));
        self.chains[index].inputs = vec![slot];
        self.chains[index].op = Some(op);
        self.roots.push(index);
        self.groups.entry(link.index).or_default().splitter = Some(index);
        debug!(pipe = %self.links[link.index].describe(), filter = name, "inserted fan-out");

        // The consumer that already reads the pipe moves to the splitter.
        let direct: Vec<SlotId> = self
            .groups
            .get(&link.index)
            .map(|g| {
                g.slots
                    .iter()
                    .copied()
                    .filter(|s| {
                        let sl = &self.slots[s.0];
                        sl.resolved && sl.link == link && sl.owner != SlotOwner::Chain(index)
                    })
                    .collect()
            })
            .unwrap_or_default();
        for s in direct {
            let out = self.next_split_output(index)?;
            self.rebind(s, out);
        }
        Ok(index)
    }

    /// Allocate, bind and count one more split output.
    fn next_split_output(&mut self, splitter: usize) -> Result<LinkId> {
        let n = self.chains[splitter].outputs.len();
        let out = self.output_at(splitter, n)?.ok_or_else(|| {
            GraphError::Structural(format!(
                "{} ran out of outputs",
                self.describe_chain(splitter)
            ))
        })?;
        if let Some(op) = self.chains[splitter].op {
            self.ops[op.index].set_args(&[Arg::scalar(n + 1)]);
        }
        let source = self.slots[self.chains[splitter].inputs[0].0].link;
        let media = self.links[source.index].media;
        self.links[out.index].mark_media_type(media)?;
        self.links[out.index].bind_output()?;
        debug!(
            pipe = %self.links[source.index].describe(),
            outputs = n + 1,
            "fan-out grew"
        );
        Ok(out)
    }

    /// Point `slot` at `target`, moving it between reference groups.
    ///
    /// Exports carry their name with them, so the exported name follows the
    /// consumer onto the fresh pipe.
    fn rebind(&mut self, slot: SlotId, target: LinkId) {
        let from = self.slots[slot.0].link;
        if let Some(group) = self.groups.get_mut(&from.index) {
            group.slots.retain(|&s| s != slot);
        }
        self.groups.entry(target.index).or_default().slots.push(slot);
        self.slots[slot.0].link = target;
        if self.slots[slot.0].owner == SlotOwner::Export {
            self.swap_names(from, target);
        }
    }

    fn swap_names(&mut self, a: LinkId, b: LinkId) {
        let name_a = std::mem::take(&mut self.links[a.index].name);
        let name_b = std::mem::replace(&mut self.links[b.index].name, name_a);
        self.links[a.index].name = name_b;

        let fixed_a = self.links[a.index].fixed;
        self.links[a.index].fixed = self.links[b.index].fixed;
        self.links[b.index].fixed = fixed_a;
    }
}
