//! Export resolution and end-of-session validation.

use super::chain::SlotOwner;
use super::{LinkId, Operation, Session};
use crate::catalog::{Helper, helper_filter};
use crate::error::GraphError;
use crate::Result;
use std::collections::HashMap;
use tracing::{debug, info};

impl Session {
    /// Resolve `exports` (final name -> pipe), validate, and freeze.
    ///
    /// Afterwards every construction call fails with `Completed`.
    pub fn complete<I, K>(&mut self, exports: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, LinkId)>,
        K: Into<String>,
    {
        self.ensure_open("complete")?;
        for (name, link) in exports {
            self.export(name.into(), link)?;
        }
        self.validate()?;
        self.completed = true;
        info!(
            chains = self.roots.len(),
            pipes = self.links.len(),
            "graph completed"
        );
        Ok(())
    }

    fn export(&mut self, name: String, link: LinkId) -> Result<()> {
        let i = self.link_index(link)?;
        let target = if self.links[i].name == name {
            link
        } else if self.links[i].fixed {
            let out = self.pass_through(link)?;
            self.links[out.index].rename(&name)?;
            out
        } else {
            self.links[i].rename(&name)?;
            link
        };
        let slot = self.push_slot(target, SlotOwner::Export);
        self.resolve_slot(slot)
    }

    /// Route `link` through an identity operation; returns the new pipe.
    fn pass_through(&mut self, link: LinkId) -> Result<LinkId> {
        let l = &self.links[link.index];
        let name = helper_filter(Helper::PassThrough, l.media, &l.describe())?;
        debug!(pipe = %l.describe(), filter = name, "inserted pass-through for export");
        let chain = self.start(&[link])?;
        let chain = self.extend(chain, Operation::new(name))?;
        let out = self.output(chain, 0)?;
        let media = self.links[link.index].media;
        self.links[out.index].mark_media_type(media)?;
        Ok(out)
    }

    fn validate(&self) -> Result<()> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, l) in self.links.iter().enumerate() {
            if !(l.bound_input || l.bound_output) {
                continue;
            }
            if let Some(prev) = seen.insert(l.name.as_str(), i) {
                return Err(GraphError::Naming(format!(
                    "two pipes are named [{}] ({} and {})",
                    l.name,
                    self.links[prev].describe(),
                    l.describe()
                )));
            }
        }

        for l in self.links.iter().filter(|l| !l.shared) {
            match (l.bound_input, l.bound_output) {
                (true, false) => {
                    return Err(GraphError::Binding(format!(
                        "pipe {} is not bound to any input: nothing reads it; \
                         route it somewhere, export it or discard it",
                        l.describe()
                    )));
                }
                (false, true) => {
                    return Err(GraphError::Binding(format!(
                        "pipe {} is not bound to any output: nothing feeds it",
                        l.describe()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
