//! Serialization into filtergraph text.

use super::Session;
use std::collections::HashSet;

impl Session {
    /// Render every top-level chain, `;`-joined; empty chains are omitted.
    pub fn render(&self) -> String {
        let mut seen = HashSet::new();
        let mut chains = Vec::new();
        for &root in &self.roots {
            let head = self.head(root);
            if !seen.insert(head) {
                continue;
            }
            let segments: Vec<String> = self
                .sequence(head)
                .into_iter()
                .filter(|&i| !self.chains[i].is_placeholder())
                .map(|i| self.render_segment(i))
                .collect();
            if !segments.is_empty() {
                chains.push(segments.join(","));
            }
        }
        chains.join(";")
    }

    /// `[in]...name@id=args[out]...`
    fn render_segment(&self, index: usize) -> String {
        let node = &self.chains[index];
        let mut out = String::new();
        for slot in &node.inputs {
            out.push_str(&self.links[self.slots[slot.0].link.index].label());
        }
        if let Some(op) = node.op {
            out.push_str(&self.ops[op.index].to_string());
        }
        for link in &node.outputs {
            out.push_str(&self.links[link.index].label());
        }
        out
    }
}
