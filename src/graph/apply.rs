//! Catalog-backed construction: filters by name, splits and sinks.

use super::{ChainId, LinkId, Operation, Session};
use crate::args::Arg;
use crate::builders::{CommandBuilder, ConcatBuilder};
use crate::catalog::{Helper, Pads, helper_filter};
use crate::error::GraphError;
use crate::Result;

impl Session {
    /// A catalog filter as an operation carrying its declared output pads.
    pub fn filter(&self, name: &str) -> Result<Operation> {
        let spec = self
            .catalog
            .get(name)
            .ok_or_else(|| GraphError::UnknownFilter(name.to_string()))?;
        Ok(Operation::new(name).with_outputs(spec.outputs.clone()))
    }

    /// Start a chain on `inputs` and give it the catalog filter `name`.
    ///
    /// Inputs are tagged with the filter's declared input media types first,
    /// so fan-out can pick the right split operation.
    pub fn apply(&mut self, name: &str, inputs: &[LinkId], args: &[Arg]) -> Result<ChainId> {
        self.ensure_open("apply")?;
        let op = self.filter(name)?.with_args(args);
        self.place(inputs, op)
    }

    /// Start a chain on `inputs` holding `op`, tagging the inputs with the
    /// media types the catalog declares for `op`'s name, if it knows it.
    pub fn place(&mut self, inputs: &[LinkId], op: Operation) -> Result<ChainId> {
        self.ensure_open("place")?;
        let pads = self.catalog.get(op.name()).map(|spec| spec.inputs.clone());
        if let Some(Pads::Fixed(pads)) = pads {
            for (&link, &media) in inputs.iter().zip(&pads) {
                self.set_media_type(link, media)?;
            }
        }
        let chain = self.start(inputs)?;
        self.extend(chain, op)
    }

    /// Call a registered entry point, or fall back to `apply`.
    pub fn invoke(&mut self, name: &str, inputs: &[LinkId], args: &[Arg]) -> Result<ChainId> {
        self.ensure_open("invoke")?;
        match self.catalog.entry(name) {
            Some(entry) => entry(self, inputs, args),
            None => self.apply(name, inputs, args),
        }
    }

    /// Explicitly duplicate `link` into `n` pipes.
    pub fn split(&mut self, link: LinkId, n: usize) -> Result<Vec<LinkId>> {
        let chain = self.split_chain(link, n)?;
        self.take_outputs(chain, n)
    }

    /// The chain behind `split`; its outputs are fixed to `n`.
    pub fn split_chain(&mut self, link: LinkId, n: usize) -> Result<ChainId> {
        self.ensure_open("split")?;
        let l = self.get_link(link)?;
        let media = l.media;
        let name = helper_filter(Helper::Split, media, &l.describe())?;
        let op = Operation::new(name)
            .with_args(&[Arg::scalar(n)])
            .with_outputs(Pads::Fixed(vec![media; n]));
        let chain = self.start(&[link])?;
        self.extend(chain, op)
    }

    /// Feed `link` into the sink for its media type so nothing dangles.
    pub fn discard(&mut self, link: LinkId) -> Result<ChainId> {
        self.ensure_open("discard")?;
        let l = self.get_link(link)?;
        let name = helper_filter(Helper::Sink, l.media, &l.describe())?;
        let chain = self.start(&[link])?;
        self.extend(chain, Operation::new(name).with_outputs(Pads::None))
    }

    /// A concat builder to finalize against this session.
    pub fn concat(&self) -> ConcatBuilder {
        ConcatBuilder::new()
    }

    /// A command-list builder; turn it into an operation with `to_operation`.
    pub fn commands(&self) -> CommandBuilder {
        CommandBuilder::new()
    }
}
