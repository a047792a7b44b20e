//! Filtergraph builder: describe a data-flow graph of filters connected by
//! pipes and compile it into ffmpeg filtergraph text.
//!
//! ```no_run
//! use filtergraph::{Catalog, Operation, compile};
//!
//! let graph = compile(Catalog::builtin(), |s| {
//!     let v = s.input_stream("0:v")?;
//!     let chain = s.start(&[v])?;
//!     let chain = s.extend(chain, Operation::new("hflip"))?;
//!     let out = s.output(chain, 0)?;
//!     Ok(Some(vec![("flipped".to_string(), out)]))
//! })?;
//! assert_eq!(graph, "[0:v]hflip[flipped]");
//! # Ok::<(), filtergraph::GraphError>(())
//! ```

pub mod args;
pub mod builders;
pub mod catalog;
pub mod compile;
pub mod error;
pub mod graph;
pub mod script;

pub use args::{Arg, Value};
pub use builders::{CommandBuilder, ConcatBuilder, Target};
pub use catalog::{Catalog, FilterSpec, Pads};
pub use compile::{Exports, compile, compile_async};
pub use error::GraphError;
pub use graph::{ChainId, Link, LinkId, MediaType, OpId, Operation, Session};
pub use script::GraphScript;

pub type Result<T> = std::result::Result<T, GraphError>;
