//! Entry points: run a builder against a fresh session and compile.

use crate::catalog::Catalog;
use crate::graph::{LinkId, Session};
use crate::Result;
use std::future::Future;
use std::rc::Rc;

/// Final name -> pipe pairs, exported in order.
pub type Exports = Vec<(String, LinkId)>;

/// Build a graph synchronously and compile it to filtergraph text.
pub fn compile<F>(catalog: impl Into<Rc<Catalog>>, build: F) -> Result<String>
where
    F: FnOnce(&mut Session) -> Result<Option<Exports>>,
{
    let mut session = Session::with_catalog(catalog);
    let exports = build(&mut session)?;
    finish(session, exports)
}

/// Like `compile`, for builders that await between construction calls.
///
/// The builder owns the session while it runs and hands it back with its
/// exports; completion runs once the future resolves.
pub async fn compile_async<F, Fut>(catalog: impl Into<Rc<Catalog>>, build: F) -> Result<String>
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = Result<(Session, Option<Exports>)>>,
{
    let (session, exports) = build(Session::with_catalog(catalog)).await?;
    finish(session, exports)
}

fn finish(mut session: Session, exports: Option<Exports>) -> Result<String> {
    session.complete(exports.unwrap_or_default())?;
    Ok(session.render())
}
