//! Format-adapter seam. Spec §6: the engine is pure over whatever a `Source`
//! hands it; concrete CSV/XML/JSON/YAML/NEON readers are out of scope here.

use rowql_core::{Error, Row};

/// A row-producing document. One value per file-query literal
/// (`(path).selector`); the path's extension and selector are the adapter's
/// concern, not the engine's.
pub trait Source {
    /// Streams rows for `selector` (a dotted path into the document
    /// identifying the row-producing node, or `None`/`"*"` for the root).
    /// Opens lazily; `FileNotFound`/`InvalidFormat` surface here rather than
    /// at construction, so an adapter can defer I/O until the pipeline
    /// actually pulls.
    fn stream_rows(&self, selector: Option<&str>) -> Result<Box<dyn Iterator<Item = Row> + '_>, Error>;

    /// A human-readable tag used by [`Query`](rowql_ast::Query)'s `test()`
    /// rendering and by join diagnostics, e.g. `"[json](products.json)"`.
    fn source_label(&self) -> String;
}
