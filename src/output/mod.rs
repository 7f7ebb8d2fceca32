//! Output formatting module
//!
//! Report records, formats and the writer they end up in.

mod event;
mod formatter;
mod sink;

pub use event::{RenderableEvent, START_LABEL};
pub use formatter::{OutputFormat, ResultFormatter};
pub use sink::{OutputSink, SharedBuffer};
