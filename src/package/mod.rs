//! EPUB archive I/O: unpacking a source package and packing the output.

mod reader;
mod writer;

pub use reader::extract;
pub use writer::{MIMETYPE, write_archive};
