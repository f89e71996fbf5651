//! Container reading and writing (libavformat)
//!
//! [`MediaReader`] and [`MediaWriter`] own an `AVFormatContext`; the
//! [`Stream`]s inside are borrowed from them and cannot outlive them.

mod reader;
mod stream;
mod writer;

pub use reader::MediaReader;
pub use stream::{CodecParameters, Stream};
pub use writer::MediaWriter;
