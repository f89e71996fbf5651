//! Raw FFmpeg declarations, written by hand
//!
//! Structs are opaque here. Their fields are read and written through the
//! small C shim in `accessors.c`, so the Rust side never depends on struct
//! layout and keeps working across FFmpeg minor versions.

pub mod accessors;
pub mod avcodec;
pub mod avfilter;
pub mod avformat;
pub mod avutil;
pub mod error;
pub mod hwaccel;
pub mod swresample;
pub mod swscale;
pub mod types;

pub use error::FFmpegError;
pub use types::*;
