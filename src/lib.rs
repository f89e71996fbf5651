#![deny(clippy::all)]

//! Owned handles and typed errors over the FFmpeg C libraries
//!
//! Every native object is wrapped in a type that releases it on drop, and
//! every status code is turned into either an [`Error`] naming the failed
//! call or an [`Outcome`] for the "try again" and "end of stream" signals
//! that drive encode, decode and filter loops.

// FFmpeg C bindings (hand-written, no bindgen)
pub mod ffi;

// Error taxonomy and data-flow outcomes
pub mod error;

// av_log bridge into tracing
pub mod log;

// Dictionaries, channel layouts and sample helpers (libavutil)
pub mod util;

// Codecs, frames, packets, hardware contexts, scaling and resampling
pub mod codec;

// Containers (libavformat)
pub mod format;

// Filter graphs (libavfilter)
pub mod filter;

pub use codec::{
  AudioFormat, Codec, CodecContext, CodecState, Decoder, Encoder, Frame, HwDeviceContext,
  HwFramesConfig, HwFramesContext, OwnedFrame, Packet, Resampler, ScaleAlgorithm, ScaleParams,
  Scaler,
};
pub use error::{Error, Outcome, Result};
pub use ffi::FFmpegError;
pub use filter::{BufferSink, BufferSrc, BufferSrcParameters, Filter, FilterContext, FilterGraph};
pub use format::{CodecParameters, MediaReader, MediaWriter, Stream};
pub use util::{ChannelLayout, Dictionary};

// zlib objects for the static FFmpeg archives come from libz-sys
#[cfg(feature = "static")]
use libz_sys as _;
