//! Codecs and the data they move (libavcodec, libswscale, libswresample)
//!
//! [`Decoder`] and [`Encoder`] wrap a [`CodecContext`] and track where it is
//! in the send/receive cycle. Frames and packets are owned buffers reused
//! across calls; hardware devices and frame pools are reference-counted.

mod context;
mod decoder;
mod descriptor;
mod encoder;
mod frame;
mod hwdevice;
mod hwframes;
mod packet;
mod resampler;
mod scaler;

pub use context::CodecContext;
pub use decoder::Decoder;
pub use descriptor::{Codec, HwConfig, HwConfigIter};
pub use encoder::Encoder;
pub use frame::{Frame, OwnedFrame};
pub use hwdevice::HwDeviceContext;
pub use hwframes::{hw_pix_fmt_for, HwFramesConfig, HwFramesContext};
pub use packet::Packet;
pub use resampler::{AudioFormat, Resampler};
pub use scaler::{ScaleAlgorithm, ScaleParams, Scaler};

/// Lifecycle of a [`Decoder`] or [`Encoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecState {
  /// Allocated, not opened yet
  Unopened,
  /// Accepting input
  Open,
  /// End of input signalled, output still pending
  Draining,
  /// Every output unit has been received
  Flushed,
}

/// Progress of an opened codec; "unopened" comes from the context itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
  Running,
  Draining,
  Flushed,
}

impl Stage {
  fn state(self, is_open: bool) -> CodecState {
    match (is_open, self) {
      (false, _) => CodecState::Unopened,
      (true, Stage::Running) => CodecState::Open,
      (true, Stage::Draining) => CodecState::Draining,
      (true, Stage::Flushed) => CodecState::Flushed,
    }
  }
}
