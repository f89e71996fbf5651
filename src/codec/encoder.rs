//! Encoder: frames in, packets out
//!
//! Mirror image of [`Decoder`](super::Decoder) over
//! `avcodec_send_frame`/`avcodec_receive_packet`.

use std::ops::{Deref, DerefMut};

use crate::error::{outcome, Error, Outcome, Result};
use crate::ffi::avcodec::{avcodec_flush_buffers, avcodec_receive_packet, avcodec_send_frame};
use crate::util::Dictionary;

use super::{Codec, CodecContext, CodecState, Frame, Packet, Stage};

/// Encoding codec context
pub struct Encoder {
  ctx: CodecContext,
  packet: Packet,
  stage: Stage,
}

impl Encoder {
  /// Allocate an encoder context for `codec`
  pub fn new(codec: Codec) -> Result<Self> {
    if !codec.is_encoder() {
      return Err(Error::invalid_argument(
        "avcodec_alloc_context3",
        format!("{} is not an encoder", codec.name()),
      ));
    }
    Self::from_context(CodecContext::new(Some(codec))?)
  }

  /// Look the encoder up by name ("libx264", "h264_vaapi", ...) and allocate it
  pub fn by_name(name: &str) -> Result<Self> {
    Self::new(Codec::find_encoder_by_name(name)?)
  }

  pub fn from_context(ctx: CodecContext) -> Result<Self> {
    Ok(Self {
      ctx,
      packet: Packet::new()?,
      stage: Stage::Running,
    })
  }

  pub fn open(&mut self, options: Option<&mut Dictionary>) -> Result<()> {
    self.ctx.open(None, options)?;
    self.stage = Stage::Running;
    Ok(())
  }

  pub fn state(&self) -> CodecState {
    self.stage.state(self.ctx.is_open())
  }

  /// Feed one frame, or `None` to start draining
  pub fn send_frame(&mut self, frame: Option<&Frame>) -> Result<Outcome<()>> {
    match self.state() {
      CodecState::Unopened => {
        return Err(Error::InvalidState {
          op: "avcodec_send_frame",
          state: "unopened",
        })
      }
      CodecState::Draining | CodecState::Flushed => {
        return Err(Error::InvalidState {
          op: "avcodec_send_frame",
          state: "draining",
        })
      }
      CodecState::Open => {}
    }

    let raw = frame.map_or(std::ptr::null(), Frame::as_ptr);
    let result = outcome("avcodec_send_frame", unsafe {
      avcodec_send_frame(self.ctx.as_mut_ptr(), raw)
    })?;
    if frame.is_none() && result.is_ready() {
      tracing::trace!("encoder draining");
      self.stage = Stage::Draining;
    }
    Ok(result.map(|_| ()))
  }

  /// Pull the next encoded packet
  ///
  /// The packet stays valid until the next call that touches the encoder.
  pub fn receive_packet(&mut self) -> Result<Outcome<&mut Packet>> {
    match self.state() {
      CodecState::Unopened => {
        return Err(Error::InvalidState {
          op: "avcodec_receive_packet",
          state: "unopened",
        })
      }
      CodecState::Flushed => return Ok(Outcome::EndOfStream),
      CodecState::Open | CodecState::Draining => {}
    }

    let ret = unsafe { avcodec_receive_packet(self.ctx.as_mut_ptr(), self.packet.as_mut_ptr()) };
    match outcome("avcodec_receive_packet", ret)? {
      Outcome::Ready(_) => Ok(Outcome::Ready(&mut self.packet)),
      Outcome::RetryLater => Ok(Outcome::RetryLater),
      Outcome::EndOfStream => {
        self.stage = Stage::Flushed;
        Ok(Outcome::EndOfStream)
      }
    }
  }

  /// Send `frame` (or end of input) and hand every packet it yields to `f`
  pub fn encode<F, E>(&mut self, frame: Option<&Frame>, mut f: F) -> std::result::Result<(), E>
  where
    F: FnMut(&mut Packet) -> std::result::Result<(), E>,
    E: From<Error>,
  {
    loop {
      match self.send_frame(frame)? {
        Outcome::RetryLater => {
          if !self.drain_into(&mut f)? {
            return Ok(());
          }
        }
        Outcome::Ready(()) | Outcome::EndOfStream => break,
      }
    }
    self.drain_into(&mut f)?;
    Ok(())
  }

  fn drain_into<F, E>(&mut self, f: &mut F) -> std::result::Result<bool, E>
  where
    F: FnMut(&mut Packet) -> std::result::Result<(), E>,
    E: From<Error>,
  {
    loop {
      match self.receive_packet()? {
        Outcome::Ready(packet) => f(packet)?,
        Outcome::RetryLater => return Ok(true),
        Outcome::EndOfStream => return Ok(false),
      }
    }
  }

  /// Reset the encoder so it accepts frames again
  ///
  /// Only encoders with the flush capability honour this; others keep
  /// returning end of stream from the native side.
  pub fn flush(&mut self) -> Result<()> {
    if !self.ctx.is_open() {
      return Err(Error::InvalidState {
        op: "avcodec_flush_buffers",
        state: "unopened",
      });
    }
    unsafe { avcodec_flush_buffers(self.ctx.as_mut_ptr()) };
    self.packet.unref();
    self.stage = Stage::Running;
    Ok(())
  }

  pub fn into_context(self) -> CodecContext {
    self.ctx
  }
}

impl Deref for Encoder {
  type Target = CodecContext;

  fn deref(&self) -> &CodecContext {
    &self.ctx
  }
}

impl DerefMut for Encoder {
  fn deref_mut(&mut self) -> &mut CodecContext {
    &mut self.ctx
  }
}

impl std::fmt::Debug for Encoder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Encoder")
      .field("codec", &self.ctx.codec().map(|c| c.name()))
      .field("state", &self.state())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::OwnedFrame;
  use crate::ffi::{AVCodecID, AVPixelFormat, AVRational};

  fn rawvideo_encoder() -> Encoder {
    let mut enc = Encoder::new(Codec::find_encoder(AVCodecID::RAWVIDEO).unwrap()).unwrap();
    enc.set_width(16);
    enc.set_height(8);
    enc.set_pix_fmt(AVPixelFormat::GRAY8);
    enc.set_time_base(AVRational::new(1, 25));
    enc
  }

  #[test]
  fn test_decoder_codec_rejected() {
    let codec = Codec::find_decoder(AVCodecID::RAWVIDEO).unwrap();
    assert!(Encoder::new(codec).is_err());
  }

  #[test]
  fn test_unknown_name() {
    assert!(matches!(
      Encoder::by_name("no_such_encoder"),
      Err(Error::Configuration { .. })
    ));
  }

  #[test]
  fn test_rawvideo_encode_and_drain() {
    let mut enc = rawvideo_encoder();
    assert!(matches!(
      enc.receive_packet(),
      Err(Error::InvalidState { .. })
    ));
    enc.open(None).unwrap();

    let mut frame = OwnedFrame::new_video(16, 8, AVPixelFormat::GRAY8, 0).unwrap();
    let mut sizes = Vec::new();
    for pts in 0..3 {
      frame.make_writable().unwrap();
      if let Some(plane) = frame.plane_mut(0) {
        plane.fill(pts as u8);
      }
      frame.set_pts(pts);
      enc
        .encode(Some(&*frame), |pkt| {
          sizes.push(pkt.size());
          Ok::<(), Error>(())
        })
        .unwrap();
    }
    assert_eq!(sizes, vec![128, 128, 128]);

    enc
      .encode(None, |_| Ok::<(), Error>(()))
      .unwrap();
    assert_eq!(enc.state(), CodecState::Flushed);
    assert!(enc.receive_packet().unwrap().is_end_of_stream());
    assert!(matches!(
      enc.send_frame(Some(&*frame)),
      Err(Error::InvalidState { .. })
    ));
  }
}
