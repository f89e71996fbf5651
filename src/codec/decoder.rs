//! Decoder: packets in, frames out
//!
//! Wraps the `avcodec_send_packet`/`avcodec_receive_frame` pair with an
//! explicit lifecycle. Frames are received into one buffer the decoder owns
//! and lends out until the next receive.

use std::ops::{Deref, DerefMut};

use crate::error::{outcome, Error, Outcome, Result};
use crate::ffi::avcodec::{avcodec_flush_buffers, avcodec_receive_frame, avcodec_send_packet};
use crate::util::Dictionary;

use super::{Codec, CodecContext, CodecState, Frame, OwnedFrame, Packet, Stage};

/// Decoding codec context
pub struct Decoder {
  ctx: CodecContext,
  frame: OwnedFrame,
  stage: Stage,
}

impl Decoder {
  /// Allocate a decoder context for `codec`
  pub fn new(codec: Codec) -> Result<Self> {
    if !codec.is_decoder() {
      return Err(Error::invalid_argument(
        "avcodec_alloc_context3",
        format!("{} is not a decoder", codec.name()),
      ));
    }
    Self::from_context(CodecContext::new(Some(codec))?)
  }

  /// Take over an allocated (possibly already open) context
  pub fn from_context(ctx: CodecContext) -> Result<Self> {
    Ok(Self {
      ctx,
      frame: OwnedFrame::new()?,
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

  /// Feed one packet, or `None` (or a blank packet) to signal end of input
  ///
  /// `RetryLater` means frames must be received before this packet is
  /// accepted; `EndOfStream` means the decoder was already fully drained.
  pub fn send_packet(&mut self, packet: Option<&Packet>) -> Result<Outcome<()>> {
    match self.state() {
      CodecState::Unopened => {
        return Err(Error::InvalidState {
          op: "avcodec_send_packet",
          state: "unopened",
        })
      }
      CodecState::Draining | CodecState::Flushed => {
        return Err(Error::InvalidState {
          op: "avcodec_send_packet",
          state: "draining",
        })
      }
      CodecState::Open => {}
    }

    let pkt = packet.map_or(std::ptr::null(), Packet::as_ptr);
    let result = outcome("avcodec_send_packet", unsafe {
      avcodec_send_packet(self.ctx.as_mut_ptr(), pkt)
    })?;
    // A blank packet is a flush packet to libavcodec.
    if packet.is_none_or(Packet::is_empty) && result.is_ready() {
      tracing::trace!("decoder draining");
      self.stage = Stage::Draining;
    }
    Ok(result.map(|_| ()))
  }

  /// Pull the next decoded frame
  ///
  /// The frame stays valid until the next call that touches the decoder.
  pub fn receive_frame(&mut self) -> Result<Outcome<&mut Frame>> {
    match self.state() {
      CodecState::Unopened => {
        return Err(Error::InvalidState {
          op: "avcodec_receive_frame",
          state: "unopened",
        })
      }
      CodecState::Flushed => return Ok(Outcome::EndOfStream),
      CodecState::Open | CodecState::Draining => {}
    }

    let ret = unsafe { avcodec_receive_frame(self.ctx.as_mut_ptr(), self.frame.as_mut_ptr()) };
    match outcome("avcodec_receive_frame", ret)? {
      Outcome::Ready(_) => Ok(Outcome::Ready(&mut *self.frame)),
      Outcome::RetryLater => Ok(Outcome::RetryLater),
      Outcome::EndOfStream => {
        self.stage = Stage::Flushed;
        Ok(Outcome::EndOfStream)
      }
    }
  }

  /// Send `packet` (or end of input) and hand every frame it yields to `f`
  ///
  /// Frames already pending are drained first when the decoder is full.
  pub fn decode<F, E>(&mut self, packet: Option<&Packet>, mut f: F) -> std::result::Result<(), E>
  where
    F: FnMut(&mut Frame) -> std::result::Result<(), E>,
    E: From<Error>,
  {
    loop {
      match self.send_packet(packet)? {
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

  /// Receive until the decoder wants input; false once it is flushed
  fn drain_into<F, E>(&mut self, f: &mut F) -> std::result::Result<bool, E>
  where
    F: FnMut(&mut Frame) -> std::result::Result<(), E>,
    E: From<Error>,
  {
    loop {
      match self.receive_frame()? {
        Outcome::Ready(frame) => f(frame)?,
        Outcome::RetryLater => return Ok(true),
        Outcome::EndOfStream => return Ok(false),
      }
    }
  }

  /// Drop buffered data and accept input again (after a seek)
  pub fn flush(&mut self) -> Result<()> {
    if !self.ctx.is_open() {
      return Err(Error::InvalidState {
        op: "avcodec_flush_buffers",
        state: "unopened",
      });
    }
    unsafe { avcodec_flush_buffers(self.ctx.as_mut_ptr()) };
    self.frame.unref();
    self.stage = Stage::Running;
    Ok(())
  }

  pub fn into_context(self) -> CodecContext {
    self.ctx
  }
}

impl Deref for Decoder {
  type Target = CodecContext;

  fn deref(&self) -> &CodecContext {
    &self.ctx
  }
}

impl DerefMut for Decoder {
  fn deref_mut(&mut self) -> &mut CodecContext {
    &mut self.ctx
  }
}

impl std::fmt::Debug for Decoder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Decoder")
      .field("codec", &self.ctx.codec().map(|c| c.name()))
      .field("state", &self.state())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ffi::{AVCodecID, AVRational, AVSampleFormat};
  use crate::util::ChannelLayout;

  fn pcm_decoder() -> Decoder {
    let codec = Codec::find_decoder(AVCodecID::PCM_S16LE).unwrap();
    let mut dec = Decoder::new(codec).unwrap();
    dec.set_sample_rate(8000);
    dec.set_ch_layout(&ChannelLayout::default_for(1)).unwrap();
    dec.set_time_base(AVRational::new(1, 8000));
    dec
  }

  #[test]
  fn test_unopened_rejects_io() {
    let mut dec = pcm_decoder();
    assert_eq!(dec.state(), CodecState::Unopened);
    assert!(matches!(
      dec.send_packet(None),
      Err(Error::InvalidState { .. })
    ));
    assert!(matches!(
      dec.receive_frame(),
      Err(Error::InvalidState { .. })
    ));
  }

  #[test]
  fn test_encoder_codec_rejected() {
    let codec = Codec::find_encoder(AVCodecID::PCM_S16LE).unwrap();
    assert!(Decoder::new(codec).is_err());
  }

  #[test]
  fn test_decode_pcm_then_drain() {
    let mut dec = pcm_decoder();
    dec.open(None).unwrap();
    assert_eq!(dec.state(), CodecState::Open);

    let samples: Vec<u8> = (0..160i16).flat_map(|s| (s * 100).to_le_bytes()).collect();
    let mut pkt = Packet::from_slice(&samples).unwrap();
    pkt.set_pts(0);

    let mut decoded = 0;
    dec
      .decode(Some(&pkt), |frame| {
        assert_eq!(frame.sample_fmt(), AVSampleFormat::S16);
        decoded += frame.nb_samples();
        Ok::<(), Error>(())
      })
      .unwrap();
    assert_eq!(decoded, 160);

    assert_eq!(dec.send_packet(None).unwrap(), Outcome::Ready(()));
    assert_eq!(dec.state(), CodecState::Draining);
    assert!(matches!(
      dec.send_packet(Some(&pkt)),
      Err(Error::InvalidState { .. })
    ));

    assert!(dec.receive_frame().unwrap().is_end_of_stream());
    assert_eq!(dec.state(), CodecState::Flushed);
    for _ in 0..3 {
      assert!(dec.receive_frame().unwrap().is_end_of_stream());
    }

    dec.flush().unwrap();
    assert_eq!(dec.state(), CodecState::Open);
    assert!(dec.receive_frame().unwrap().is_retry_later());
  }

  #[test]
  fn test_blank_packet_starts_draining() {
    let mut dec = pcm_decoder();
    dec.open(None).unwrap();

    let blank = Packet::new().unwrap();
    assert_eq!(dec.send_packet(Some(&blank)).unwrap(), Outcome::Ready(()));
    assert_eq!(dec.state(), CodecState::Draining);

    let pkt = Packet::from_slice(&[0u8; 32]).unwrap();
    assert!(matches!(
      dec.send_packet(Some(&pkt)),
      Err(Error::InvalidState {
        op: "avcodec_send_packet",
        ..
      })
    ));
    assert!(dec.receive_frame().unwrap().is_end_of_stream());
    assert_eq!(dec.state(), CodecState::Flushed);
  }
}
