//! Muxing: an output container being written

use std::ptr::{self, NonNull};

use crate::codec::{Codec, Packet};
use crate::error::{check, check_config, non_null, Error, Result};
use crate::ffi::{
  accessors::{avk_fmt_nb_streams, avk_fmt_oformat_flags, avk_fmt_oformat_name, avk_fmt_pb, avk_fmt_stream},
  avformat::{
    av_dump_format, av_interleaved_write_frame, av_write_trailer, avformat_alloc_output_context2,
    avformat_free_context, avformat_new_stream, avformat_write_header, avio_closep, avio_open,
  },
  avutil::static_str,
  AVFormatContext, AVFMT_GLOBALHEADER, AVFMT_NOFILE, AVIO_FLAG_WRITE,
};
use crate::util::{cstring, opts_ptr, Dictionary};

use super::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
  /// Streams may be added
  Created,
  HeaderWritten,
  TrailerWritten,
}

/// Output container allocated with `avformat_alloc_output_context2`
pub struct MediaWriter {
  ptr: NonNull<AVFormatContext>,
  url: String,
  state: WriterState,
  /// Whether we opened `pb` and must close it
  owns_io: bool,
}

impl MediaWriter {
  /// Allocate a writer, guessing the container from the file name
  pub fn create(url: &str) -> Result<Self> {
    Self::alloc(url, None)
  }

  /// Allocate a writer for an explicit container ("mp4", "matroska", "h264", ...)
  pub fn create_with_format(url: &str, format: &str) -> Result<Self> {
    Self::alloc(url, Some(format))
  }

  fn alloc(url: &str, format: Option<&str>) -> Result<Self> {
    const OP: &str = "avformat_alloc_output_context2";
    let c_url = cstring(OP, url)?;
    let c_format = format.map(|f| cstring(OP, f)).transpose()?;

    let mut ctx: *mut AVFormatContext = ptr::null_mut();
    let ret = unsafe {
      avformat_alloc_output_context2(
        &mut ctx,
        ptr::null(),
        c_format.as_ref().map_or(ptr::null(), |f| f.as_ptr()),
        c_url.as_ptr(),
      )
    };
    check_config(OP, ret)?;

    Ok(Self {
      ptr: non_null(OP, ctx)?,
      url: url.to_string(),
      state: WriterState::Created,
      owns_io: false,
    })
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVFormatContext {
    self.ptr.as_ptr()
  }

  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVFormatContext {
    self.ptr.as_ptr()
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  pub fn format_name(&self) -> Option<&'static str> {
    unsafe { static_str(avk_fmt_oformat_name(self.as_ptr())) }
  }

  /// Whether encoders feeding this container must set the global header flag
  pub fn needs_global_header(&self) -> bool {
    unsafe { avk_fmt_oformat_flags(self.as_ptr()) & AVFMT_GLOBALHEADER != 0 }
  }

  pub fn is_header_written(&self) -> bool {
    self.state != WriterState::Created
  }

  // ========================================================================
  // Streams
  // ========================================================================

  /// Add a stream; parameters are usually filled with [`Stream::copy_params`]
  pub fn new_stream(&mut self, codec: Option<Codec>) -> Result<&mut Stream> {
    if self.state != WriterState::Created {
      return Err(Error::InvalidState {
        op: "avformat_new_stream",
        state: "header written",
      });
    }
    let raw = unsafe {
      avformat_new_stream(
        self.ptr.as_ptr(),
        codec.map_or(ptr::null(), |c| c.as_ptr()),
      )
    };
    let raw = non_null("avformat_new_stream", raw)?;
    Ok(unsafe { Stream::from_mut_ptr(raw.as_ptr()) })
  }

  pub fn nb_streams(&self) -> usize {
    unsafe { avk_fmt_nb_streams(self.as_ptr()) as usize }
  }

  pub fn stream(&self, index: usize) -> Option<&Stream> {
    if index >= self.nb_streams() {
      return None;
    }
    Some(unsafe { Stream::from_ptr(avk_fmt_stream(self.as_ptr(), index as u32)) })
  }

  pub fn stream_mut(&mut self, index: usize) -> Option<&mut Stream> {
    if index >= self.nb_streams() {
      return None;
    }
    Some(unsafe { Stream::from_mut_ptr(avk_fmt_stream(self.as_ptr(), index as u32)) })
  }

  // ========================================================================
  // Writing
  // ========================================================================

  /// Open the output file if the container needs one, then write the header
  ///
  /// Stream time bases may be changed by the muxer here; rescale packets to
  /// [`Stream::time_base`] read after this call.
  pub fn write_header(&mut self, options: Option<&mut Dictionary>) -> Result<()> {
    if self.state != WriterState::Created {
      return Err(Error::InvalidState {
        op: "avformat_write_header",
        state: "header written",
      });
    }

    let nofile = unsafe { avk_fmt_oformat_flags(self.as_ptr()) } & AVFMT_NOFILE != 0;
    if !nofile && !self.owns_io {
      let c_url = cstring("avio_open", &self.url)?;
      let ret = unsafe { avio_open(avk_fmt_pb(self.ptr.as_ptr()), c_url.as_ptr(), AVIO_FLAG_WRITE) };
      check_config("avio_open", ret)?;
      self.owns_io = true;
    }

    let ret = unsafe { avformat_write_header(self.ptr.as_ptr(), opts_ptr(options)) };
    check_config("avformat_write_header", ret)?;
    self.state = WriterState::HeaderWritten;

    tracing::debug!(
      url = %self.url,
      format = self.format_name().unwrap_or("?"),
      streams = self.nb_streams(),
      "wrote container header"
    );
    Ok(())
  }

  /// Interleave and write `packet`, whose stream index and timestamps must
  /// already be set in the stream's time base
  ///
  /// The packet's data reference is taken over; `packet` is left blank.
  pub fn write_packet(&mut self, packet: &mut Packet) -> Result<()> {
    self.require_header("av_interleaved_write_frame")?;
    let ret = unsafe { av_interleaved_write_frame(self.ptr.as_ptr(), packet.as_mut_ptr()) };
    check("av_interleaved_write_frame", ret)?;
    Ok(())
  }

  /// Flush interleaving queues and write the trailer
  pub fn write_trailer(&mut self) -> Result<()> {
    self.require_header("av_write_trailer")?;
    let ret = unsafe { av_write_trailer(self.ptr.as_ptr()) };
    // The muxer is torn down whatever `ret` says; never call it twice.
    self.state = WriterState::TrailerWritten;
    check("av_write_trailer", ret)?;
    tracing::debug!(url = %self.url, "wrote container trailer");
    Ok(())
  }

  fn require_header(&self, op: &'static str) -> Result<()> {
    match self.state {
      WriterState::HeaderWritten => Ok(()),
      WriterState::Created => Err(Error::InvalidState {
        op,
        state: "header not written",
      }),
      WriterState::TrailerWritten => Err(Error::InvalidState {
        op,
        state: "trailer written",
      }),
    }
  }

  /// Print the container layout through the FFmpeg log
  pub fn dump(&self) -> Result<()> {
    let c_url = cstring("av_dump_format", &self.url)?;
    unsafe { av_dump_format(self.ptr.as_ptr(), 0, c_url.as_ptr(), 1) };
    Ok(())
  }
}

impl Drop for MediaWriter {
  fn drop(&mut self) {
    if self.state == WriterState::HeaderWritten {
      if let Err(e) = self.write_trailer() {
        tracing::warn!(url = %self.url, error = %e, "failed to write trailer on drop");
      }
    }
    unsafe {
      if self.owns_io {
        avio_closep(avk_fmt_pb(self.ptr.as_ptr()));
      }
      avformat_free_context(self.ptr.as_ptr());
    }
  }
}

unsafe impl Send for MediaWriter {}

impl std::fmt::Debug for MediaWriter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MediaWriter")
      .field("url", &self.url)
      .field("format", &self.format_name())
      .field("state", &self.state)
      .field("nb_streams", &self.nb_streams())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_guessed_from_name() {
    let writer = MediaWriter::create("out.mkv").unwrap();
    assert_eq!(writer.format_name(), Some("matroska"));
    assert!(!writer.is_header_written());
  }

  #[test]
  fn test_unknown_format() {
    assert!(matches!(
      MediaWriter::create_with_format("out.bin", "no_such_muxer"),
      Err(Error::Configuration { .. })
    ));
  }

  #[test]
  fn test_packets_before_header_rejected() {
    let mut writer = MediaWriter::create_with_format("unused", "null").unwrap();
    let mut pkt = Packet::new().unwrap();
    assert!(matches!(
      writer.write_packet(&mut pkt),
      Err(Error::InvalidState { .. })
    ));
    assert!(matches!(
      writer.write_trailer(),
      Err(Error::InvalidState { .. })
    ));
  }

  #[test]
  fn test_trailer_written_once() {
    let mut enc = crate::codec::Encoder::by_name("rawvideo").unwrap();
    enc.set_width(4);
    enc.set_height(4);
    enc.set_pix_fmt(crate::ffi::AVPixelFormat::GRAY8);
    enc.set_time_base(crate::ffi::AVRational::new(1, 25));
    enc.open(None).unwrap();

    let mut writer = MediaWriter::create_with_format("unused", "null").unwrap();
    writer.new_stream(None).unwrap().copy_params(&enc).unwrap();
    writer.write_header(None).unwrap();
    writer.write_trailer().unwrap();
    assert!(matches!(
      writer.write_trailer(),
      Err(Error::InvalidState {
        op: "av_write_trailer",
        ..
      })
    ));
  }

  #[test]
  fn test_stream_lookup() {
    let mut writer = MediaWriter::create_with_format("unused", "null").unwrap();
    assert!(writer.stream(0).is_none());
    let index = writer.new_stream(None).unwrap().index();
    assert_eq!(index, 0);
    assert_eq!(writer.nb_streams(), 1);
    assert!(writer.stream_mut(0).is_some());
  }
}
