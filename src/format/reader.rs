//! Demuxing: an opened input container

use std::ptr::{self, NonNull};

use crate::codec::{Codec, Packet};
use crate::error::{check, check_config, outcome, Error, Outcome, Result};
use crate::ffi::{
  accessors::{avk_fmt_duration, avk_fmt_iformat_name, avk_fmt_metadata, avk_fmt_nb_streams, avk_fmt_stream},
  avformat::{
    av_dump_format, av_find_best_stream, av_read_frame, av_seek_frame, avformat_close_input,
    avformat_find_stream_info, avformat_open_input, avformat_seek_file,
  },
  avutil::static_str,
  AVCodec, AVFormatContext, AVMediaType, AV_NOPTS_VALUE,
};
use crate::util::{cstring, opts_ptr, Dictionary, DictionaryRef};

use super::Stream;

/// Input container opened with `avformat_open_input`
///
/// Stream information is probed on open, so [`MediaReader::streams`] is
/// complete right away.
pub struct MediaReader {
  ptr: NonNull<AVFormatContext>,
  url: String,
}

impl MediaReader {
  /// Open `url` (a path or any protocol FFmpeg supports)
  pub fn open(url: &str) -> Result<Self> {
    Self::open_with(url, None)
  }

  /// Open `url` with demuxer/protocol options
  ///
  /// Options the demuxer did not consume are left in `options`.
  pub fn open_with(url: &str, options: Option<&mut Dictionary>) -> Result<Self> {
    let c_url = cstring("avformat_open_input", url)?;
    let mut ctx: *mut AVFormatContext = ptr::null_mut();
    let ret =
      unsafe { avformat_open_input(&mut ctx, c_url.as_ptr(), ptr::null(), opts_ptr(options)) };
    // avformat_open_input frees the context itself on failure
    check_config("avformat_open_input", ret)?;

    let reader = Self {
      ptr: NonNull::new(ctx).ok_or(Error::Allocation {
        op: "avformat_open_input",
      })?,
      url: url.to_string(),
    };

    let ret = unsafe { avformat_find_stream_info(reader.ptr.as_ptr(), ptr::null_mut()) };
    check("avformat_find_stream_info", ret)?;

    tracing::debug!(
      url,
      format = reader.format_name().unwrap_or("?"),
      streams = reader.nb_streams(),
      duration_us = reader.duration().unwrap_or(-1),
      "opened input"
    );
    Ok(reader)
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

  /// Short name of the detected demuxer ("mov,mp4,m4a,3gp,3g2,mj2", "matroska,webm", ...)
  pub fn format_name(&self) -> Option<&'static str> {
    unsafe { static_str(avk_fmt_iformat_name(self.as_ptr())) }
  }

  // ========================================================================
  // Streams
  // ========================================================================

  pub fn nb_streams(&self) -> usize {
    unsafe { avk_fmt_nb_streams(self.as_ptr()) as usize }
  }

  pub fn stream(&self, index: usize) -> Option<&Stream> {
    if index >= self.nb_streams() {
      return None;
    }
    Some(unsafe { Stream::from_ptr(avk_fmt_stream(self.as_ptr(), index as u32)) })
  }

  pub fn streams(&self) -> impl Iterator<Item = &Stream> + '_ {
    (0..self.nb_streams()).filter_map(move |i| self.stream(i))
  }

  /// The stream FFmpeg considers best for `media_type`
  pub fn find_best_stream(&self, media_type: AVMediaType) -> Result<&Stream> {
    let ret = unsafe {
      av_find_best_stream(
        self.ptr.as_ptr(),
        media_type.as_raw(),
        -1,
        -1,
        ptr::null_mut(),
        0,
      )
    };
    let index = check("av_find_best_stream", ret)?;
    self.stream_at("av_find_best_stream", index)
  }

  /// The best stream of `media_type` that has a decoder, with that decoder
  pub fn find_best_stream_with_decoder(&self, media_type: AVMediaType) -> Result<(&Stream, Codec)> {
    let mut decoder: *const AVCodec = ptr::null();
    let ret = unsafe {
      av_find_best_stream(
        self.ptr.as_ptr(),
        media_type.as_raw(),
        -1,
        -1,
        &mut decoder,
        0,
      )
    };
    let index = check("av_find_best_stream", ret)?;
    let stream = self.stream_at("av_find_best_stream", index)?;
    let codec = unsafe { Codec::from_ptr(decoder) }
      .ok_or_else(|| Error::not_found("av_find_best_stream", "decoder"))?;
    Ok((stream, codec))
  }

  fn stream_at(&self, op: &'static str, index: i32) -> Result<&Stream> {
    self
      .stream(index as usize)
      .ok_or_else(|| Error::not_found(op, format!("stream {}", index)))
  }

  // ========================================================================
  // Container Information
  // ========================================================================

  pub fn metadata(&self) -> DictionaryRef<'_> {
    unsafe { DictionaryRef::from_ptr(avk_fmt_metadata(self.as_ptr())) }
  }

  /// Container duration in microseconds
  pub fn duration(&self) -> Option<i64> {
    let duration = unsafe { avk_fmt_duration(self.as_ptr()) };
    (duration != AV_NOPTS_VALUE).then_some(duration)
  }

  /// Print the container layout through the FFmpeg log
  pub fn dump(&self) -> Result<()> {
    self.dump_stream(0)
  }

  /// Like [`MediaReader::dump`], headed `Input #index`
  pub fn dump_stream(&self, index: i32) -> Result<()> {
    if index < 0 {
      return Err(Error::invalid_argument(
        "av_dump_format",
        format!("negative index {index}"),
      ));
    }
    let c_url = cstring("av_dump_format", &self.url)?;
    unsafe { av_dump_format(self.ptr.as_ptr(), index, c_url.as_ptr(), 0) };
    Ok(())
  }

  // ========================================================================
  // Reading and Seeking
  // ========================================================================

  /// Read the next packet of any stream into `packet`
  ///
  /// `packet` is unreferenced first. `EndOfStream` at the end of input.
  pub fn read_packet(&mut self, packet: &mut Packet) -> Result<Outcome<()>> {
    packet.unref();
    let ret = unsafe { av_read_frame(self.ptr.as_ptr(), packet.as_mut_ptr()) };
    Ok(outcome("av_read_frame", ret)?.map(|_| ()))
  }

  /// Seek to the keyframe at `timestamp` (`seek_flag::*` bits in `flags`)
  ///
  /// `stream_index` -1 means `timestamp` is in microseconds.
  pub fn seek_frame(&mut self, stream_index: i32, timestamp: i64, flags: i32) -> Result<()> {
    let ret = unsafe { av_seek_frame(self.ptr.as_ptr(), stream_index, timestamp, flags) };
    check("av_seek_frame", ret)?;
    Ok(())
  }

  /// Seek to a position within `[min_ts, max_ts]`, as close to `ts` as possible
  pub fn seek_file(
    &mut self,
    stream_index: i32,
    min_ts: i64,
    ts: i64,
    max_ts: i64,
    flags: i32,
  ) -> Result<()> {
    let ret =
      unsafe { avformat_seek_file(self.ptr.as_ptr(), stream_index, min_ts, ts, max_ts, flags) };
    check("avformat_seek_file", ret)?;
    Ok(())
  }
}

impl Drop for MediaReader {
  fn drop(&mut self) {
    let mut ptr = self.ptr.as_ptr();
    unsafe { avformat_close_input(&mut ptr) };
  }
}

unsafe impl Send for MediaReader {}

impl std::fmt::Debug for MediaReader {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MediaReader")
      .field("url", &self.url)
      .field("format", &self.format_name())
      .field("nb_streams", &self.nb_streams())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_open_missing_file() {
    let err = MediaReader::open("/nonexistent/input.mkv").unwrap_err();
    assert_eq!(err.op(), "avformat_open_input");
    assert!(err.code().is_some());
  }

  #[test]
  fn test_interior_nul_rejected() {
    assert!(matches!(
      MediaReader::open("bad\0path"),
      Err(Error::Configuration { .. })
    ));
  }
}
