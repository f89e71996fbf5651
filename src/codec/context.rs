//! Safe wrapper around FFmpeg AVCodecContext
//!
//! Holds codec configuration before `open` and the codec's state after it.
//! The push/pull data flow lives in [`Decoder`](super::Decoder) and
//! [`Encoder`](super::Encoder), which own a context each.

use std::ptr::{self, NonNull};

use crate::error::{check, check_config, non_null, Error, Result};
use crate::ffi::{
  accessors::*,
  avcodec::{
    avcodec_alloc_context3, avcodec_free_context, avcodec_is_open, avcodec_open2,
    avcodec_parameters_to_context,
  },
  AVCodecContext, AVCodecID, AVMediaType, AVPixelFormat, AVRational, AVSampleFormat,
};
use crate::format::CodecParameters;
use crate::util::{opts_ptr, ChannelLayout, Dictionary};

use super::{Codec, HwDeviceContext, HwFramesContext};

/// Safe wrapper around AVCodecContext
pub struct CodecContext {
  ptr: NonNull<AVCodecContext>,
  /// Codec the context was allocated for
  codec: Option<Codec>,
}

impl CodecContext {
  /// Allocate a context, with codec defaults when `codec` is given
  pub fn new(codec: Option<Codec>) -> Result<Self> {
    let ptr = unsafe { avcodec_alloc_context3(codec.map_or(ptr::null(), |c| c.as_ptr())) };
    Ok(Self {
      ptr: non_null("avcodec_alloc_context3", ptr)?,
      codec,
    })
  }

  /// Open the codec
  ///
  /// `codec` may be omitted when the context was allocated with one; it must
  /// match that codec otherwise. Options the codec did not consume are left
  /// in `options`.
  pub fn open(&mut self, codec: Option<Codec>, options: Option<&mut Dictionary>) -> Result<()> {
    if self.is_open() {
      return Err(Error::InvalidState {
        op: "avcodec_open2",
        state: "open",
      });
    }
    if let (Some(given), Some(allocated)) = (codec, self.codec) {
      if given != allocated {
        return Err(Error::invalid_argument(
          "avcodec_open2",
          format!(
            "context was allocated for {}, cannot open with {}",
            allocated.name(),
            given.name()
          ),
        ));
      }
    }
    let codec = codec.or(self.codec).ok_or_else(|| {
      Error::invalid_argument("avcodec_open2", "no codec given and none set at allocation")
    })?;

    let ret = unsafe { avcodec_open2(self.as_mut_ptr(), codec.as_ptr(), opts_ptr(options)) };
    check_config("avcodec_open2", ret)?;

    self.codec = Some(codec);
    tracing::debug!(
      codec = codec.name(),
      media_type = ?codec.media_type(),
      encoder = codec.is_encoder(),
      "opened codec context"
    );
    Ok(())
  }

  pub fn is_open(&self) -> bool {
    unsafe { avcodec_is_open(self.ptr.as_ptr()) > 0 }
  }

  /// Codec in use: the opened one, or the one given at allocation
  pub fn codec(&self) -> Option<Codec> {
    unsafe { Codec::from_ptr(avk_ctx_get_codec(self.as_ptr())) }.or(self.codec)
  }

  /// Fill the context from stream parameters (`avcodec_parameters_to_context`)
  pub fn copy_params(&mut self, params: &CodecParameters) -> Result<()> {
    let ret = unsafe { avcodec_parameters_to_context(self.as_mut_ptr(), params.as_ptr()) };
    check("avcodec_parameters_to_context", ret)?;
    Ok(())
  }

  // ========================================================================
  // Hardware
  // ========================================================================

  /// Drive the codec with `device`; the context takes its own reference
  pub fn set_hw_device_ctx(&mut self, device: &HwDeviceContext) -> Result<()> {
    let ret = unsafe { avk_ctx_set_hw_device_ctx(self.as_mut_ptr(), device.as_ptr()) };
    check("av_buffer_ref", ret)?;
    Ok(())
  }

  /// Use `frames` as the surface pool; the context takes its own reference
  pub fn set_hw_frames_ctx(&mut self, frames: &HwFramesContext) -> Result<()> {
    let ret = unsafe { avk_ctx_set_hw_frames_ctx(self.as_mut_ptr(), frames.as_ptr()) };
    check("av_buffer_ref", ret)?;
    Ok(())
  }

  /// Make a decoder negotiate `pix_fmt` and nothing else
  ///
  /// Installs a `get_format` callback; if the decoder does not offer the
  /// format, FFmpeg logs an error and decoding fails.
  pub fn prefer_pix_fmt(&mut self, pix_fmt: AVPixelFormat) {
    unsafe { avk_ctx_set_preferred_pix_fmt(self.as_mut_ptr(), pix_fmt.as_raw()) }
  }

  /// New reference to the surface pool the codec uses, if any
  pub fn hw_frames_ctx(&self) -> Result<Option<HwFramesContext>> {
    HwFramesContext::from_codec_context(self)
  }

  // ========================================================================
  // Video Configuration
  // ========================================================================

  pub fn width(&self) -> i32 {
    unsafe { avk_ctx_get_width(self.as_ptr()) }
  }

  pub fn set_width(&mut self, width: i32) {
    unsafe { avk_ctx_set_width(self.as_mut_ptr(), width) }
  }

  pub fn height(&self) -> i32 {
    unsafe { avk_ctx_get_height(self.as_ptr()) }
  }

  pub fn set_height(&mut self, height: i32) {
    unsafe { avk_ctx_set_height(self.as_mut_ptr(), height) }
  }

  pub fn pix_fmt(&self) -> AVPixelFormat {
    AVPixelFormat(unsafe { avk_ctx_get_pix_fmt(self.as_ptr()) })
  }

  pub fn set_pix_fmt(&mut self, pix_fmt: AVPixelFormat) {
    unsafe { avk_ctx_set_pix_fmt(self.as_mut_ptr(), pix_fmt.as_raw()) }
  }

  pub fn framerate(&self) -> AVRational {
    let (mut num, mut den) = (0, 0);
    unsafe { avk_ctx_get_framerate(self.as_ptr(), &mut num, &mut den) };
    AVRational::new(num, den)
  }

  pub fn set_framerate(&mut self, framerate: AVRational) {
    unsafe { avk_ctx_set_framerate(self.as_mut_ptr(), framerate.num, framerate.den) }
  }

  pub fn gop_size(&self) -> i32 {
    unsafe { avk_ctx_get_gop_size(self.as_ptr()) }
  }

  pub fn set_gop_size(&mut self, gop_size: i32) {
    unsafe { avk_ctx_set_gop_size(self.as_mut_ptr(), gop_size) }
  }

  pub fn max_b_frames(&self) -> i32 {
    unsafe { avk_ctx_get_max_b_frames(self.as_ptr()) }
  }

  pub fn set_max_b_frames(&mut self, max_b_frames: i32) {
    unsafe { avk_ctx_set_max_b_frames(self.as_mut_ptr(), max_b_frames) }
  }

  // ========================================================================
  // Audio Configuration
  // ========================================================================

  pub fn sample_fmt(&self) -> AVSampleFormat {
    AVSampleFormat::from_raw(unsafe { avk_ctx_get_sample_fmt(self.as_ptr()) })
  }

  pub fn set_sample_fmt(&mut self, sample_fmt: AVSampleFormat) {
    unsafe { avk_ctx_set_sample_fmt(self.as_mut_ptr(), sample_fmt.as_raw()) }
  }

  /// Sample format a decoder should output if it can
  pub fn request_sample_fmt(&self) -> AVSampleFormat {
    AVSampleFormat::from_raw(unsafe { avk_ctx_get_request_sample_fmt(self.as_ptr()) })
  }

  pub fn set_request_sample_fmt(&mut self, sample_fmt: AVSampleFormat) {
    unsafe { avk_ctx_set_request_sample_fmt(self.as_mut_ptr(), sample_fmt.as_raw()) }
  }

  pub fn sample_rate(&self) -> i32 {
    unsafe { avk_ctx_get_sample_rate(self.as_ptr()) }
  }

  pub fn set_sample_rate(&mut self, sample_rate: i32) {
    unsafe { avk_ctx_set_sample_rate(self.as_mut_ptr(), sample_rate) }
  }

  pub fn ch_layout(&self) -> Result<ChannelLayout> {
    unsafe { ChannelLayout::copy_from(avk_ctx_get_ch_layout(self.as_ptr())) }
  }

  pub fn set_ch_layout(&mut self, layout: &ChannelLayout) -> Result<()> {
    let ret = unsafe { avk_ctx_set_ch_layout(self.as_mut_ptr(), layout.as_ptr()) };
    check("av_channel_layout_copy", ret)?;
    Ok(())
  }

  /// Samples per channel an audio encoder takes per frame (0 if any)
  pub fn frame_size(&self) -> i32 {
    unsafe { avk_ctx_get_frame_size(self.as_ptr()) }
  }

  // ========================================================================
  // Common Configuration
  // ========================================================================

  pub fn codec_id(&self) -> AVCodecID {
    AVCodecID(unsafe { avk_ctx_get_codec_id(self.as_ptr()) })
  }

  pub fn media_type(&self) -> AVMediaType {
    AVMediaType::from_raw(unsafe { avk_ctx_get_codec_type(self.as_ptr()) })
  }

  pub fn time_base(&self) -> AVRational {
    let (mut num, mut den) = (0, 0);
    unsafe { avk_ctx_get_time_base(self.as_ptr(), &mut num, &mut den) };
    AVRational::new(num, den)
  }

  pub fn set_time_base(&mut self, time_base: AVRational) {
    unsafe { avk_ctx_set_time_base(self.as_mut_ptr(), time_base.num, time_base.den) }
  }

  pub fn bit_rate(&self) -> i64 {
    unsafe { avk_ctx_get_bit_rate(self.as_ptr()) }
  }

  pub fn set_bit_rate(&mut self, bit_rate: i64) {
    unsafe { avk_ctx_set_bit_rate(self.as_mut_ptr(), bit_rate) }
  }

  /// `AV_CODEC_FLAG_*` bits (see [`codec_flag`](crate::ffi::accessors::codec_flag))
  pub fn flags(&self) -> i32 {
    unsafe { avk_ctx_get_flags(self.as_ptr()) }
  }

  pub fn set_flags(&mut self, flags: i32) {
    unsafe { avk_ctx_set_flags(self.as_mut_ptr(), flags) }
  }

  /// Set `flags` in addition to the ones already set
  pub fn add_flags(&mut self, flags: i32) {
    let current = self.flags();
    self.set_flags(current | flags);
  }

  pub fn thread_count(&self) -> i32 {
    unsafe { avk_ctx_get_thread_count(self.as_ptr()) }
  }

  pub fn set_thread_count(&mut self, thread_count: i32) {
    unsafe { avk_ctx_set_thread_count(self.as_mut_ptr(), thread_count) }
  }

  /// Fixed quality for codecs run with `codec_flag::QSCALE`
  pub fn set_global_quality(&mut self, quality: i32) {
    unsafe { avk_ctx_set_global_quality(self.as_mut_ptr(), quality) }
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVCodecContext {
    self.ptr.as_ptr()
  }

  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVCodecContext {
    self.ptr.as_ptr()
  }
}

impl Drop for CodecContext {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      avcodec_free_context(&mut ptr);
    }
  }
}

// CodecContext is NOT Sync - FFmpeg contexts are not thread-safe
unsafe impl Send for CodecContext {}

impl std::fmt::Debug for CodecContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CodecContext")
      .field("codec", &self.codec().map(|c| c.name()))
      .field("open", &self.is_open())
      .field("media_type", &self.media_type())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ffi::accessors::codec_flag;

  #[test]
  fn test_alloc_without_codec() {
    let ctx = CodecContext::new(None).unwrap();
    assert!(!ctx.is_open());
    assert!(ctx.codec().is_none());
  }

  #[test]
  fn test_open_without_any_codec_fails() {
    let mut ctx = CodecContext::new(None).unwrap();
    assert!(matches!(
      ctx.open(None, None),
      Err(Error::Configuration {
        op: "avcodec_open2",
        ..
      })
    ));
  }

  #[test]
  fn test_open_rawvideo_encoder() {
    let codec = Codec::find_encoder(AVCodecID::RAWVIDEO).unwrap();
    let mut ctx = CodecContext::new(Some(codec)).unwrap();
    ctx.set_width(32);
    ctx.set_height(16);
    ctx.set_pix_fmt(AVPixelFormat::RGBA);
    ctx.set_time_base(AVRational::new(1, 25));
    ctx.add_flags(codec_flag::BITEXACT);
    ctx.open(None, None).unwrap();

    assert!(ctx.is_open());
    assert_eq!(ctx.codec().unwrap().name(), "rawvideo");
    assert_eq!(ctx.width(), 32);
    assert_eq!(ctx.media_type(), AVMediaType::Video);
    assert!(ctx.flags() & codec_flag::BITEXACT != 0);

    assert!(matches!(
      ctx.open(None, None),
      Err(Error::InvalidState {
        op: "avcodec_open2",
        ..
      })
    ));
  }

  #[test]
  fn test_open_with_other_codec_rejected() {
    let codec = Codec::find_encoder(AVCodecID::PCM_S16LE).unwrap();
    let mut ctx = CodecContext::new(Some(codec)).unwrap();
    ctx.set_sample_fmt(AVSampleFormat::S16);
    ctx.set_sample_rate(8000);
    ctx.set_ch_layout(&ChannelLayout::default_for(1)).unwrap();
    ctx.set_time_base(AVRational::new(1, 8000));

    let other = Codec::find_encoder_by_name("rawvideo").unwrap();
    assert!(matches!(
      ctx.open(Some(other), None),
      Err(Error::Configuration {
        op: "avcodec_open2",
        ..
      })
    ));
    assert!(!ctx.is_open());

    ctx.open(Some(codec), None).unwrap();
    assert!(ctx.is_open());
  }

  #[test]
  fn test_open_leaves_unknown_options() {
    let codec = Codec::find_encoder(AVCodecID::PCM_S16LE).unwrap();
    let mut ctx = CodecContext::new(Some(codec)).unwrap();
    ctx.set_sample_fmt(AVSampleFormat::S16);
    ctx.set_sample_rate(44100);
    ctx.set_ch_layout(&ChannelLayout::default_for(2)).unwrap();
    ctx.set_time_base(AVRational::new(1, 44100));

    let mut opts = Dictionary::new();
    opts.set("not_an_option", "1").unwrap();
    ctx.open(None, Some(&mut opts)).unwrap();
    assert_eq!(opts.get("not_an_option"), Some("1"));
    assert_eq!(ctx.ch_layout().unwrap().nb_channels(), 2);
  }

  #[test]
  fn test_contexts_move_without_double_free() {
    fn pass(ctx: CodecContext) -> CodecContext {
      ctx
    }
    let contexts: Vec<CodecContext> = (0..3).map(|_| CodecContext::new(None).unwrap()).collect();
    let moved: Vec<_> = contexts.into_iter().map(pass).collect();
    assert_eq!(moved.len(), 3);
  }
}
