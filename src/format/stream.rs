//! Streams and their codec parameters, borrowed from a format context

use crate::codec::{Codec, CodecContext, Decoder, Encoder, Packet};
use crate::error::{check, Result};
use crate::ffi::{
  accessors::{
    avk_par_bit_rate, avk_par_ch_layout, avk_par_codec_id, avk_par_codec_type,
    avk_par_format, avk_par_height, avk_par_sample_rate, avk_par_width,
    avk_stream_attached_pic, avk_stream_codecpar, avk_stream_disposition, avk_stream_duration,
    avk_stream_get_avg_frame_rate, avk_stream_get_time_base, avk_stream_index, avk_stream_metadata,
    avk_stream_nb_frames, avk_stream_set_time_base, avk_stream_start_time,
  },
  avcodec::avcodec_parameters_from_context,
  disposition, AVCodecID, AVCodecParameters, AVMediaType, AVPixelFormat, AVRational,
  AVSampleFormat, AVStream, AV_NOPTS_VALUE,
};
use crate::util::{ChannelLayout, DictionaryRef};

// ============================================================================
// Stream
// ============================================================================

/// One elementary stream of a [`MediaReader`](super::MediaReader) or
/// [`MediaWriter`](super::MediaWriter)
#[repr(transparent)]
pub struct Stream(AVStream);

impl Stream {
  /// # Safety
  /// `ptr` must be a stream of a format context that outlives `'a`.
  pub(crate) unsafe fn from_ptr<'a>(ptr: *const AVStream) -> &'a Stream {
    unsafe { &*(ptr as *const Stream) }
  }

  /// # Safety
  /// As [`Stream::from_ptr`], and not aliased for `'a`.
  pub(crate) unsafe fn from_mut_ptr<'a>(ptr: *mut AVStream) -> &'a mut Stream {
    unsafe { &mut *(ptr as *mut Stream) }
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVStream {
    &self.0
  }

  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVStream {
    &mut self.0
  }

  /// Position of the stream in its container
  pub fn index(&self) -> i32 {
    unsafe { avk_stream_index(self.as_ptr()) }
  }

  pub fn time_base(&self) -> AVRational {
    let mut tb = AVRational::default();
    unsafe { avk_stream_get_time_base(self.as_ptr(), &mut tb.num, &mut tb.den) };
    tb
  }

  /// Muxers may replace this during `write_header`
  pub fn set_time_base(&mut self, time_base: AVRational) {
    unsafe { avk_stream_set_time_base(self.as_mut_ptr(), time_base.num, time_base.den) }
  }

  pub fn avg_frame_rate(&self) -> AVRational {
    let mut rate = AVRational::default();
    unsafe { avk_stream_get_avg_frame_rate(self.as_ptr(), &mut rate.num, &mut rate.den) };
    rate
  }

  /// Duration in stream time base, `None` when the container does not say
  pub fn duration(&self) -> Option<i64> {
    let duration = unsafe { avk_stream_duration(self.as_ptr()) };
    (duration != AV_NOPTS_VALUE).then_some(duration)
  }

  pub fn duration_secs(&self) -> Option<f64> {
    self
      .duration()
      .map(|d| d as f64 * self.time_base().as_f64())
  }

  /// Total audio samples, from the duration and the sample rate
  ///
  /// `None` when the duration is unknown; 0 for streams without a sample rate.
  pub fn nb_samples(&self) -> Option<i64> {
    let rate = f64::from(self.codec_parameters().sample_rate());
    self
      .duration_secs()
      .map(|secs| (secs * rate).round() as i64)
  }

  pub fn start_time(&self) -> Option<i64> {
    let start = unsafe { avk_stream_start_time(self.as_ptr()) };
    (start != AV_NOPTS_VALUE).then_some(start)
  }

  /// Frame count from the container header, 0 when unknown
  pub fn nb_frames(&self) -> i64 {
    unsafe { avk_stream_nb_frames(self.as_ptr()) }
  }

  /// `AV_DISPOSITION_*` bits
  pub fn disposition(&self) -> i32 {
    unsafe { avk_stream_disposition(self.as_ptr()) }
  }

  /// Whether the stream is cover art rather than real video
  pub fn is_attached_pic(&self) -> bool {
    self.disposition() & disposition::ATTACHED_PIC != 0
  }

  /// New reference to the cover art packet of an attached-picture stream
  pub fn attached_pic(&self) -> Result<Option<Packet>> {
    if !self.is_attached_pic() {
      return Ok(None);
    }
    let pkt = unsafe { Packet::ref_from_ptr(avk_stream_attached_pic(self.as_ptr())) }?;
    Ok(Some(pkt))
  }

  pub fn metadata(&self) -> DictionaryRef<'_> {
    unsafe { DictionaryRef::from_ptr(avk_stream_metadata(self.as_ptr())) }
  }

  pub fn codec_parameters(&self) -> &CodecParameters {
    unsafe { CodecParameters::from_ptr(avk_stream_codecpar(self.as_ptr())) }
  }

  /// Decoder for this stream, configured from its parameters
  ///
  /// The decoder is not opened, so callers can still attach a hardware
  /// device or set options.
  pub fn create_decoder(&self) -> Result<Decoder> {
    let params = self.codec_parameters();
    let codec = Codec::find_decoder(params.codec_id())?;
    let mut ctx = CodecContext::new(Some(codec))?;
    ctx.copy_params(params)?;
    ctx.set_time_base(self.time_base());
    if params.media_type() == AVMediaType::Video {
      ctx.set_framerate(self.avg_frame_rate());
    }
    tracing::debug!(
      stream = self.index(),
      codec = codec.name(),
      "created decoder for stream"
    );
    Decoder::from_context(ctx)
  }

  /// Encoder for this stream's codec id, with the stream's time base
  pub fn create_encoder(&self) -> Result<Encoder> {
    let codec = Codec::find_encoder(self.codec_parameters().codec_id())?;
    let mut ctx = CodecContext::new(Some(codec))?;
    ctx.set_time_base(self.time_base());
    Encoder::from_context(ctx)
  }

  /// Set the stream parameters from a codec context
  /// (`avcodec_parameters_from_context`), usually an opened encoder
  pub fn copy_params(&mut self, ctx: &CodecContext) -> Result<()> {
    let par = unsafe { avk_stream_codecpar(self.as_ptr()) };
    let ret = unsafe { avcodec_parameters_from_context(par, ctx.as_ptr()) };
    check("avcodec_parameters_from_context", ret)?;
    Ok(())
  }
}

impl std::fmt::Debug for Stream {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Stream")
      .field("index", &self.index())
      .field("time_base", &self.time_base())
      .field("params", self.codec_parameters())
      .finish()
  }
}

// ============================================================================
// Codec Parameters
// ============================================================================

/// Codec parameters of a stream (`AVCodecParameters`)
#[repr(transparent)]
pub struct CodecParameters(AVCodecParameters);

impl CodecParameters {
  /// # Safety
  /// `ptr` must be valid for `'a`.
  pub(crate) unsafe fn from_ptr<'a>(ptr: *const AVCodecParameters) -> &'a CodecParameters {
    unsafe { &*(ptr as *const CodecParameters) }
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVCodecParameters {
    &self.0
  }

  pub fn codec_id(&self) -> AVCodecID {
    AVCodecID(unsafe { avk_par_codec_id(self.as_ptr()) })
  }

  pub fn media_type(&self) -> AVMediaType {
    AVMediaType::from_raw(unsafe { avk_par_codec_type(self.as_ptr()) })
  }

  pub fn width(&self) -> i32 {
    unsafe { avk_par_width(self.as_ptr()) }
  }

  pub fn height(&self) -> i32 {
    unsafe { avk_par_height(self.as_ptr()) }
  }

  /// Raw format: a pixel format for video, a sample format for audio
  pub fn format(&self) -> i32 {
    unsafe { avk_par_format(self.as_ptr()) }
  }

  pub fn pix_fmt(&self) -> AVPixelFormat {
    AVPixelFormat(self.format())
  }

  pub fn sample_fmt(&self) -> AVSampleFormat {
    AVSampleFormat::from_raw(self.format())
  }

  pub fn sample_rate(&self) -> i32 {
    unsafe { avk_par_sample_rate(self.as_ptr()) }
  }

  pub fn bit_rate(&self) -> i64 {
    unsafe { avk_par_bit_rate(self.as_ptr()) }
  }

  pub fn nb_channels(&self) -> i32 {
    unsafe { (*avk_par_ch_layout(self.as_ptr())).nb_channels }
  }

  pub fn ch_layout(&self) -> Result<ChannelLayout> {
    unsafe { ChannelLayout::copy_from(avk_par_ch_layout(self.as_ptr())) }
  }
}

impl std::fmt::Debug for CodecParameters {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut s = f.debug_struct("CodecParameters");
    s.field("codec_id", &self.codec_id())
      .field("media_type", &self.media_type());
    match self.media_type() {
      AVMediaType::Video => s
        .field("width", &self.width())
        .field("height", &self.height())
        .field("pix_fmt", &self.pix_fmt()),
      AVMediaType::Audio => s
        .field("sample_rate", &self.sample_rate())
        .field("nb_channels", &self.nb_channels())
        .field("sample_fmt", &self.sample_fmt()),
      _ => &mut s,
    };
    s.finish()
  }
}
