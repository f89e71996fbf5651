//! Graph endpoints: buffer sources feed frames in, buffer sinks hand them out

use std::ops::Deref;
use std::ptr::{self, NonNull};

use crate::codec::{Frame, HwFramesContext};
use crate::error::{check, check_config, non_null, outcome, Error, Outcome, Result};
use crate::ffi::{
  accessors::{
    avk_srcpar_free, avk_srcpar_set_format, avk_srcpar_set_height, avk_srcpar_set_hw_frames_ctx,
    avk_srcpar_set_sample_rate, avk_srcpar_set_time_base, avk_srcpar_set_width,
  },
  avfilter::{
    av_buffersink_get_ch_layout, av_buffersink_get_frame, av_buffersink_get_sample_rate,
    av_buffersink_get_time_base, av_buffersrc_add_frame_flags, av_buffersrc_parameters_alloc,
    av_buffersrc_parameters_set,
  },
  AVBufferSrcParameters, AVRational, AV_BUFFERSRC_FLAG_KEEP_REF,
};
use crate::util::ChannelLayout;

use super::{FilterContext, FilterGraph};

fn require_configured(graph: &FilterGraph, op: &'static str) -> Result<()> {
  if graph.is_configured() {
    Ok(())
  } else {
    Err(Error::InvalidState {
      op,
      state: "building",
    })
  }
}

// ============================================================================
// Buffer Source
// ============================================================================

/// A `buffer` or `abuffer` instance, validated
#[derive(Debug, Clone, Copy)]
pub struct BufferSrc<'g> {
  ctx: &'g FilterContext,
  graph: &'g FilterGraph,
}

impl<'g> BufferSrc<'g> {
  /// View `ctx` as a buffer source; any other filter is a `TypeMismatch`
  pub fn new(ctx: &'g FilterContext, graph: &'g FilterGraph) -> Result<Self> {
    match ctx.filter_name() {
      "buffer" | "abuffer" => Ok(Self { ctx, graph }),
      found => Err(Error::TypeMismatch {
        expected: "buffer source",
        found: found.to_string(),
      }),
    }
  }

  pub fn context(&self) -> &'g FilterContext {
    self.ctx
  }

  /// Push `frame` into the graph, taking over its data; `None` ends the stream
  pub fn add_frame(&self, frame: Option<&mut Frame>) -> Result<()> {
    self.push(frame.map_or(ptr::null_mut(), |f| f.as_mut_ptr()), 0)
  }

  /// Push a new reference to `frame`, leaving it untouched
  pub fn add_frame_keep_ref(&self, frame: &Frame) -> Result<()> {
    self.push(frame.as_ptr() as *mut _, AV_BUFFERSRC_FLAG_KEEP_REF)
  }

  fn push(&self, frame: *mut crate::ffi::AVFrame, flags: i32) -> Result<()> {
    const OP: &str = "av_buffersrc_add_frame_flags";
    require_configured(self.graph, OP)?;
    let ret = unsafe { av_buffersrc_add_frame_flags(self.ctx.as_ptr(), frame, flags) };
    check(OP, ret)?;
    Ok(())
  }

  /// Apply stream parameters (hardware frames pool, format, size) before init
  pub fn parameters_set(&self, params: &BufferSrcParameters) -> Result<()> {
    let ret = unsafe { av_buffersrc_parameters_set(self.ctx.as_ptr(), params.ptr.as_ptr()) };
    check_config("av_buffersrc_parameters_set", ret)?;
    Ok(())
  }
}

impl Deref for BufferSrc<'_> {
  type Target = FilterContext;

  fn deref(&self) -> &FilterContext {
    self.ctx
  }
}

// ============================================================================
// Buffer Sink
// ============================================================================

/// A `buffersink` or `abuffersink` instance, validated
#[derive(Debug, Clone, Copy)]
pub struct BufferSink<'g> {
  ctx: &'g FilterContext,
  graph: &'g FilterGraph,
}

impl<'g> BufferSink<'g> {
  pub fn new(ctx: &'g FilterContext, graph: &'g FilterGraph) -> Result<Self> {
    match ctx.filter_name() {
      "buffersink" | "abuffersink" => Ok(Self { ctx, graph }),
      found => Err(Error::TypeMismatch {
        expected: "buffer sink",
        found: found.to_string(),
      }),
    }
  }

  pub fn context(&self) -> &'g FilterContext {
    self.ctx
  }

  /// Pull the next filtered frame into `frame`
  ///
  /// `RetryLater` means the graph needs more input; `EndOfStream` follows
  /// the source's end of stream once everything buffered was returned.
  pub fn get_frame(&self, frame: &mut Frame) -> Result<Outcome<()>> {
    const OP: &str = "av_buffersink_get_frame";
    require_configured(self.graph, OP)?;
    let ret = unsafe { av_buffersink_get_frame(self.ctx.as_ptr(), frame.as_mut_ptr()) };
    Ok(outcome(OP, ret)?.map(|_| ()))
  }

  /// Time base of frames leaving the sink (valid once configured)
  pub fn time_base(&self) -> AVRational {
    unsafe { av_buffersink_get_time_base(self.ctx.as_ptr()) }
  }

  pub fn sample_rate(&self) -> i32 {
    unsafe { av_buffersink_get_sample_rate(self.ctx.as_ptr()) }
  }

  pub fn ch_layout(&self) -> Result<ChannelLayout> {
    let mut layout = ChannelLayout::empty();
    let ret = unsafe { av_buffersink_get_ch_layout(self.ctx.as_ptr(), layout.as_mut_ptr()) };
    check("av_buffersink_get_ch_layout", ret)?;
    Ok(layout)
  }
}

impl Deref for BufferSink<'_> {
  type Target = FilterContext;

  fn deref(&self) -> &FilterContext {
    self.ctx
  }
}

// ============================================================================
// Buffer Source Parameters
// ============================================================================

/// Owned `AVBufferSrcParameters`; fields left unset keep the filter's options
pub struct BufferSrcParameters {
  ptr: NonNull<AVBufferSrcParameters>,
}

impl BufferSrcParameters {
  pub fn new() -> Result<Self> {
    let ptr = unsafe { av_buffersrc_parameters_alloc() };
    Ok(Self {
      ptr: non_null("av_buffersrc_parameters_alloc", ptr)?,
    })
  }

  /// Pixel or sample format as its raw integer value
  pub fn set_format(&mut self, format: i32) -> &mut Self {
    unsafe { avk_srcpar_set_format(self.ptr.as_ptr(), format) };
    self
  }

  pub fn set_width(&mut self, width: i32) -> &mut Self {
    unsafe { avk_srcpar_set_width(self.ptr.as_ptr(), width) };
    self
  }

  pub fn set_height(&mut self, height: i32) -> &mut Self {
    unsafe { avk_srcpar_set_height(self.ptr.as_ptr(), height) };
    self
  }

  pub fn set_sample_rate(&mut self, sample_rate: i32) -> &mut Self {
    unsafe { avk_srcpar_set_sample_rate(self.ptr.as_ptr(), sample_rate) };
    self
  }

  pub fn set_time_base(&mut self, time_base: AVRational) -> &mut Self {
    unsafe { avk_srcpar_set_time_base(self.ptr.as_ptr(), time_base.num, time_base.den) };
    self
  }

  /// Frames entering the source live in `frames`; holds its own reference
  pub fn set_hw_frames_ctx(&mut self, frames: &HwFramesContext) -> Result<&mut Self> {
    let ret = unsafe { avk_srcpar_set_hw_frames_ctx(self.ptr.as_ptr(), frames.as_ptr()) };
    check("av_buffer_ref", ret)?;
    Ok(self)
  }
}

impl Drop for BufferSrcParameters {
  fn drop(&mut self) {
    let mut ptr = self.ptr.as_ptr();
    unsafe { avk_srcpar_free(&mut ptr) };
  }
}

unsafe impl Send for BufferSrcParameters {}

impl std::fmt::Debug for BufferSrcParameters {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BufferSrcParameters").finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::OwnedFrame;
  use crate::filter::Filter;

  fn audio_graph(graph: &FilterGraph) -> (BufferSrc<'_>, BufferSink<'_>) {
    let src = graph
      .create_filter(
        Filter::by_name("abuffer").unwrap(),
        "in",
        Some("sample_rate=48000:sample_fmt=s16:channel_layout=mono:time_base=1/48000"),
      )
      .unwrap();
    let sink = graph
      .create_filter(Filter::by_name("abuffersink").unwrap(), "out", None)
      .unwrap();
    src.link_to(sink).unwrap();
    (
      BufferSrc::new(src, graph).unwrap(),
      graph.buffer_sink(sink).unwrap(),
    )
  }

  #[test]
  fn test_wrong_filter_is_type_mismatch() {
    let graph = FilterGraph::new().unwrap();
    let volume = graph
      .create_filter(Filter::by_name("volume").unwrap(), "gain", None)
      .unwrap();
    let err = BufferSrc::new(volume, &graph).unwrap_err();
    assert!(matches!(
      &err,
      Error::TypeMismatch { expected: "buffer source", found } if found == "volume"
    ));
    assert!(matches!(
      graph.buffer_sink(volume),
      Err(Error::TypeMismatch { .. })
    ));
  }

  #[test]
  fn test_building_graph_refuses_frames() {
    let graph = FilterGraph::new().unwrap();
    let (src, sink) = audio_graph(&graph);
    let mut frame = OwnedFrame::new().unwrap();
    assert!(matches!(
      sink.get_frame(&mut frame),
      Err(Error::InvalidState {
        state: "building",
        ..
      })
    ));
    assert!(matches!(
      src.add_frame(None),
      Err(Error::InvalidState { .. })
    ));
  }

  #[test]
  fn test_empty_configured_graph_retries() {
    let graph = FilterGraph::new().unwrap();
    let (src, sink) = audio_graph(&graph);
    graph.configure().unwrap();
    assert_eq!(sink.sample_rate(), 48000);
    assert_eq!(sink.ch_layout().unwrap().nb_channels(), 1);

    let mut frame = OwnedFrame::new().unwrap();
    assert_eq!(sink.get_frame(&mut frame).unwrap(), Outcome::RetryLater);

    src.add_frame(None).unwrap();
    assert_eq!(sink.get_frame(&mut frame).unwrap(), Outcome::EndOfStream);
  }

  #[test]
  fn test_parameters_alloc() {
    let mut params = BufferSrcParameters::new().unwrap();
    params
      .set_width(64)
      .set_height(32)
      .set_time_base(AVRational { num: 1, den: 25 });
  }
}
