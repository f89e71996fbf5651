//! libavfilter function declarations
//!
//! Provides filter graph construction, buffer source and buffer sink
//! functionality.

use super::types::*;
use std::os::raw::{c_char, c_int, c_uint};

unsafe extern "C" {
  // ========================================================================
  // Filter Lookup
  // ========================================================================

  /// Get a filter definition matching the given name, NULL if not found
  pub fn avfilter_get_by_name(name: *const c_char) -> *const AVFilter;

  // ========================================================================
  // Graph Lifecycle
  // ========================================================================

  /// Allocate a filter graph
  pub fn avfilter_graph_alloc() -> *mut AVFilterGraph;

  /// Free a graph, destroy its links, and set the pointer to NULL
  pub fn avfilter_graph_free(graph: *mut *mut AVFilterGraph);

  /// Check validity and configure all the links and formats in the graph
  pub fn avfilter_graph_config(graphctx: *mut AVFilterGraph, log_ctx: *mut std::ffi::c_void)
  -> c_int;

  /// Dump a graph into a human-readable string (free with av_free)
  pub fn avfilter_graph_dump(graph: *mut AVFilterGraph, options: *const c_char) -> *mut c_char;

  // ========================================================================
  // Filter Instances
  // ========================================================================

  /// Create a new filter instance in a filter graph, not yet initialized
  pub fn avfilter_graph_alloc_filter(
    graph: *mut AVFilterGraph,
    filter: *const AVFilter,
    name: *const c_char,
  ) -> *mut AVFilterContext;

  /// Create and add a filter instance into an existing graph, initialized
  /// with `args`
  pub fn avfilter_graph_create_filter(
    filt_ctx: *mut *mut AVFilterContext,
    filt: *const AVFilter,
    name: *const c_char,
    args: *const c_char,
    opaque: *mut std::ffi::c_void,
    graph_ctx: *mut AVFilterGraph,
  ) -> c_int;

  /// Get a filter instance of the graph by its instance name, NULL if absent
  pub fn avfilter_graph_get_filter(
    graph: *mut AVFilterGraph,
    name: *const c_char,
  ) -> *mut AVFilterContext;

  /// Initialize a filter with the supplied "key=value:key2=value2" string
  pub fn avfilter_init_str(ctx: *mut AVFilterContext, args: *const c_char) -> c_int;

  /// Initialize a filter with the supplied dictionary of options
  ///
  /// Options not consumed by the filter are left in the dictionary.
  pub fn avfilter_init_dict(ctx: *mut AVFilterContext, options: *mut *mut AVDictionary) -> c_int;

  /// Link two filters together
  pub fn avfilter_link(
    src: *mut AVFilterContext,
    srcpad: c_uint,
    dst: *mut AVFilterContext,
    dstpad: c_uint,
  ) -> c_int;

  // ========================================================================
  // Graph Parsing
  // ========================================================================

  /// Add a graph described by a string to a graph
  ///
  /// `inputs`/`outputs` receive the unlinked pads; free them with
  /// avfilter_inout_free.
  pub fn avfilter_graph_parse2(
    graph: *mut AVFilterGraph,
    filters: *const c_char,
    inputs: *mut *mut AVFilterInOut,
    outputs: *mut *mut AVFilterInOut,
  ) -> c_int;

  /// Free the supplied list of AVFilterInOut and set the pointer to NULL
  pub fn avfilter_inout_free(inout: *mut *mut AVFilterInOut);

  // ========================================================================
  // Buffer Source
  // ========================================================================

  /// Add a frame to the buffer source (NULL marks end of stream)
  ///
  /// Without AV_BUFFERSRC_FLAG_KEEP_REF the frame's references are moved
  /// into the graph and the frame is reset.
  pub fn av_buffersrc_add_frame_flags(
    buffer_src: *mut AVFilterContext,
    frame: *mut AVFrame,
    flags: c_int,
  ) -> c_int;

  /// Allocate a new AVBufferSrcParameters instance (free with av_free)
  pub fn av_buffersrc_parameters_alloc() -> *mut AVBufferSrcParameters;

  /// Initialize the buffersrc or abuffersrc filter with the provided parameters
  ///
  /// Takes a new reference to `hw_frames_ctx` when set.
  pub fn av_buffersrc_parameters_set(
    ctx: *mut AVFilterContext,
    param: *mut AVBufferSrcParameters,
  ) -> c_int;

  // ========================================================================
  // Buffer Sink
  // ========================================================================

  /// Get a frame with filtered data from the sink and put it in frame
  ///
  /// # Returns
  /// 0 on success, AVERROR(EAGAIN) if no frame is ready yet, AVERROR_EOF when
  /// no more frames will be produced
  pub fn av_buffersink_get_frame(ctx: *mut AVFilterContext, frame: *mut AVFrame) -> c_int;

  /// Time base of the sink input link
  pub fn av_buffersink_get_time_base(ctx: *const AVFilterContext) -> AVRational;

  /// Sample rate of the sink input link
  pub fn av_buffersink_get_sample_rate(ctx: *const AVFilterContext) -> c_int;

  /// Copy the channel layout of the sink input link into ch_layout
  pub fn av_buffersink_get_ch_layout(
    ctx: *const AVFilterContext,
    ch_layout: *mut AVChannelLayout,
  ) -> c_int;
}
