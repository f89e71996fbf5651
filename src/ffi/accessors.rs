//! Field access through `accessors.c`
//!
//! The FFmpeg structs stay opaque on the Rust side, so each field the
//! wrappers touch has a small C function that reads or writes it. Rationals
//! travel as separate `num`/`den` integers.

use super::types::*;
use std::os::raw::{c_char, c_int, c_uint};

/// Receives one formatted av_log line
pub type LogForwardFn = unsafe extern "C" fn(level: c_int, line: *const c_char);

// ----------------------------------------------------------------------------
// Codec contexts, codecs, hardware configs
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn avk_ctx_get_codec(ctx: *const AVCodecContext) -> *const AVCodec;
  pub fn avk_ctx_get_codec_id(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_get_codec_type(ctx: *const AVCodecContext) -> c_int;

  pub fn avk_ctx_get_width(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_width(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_get_height(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_height(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_get_pix_fmt(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_pix_fmt(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_set_preferred_pix_fmt(ctx: *mut AVCodecContext, value: c_int);

  pub fn avk_ctx_get_sample_fmt(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_sample_fmt(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_get_request_sample_fmt(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_request_sample_fmt(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_get_sample_rate(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_sample_rate(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_get_frame_size(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_get_ch_layout(ctx: *const AVCodecContext) -> *const AVChannelLayout;
  /// Deep copy; returns an AVERROR on allocation failure
  pub fn avk_ctx_set_ch_layout(ctx: *mut AVCodecContext, layout: *const AVChannelLayout) -> c_int;

  pub fn avk_ctx_get_bit_rate(ctx: *const AVCodecContext) -> i64;
  pub fn avk_ctx_set_bit_rate(ctx: *mut AVCodecContext, value: i64);
  pub fn avk_ctx_get_gop_size(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_gop_size(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_get_max_b_frames(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_max_b_frames(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_get_flags(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_flags(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_get_thread_count(ctx: *const AVCodecContext) -> c_int;
  pub fn avk_ctx_set_thread_count(ctx: *mut AVCodecContext, value: c_int);
  pub fn avk_ctx_set_global_quality(ctx: *mut AVCodecContext, value: c_int);

  pub fn avk_ctx_get_time_base(ctx: *const AVCodecContext, num: *mut c_int, den: *mut c_int);
  pub fn avk_ctx_set_time_base(ctx: *mut AVCodecContext, num: c_int, den: c_int);
  pub fn avk_ctx_get_framerate(ctx: *const AVCodecContext, num: *mut c_int, den: *mut c_int);
  pub fn avk_ctx_set_framerate(ctx: *mut AVCodecContext, num: c_int, den: c_int);

  /// The context takes a new reference to `device`
  pub fn avk_ctx_set_hw_device_ctx(ctx: *mut AVCodecContext, device: *mut AVBufferRef) -> c_int;
  /// The context takes a new reference to `frames`
  pub fn avk_ctx_set_hw_frames_ctx(ctx: *mut AVCodecContext, frames: *mut AVBufferRef) -> c_int;
  /// Borrowed; NULL when no frames pool is attached
  pub fn avk_ctx_get_hw_frames_ctx(ctx: *const AVCodecContext) -> *mut AVBufferRef;

  pub fn avk_codec_name(codec: *const AVCodec) -> *const c_char;
  pub fn avk_codec_long_name(codec: *const AVCodec) -> *const c_char;
  pub fn avk_codec_id(codec: *const AVCodec) -> c_int;
  pub fn avk_codec_type(codec: *const AVCodec) -> c_int;

  pub fn avk_hwcfg_pix_fmt(cfg: *const AVCodecHWConfig) -> c_int;
  pub fn avk_hwcfg_methods(cfg: *const AVCodecHWConfig) -> c_int;
  pub fn avk_hwcfg_device_type(cfg: *const AVCodecHWConfig) -> c_int;
}

// ----------------------------------------------------------------------------
// Frames and packets
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn avk_frame_get_width(frame: *const AVFrame) -> c_int;
  pub fn avk_frame_set_width(frame: *mut AVFrame, value: c_int);
  pub fn avk_frame_get_height(frame: *const AVFrame) -> c_int;
  pub fn avk_frame_set_height(frame: *mut AVFrame, value: c_int);
  pub fn avk_frame_get_format(frame: *const AVFrame) -> c_int;
  pub fn avk_frame_set_format(frame: *mut AVFrame, value: c_int);
  pub fn avk_frame_get_pts(frame: *const AVFrame) -> i64;
  pub fn avk_frame_set_pts(frame: *mut AVFrame, value: i64);
  pub fn avk_frame_get_best_effort_timestamp(frame: *const AVFrame) -> i64;
  pub fn avk_frame_get_nb_samples(frame: *const AVFrame) -> c_int;
  pub fn avk_frame_set_nb_samples(frame: *mut AVFrame, value: c_int);
  pub fn avk_frame_get_sample_rate(frame: *const AVFrame) -> c_int;
  pub fn avk_frame_set_sample_rate(frame: *mut AVFrame, value: c_int);
  pub fn avk_frame_get_ch_layout(frame: *const AVFrame) -> *const AVChannelLayout;
  pub fn avk_frame_set_ch_layout(frame: *mut AVFrame, layout: *const AVChannelLayout) -> c_int;
  /// Borrowed; NULL for software frames
  pub fn avk_frame_get_hw_frames_ctx(frame: *const AVFrame) -> *mut AVBufferRef;

  // Plane access goes through extended_data so planar audio with more than
  // eight channels is covered.
  pub fn avk_frame_plane_count(frame: *const AVFrame) -> c_int;
  pub fn avk_frame_plane_size(frame: *const AVFrame, plane: c_int) -> c_int;
  pub fn avk_frame_data(frame: *mut AVFrame, plane: c_int) -> *mut u8;
  pub fn avk_frame_data_const(frame: *const AVFrame, plane: c_int) -> *const u8;
  pub fn avk_frame_linesize(frame: *const AVFrame, plane: c_int) -> c_int;
  pub fn avk_frame_data_array(frame: *const AVFrame) -> *const *const u8;
  pub fn avk_frame_linesize_array(frame: *const AVFrame) -> *const c_int;

  pub fn avk_pkt_data(pkt: *const AVPacket) -> *const u8;
  pub fn avk_pkt_size(pkt: *const AVPacket) -> c_int;
  pub fn avk_pkt_pts(pkt: *const AVPacket) -> i64;
  pub fn avk_pkt_set_pts(pkt: *mut AVPacket, value: i64);
  pub fn avk_pkt_dts(pkt: *const AVPacket) -> i64;
  pub fn avk_pkt_set_dts(pkt: *mut AVPacket, value: i64);
  pub fn avk_pkt_duration(pkt: *const AVPacket) -> i64;
  pub fn avk_pkt_set_duration(pkt: *mut AVPacket, value: i64);
  pub fn avk_pkt_flags(pkt: *const AVPacket) -> c_int;
  pub fn avk_pkt_set_flags(pkt: *mut AVPacket, value: c_int);
  pub fn avk_pkt_stream_index(pkt: *const AVPacket) -> c_int;
  pub fn avk_pkt_set_stream_index(pkt: *mut AVPacket, value: c_int);
}

// ----------------------------------------------------------------------------
// Containers and streams
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn avk_fmt_nb_streams(fmt: *const AVFormatContext) -> c_uint;
  /// NULL when `index` is out of range
  pub fn avk_fmt_stream(fmt: *const AVFormatContext, index: c_uint) -> *mut AVStream;
  pub fn avk_fmt_metadata(fmt: *const AVFormatContext) -> *mut AVDictionary;
  pub fn avk_fmt_duration(fmt: *const AVFormatContext) -> i64;
  /// Address of the `pb` field, for avio_open and avio_closep
  pub fn avk_fmt_pb(fmt: *mut AVFormatContext) -> *mut *mut AVIOContext;
  pub fn avk_fmt_iformat_name(fmt: *const AVFormatContext) -> *const c_char;
  pub fn avk_fmt_oformat_name(fmt: *const AVFormatContext) -> *const c_char;
  pub fn avk_fmt_oformat_flags(fmt: *const AVFormatContext) -> c_int;

  pub fn avk_stream_index(st: *const AVStream) -> c_int;
  pub fn avk_stream_duration(st: *const AVStream) -> i64;
  pub fn avk_stream_start_time(st: *const AVStream) -> i64;
  pub fn avk_stream_nb_frames(st: *const AVStream) -> i64;
  pub fn avk_stream_disposition(st: *const AVStream) -> c_int;
  pub fn avk_stream_metadata(st: *const AVStream) -> *mut AVDictionary;
  pub fn avk_stream_codecpar(st: *const AVStream) -> *mut AVCodecParameters;
  pub fn avk_stream_attached_pic(st: *const AVStream) -> *const AVPacket;
  pub fn avk_stream_get_time_base(st: *const AVStream, num: *mut c_int, den: *mut c_int);
  pub fn avk_stream_set_time_base(st: *mut AVStream, num: c_int, den: c_int);
  pub fn avk_stream_get_avg_frame_rate(st: *const AVStream, num: *mut c_int, den: *mut c_int);

  pub fn avk_par_codec_id(par: *const AVCodecParameters) -> c_int;
  pub fn avk_par_codec_type(par: *const AVCodecParameters) -> c_int;
  pub fn avk_par_width(par: *const AVCodecParameters) -> c_int;
  pub fn avk_par_height(par: *const AVCodecParameters) -> c_int;
  pub fn avk_par_format(par: *const AVCodecParameters) -> c_int;
  pub fn avk_par_sample_rate(par: *const AVCodecParameters) -> c_int;
  pub fn avk_par_bit_rate(par: *const AVCodecParameters) -> i64;
  pub fn avk_par_ch_layout(par: *const AVCodecParameters) -> *const AVChannelLayout;
}

// ----------------------------------------------------------------------------
// Filters
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn avk_filter_name(filter: *const AVFilter) -> *const c_char;
  pub fn avk_filter_description(filter: *const AVFilter) -> *const c_char;
  pub fn avk_filterctx_name(ctx: *const AVFilterContext) -> *const c_char;
  pub fn avk_filterctx_filter(ctx: *const AVFilterContext) -> *const AVFilter;

  pub fn avk_srcpar_set_format(par: *mut AVBufferSrcParameters, value: c_int);
  pub fn avk_srcpar_set_width(par: *mut AVBufferSrcParameters, value: c_int);
  pub fn avk_srcpar_set_height(par: *mut AVBufferSrcParameters, value: c_int);
  pub fn avk_srcpar_set_sample_rate(par: *mut AVBufferSrcParameters, value: c_int);
  pub fn avk_srcpar_set_time_base(par: *mut AVBufferSrcParameters, num: c_int, den: c_int);
  /// Replaces any previous pool with a new reference to `frames`
  pub fn avk_srcpar_set_hw_frames_ctx(
    par: *mut AVBufferSrcParameters,
    frames: *mut AVBufferRef,
  ) -> c_int;
  /// Drops the pool reference, frees the struct and nulls `*par`
  pub fn avk_srcpar_free(par: *mut *mut AVBufferSrcParameters);
}

// ----------------------------------------------------------------------------
// Hardware frame pools (fields of the AVHWFramesContext behind the buffer)
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn avk_hwframes_get_format(frames: *mut AVBufferRef) -> c_int;
  pub fn avk_hwframes_set_format(frames: *mut AVBufferRef, value: c_int);
  pub fn avk_hwframes_get_sw_format(frames: *mut AVBufferRef) -> c_int;
  pub fn avk_hwframes_set_sw_format(frames: *mut AVBufferRef, value: c_int);
  pub fn avk_hwframes_get_width(frames: *mut AVBufferRef) -> c_int;
  pub fn avk_hwframes_set_width(frames: *mut AVBufferRef, value: c_int);
  pub fn avk_hwframes_get_height(frames: *mut AVBufferRef) -> c_int;
  pub fn avk_hwframes_set_height(frames: *mut AVBufferRef, value: c_int);
  pub fn avk_hwframes_set_initial_pool_size(frames: *mut AVBufferRef, value: c_int);
}

unsafe extern "C" {
  /// Route av_log through a formatter that hands complete lines to `forward`
  pub fn avk_log_install(forward: LogForwardFn);
}

/// `AV_CODEC_FLAG_*` bits for [`CodecContext::add_flags`](crate::CodecContext::add_flags)
pub mod codec_flag {
  use std::os::raw::c_int;

  /// Rate control by `global_quality`
  pub const QSCALE: c_int = 1 << 1;
  /// Headers go to extradata once, as most containers want
  pub const GLOBAL_HEADER: c_int = 1 << 22;
  /// Reproducible output across builds and platforms
  pub const BITEXACT: c_int = 1 << 23;
}
