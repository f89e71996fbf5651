//! libavcodec: codec lookup, codec contexts, the send/receive API, packets

use super::types::*;
use std::os::raw::{c_char, c_int};

// ----------------------------------------------------------------------------
// Lookup
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn avcodec_find_encoder(id: c_int) -> *const AVCodec;
  pub fn avcodec_find_decoder(id: c_int) -> *const AVCodec;
  /// Implementation name, e.g. "h264_vaapi" or "libx264"
  pub fn avcodec_find_encoder_by_name(name: *const c_char) -> *const AVCodec;
  pub fn avcodec_find_decoder_by_name(name: *const c_char) -> *const AVCodec;

  pub fn av_codec_is_encoder(codec: *const AVCodec) -> c_int;
  pub fn av_codec_is_decoder(codec: *const AVCodec) -> c_int;

  /// `index`-th hardware configuration of `codec`, NULL past the end
  pub fn avcodec_get_hw_config(codec: *const AVCodec, index: c_int) -> *const AVCodecHWConfig;

  /// Canonical name of a codec id; never NULL
  pub fn avcodec_get_name(id: c_int) -> *const c_char;
}

// ----------------------------------------------------------------------------
// Contexts
// ----------------------------------------------------------------------------

unsafe extern "C" {
  /// Codec defaults (and private options) are applied when `codec` is given
  pub fn avcodec_alloc_context3(codec: *const AVCodec) -> *mut AVCodecContext;
  pub fn avcodec_free_context(ctx: *mut *mut AVCodecContext);

  /// Recognized entries are removed from `*options`, the rest stay behind
  pub fn avcodec_open2(
    ctx: *mut AVCodecContext,
    codec: *const AVCodec,
    options: *mut *mut AVDictionary,
  ) -> c_int;
  pub fn avcodec_is_open(ctx: *mut AVCodecContext) -> c_int;

  pub fn avcodec_parameters_from_context(
    dst: *mut AVCodecParameters,
    ctx: *const AVCodecContext,
  ) -> c_int;
  pub fn avcodec_parameters_to_context(
    ctx: *mut AVCodecContext,
    src: *const AVCodecParameters,
  ) -> c_int;
}

// ----------------------------------------------------------------------------
// Send / receive
//
// A NULL frame or packet starts draining. Sends return EAGAIN while output is
// waiting; receives return EAGAIN when more input is needed and AVERROR_EOF
// once a drained codec is empty.
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn avcodec_send_frame(ctx: *mut AVCodecContext, frame: *const AVFrame) -> c_int;
  pub fn avcodec_receive_packet(ctx: *mut AVCodecContext, pkt: *mut AVPacket) -> c_int;
  pub fn avcodec_send_packet(ctx: *mut AVCodecContext, pkt: *const AVPacket) -> c_int;
  pub fn avcodec_receive_frame(ctx: *mut AVCodecContext, frame: *mut AVFrame) -> c_int;

  /// Drop buffered data and leave draining mode
  pub fn avcodec_flush_buffers(ctx: *mut AVCodecContext);
}

// ----------------------------------------------------------------------------
// Packets
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn av_packet_alloc() -> *mut AVPacket;
  pub fn av_packet_free(pkt: *mut *mut AVPacket);
  pub fn av_packet_unref(pkt: *mut AVPacket);
  pub fn av_packet_ref(dst: *mut AVPacket, src: *const AVPacket) -> c_int;
  /// Zero-padded payload of `size` bytes
  pub fn av_new_packet(pkt: *mut AVPacket, size: c_int) -> c_int;
  /// Timestamps and duration from `from` units to `to` units; unset values stay unset
  pub fn av_packet_rescale_ts(pkt: *mut AVPacket, from: AVRational, to: AVRational);
}
