//! libavformat: reading and writing containers

use super::types::*;
use std::os::raw::{c_char, c_int};

// ----------------------------------------------------------------------------
// Demuxing
// ----------------------------------------------------------------------------

unsafe extern "C" {
  /// Probe `url` and read its header; `*ctx` is freed and nulled on failure
  pub fn avformat_open_input(
    ctx: *mut *mut AVFormatContext,
    url: *const c_char,
    format: *const AVInputFormat,
    options: *mut *mut AVDictionary,
  ) -> c_int;
  pub fn avformat_close_input(ctx: *mut *mut AVFormatContext);

  /// Decodes a few packets when the header leaves stream parameters unknown
  pub fn avformat_find_stream_info(
    ctx: *mut AVFormatContext,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  /// Stream index, AVERROR_STREAM_NOT_FOUND, or AVERROR_DECODER_NOT_FOUND when
  /// a decoder was asked for through `decoder` and none exists
  pub fn av_find_best_stream(
    ctx: *mut AVFormatContext,
    media_type: c_int,
    wanted: c_int,
    related: c_int,
    decoder: *mut *const AVCodec,
    flags: c_int,
  ) -> c_int;

  /// Next packet of any stream, AVERROR_EOF after the last
  pub fn av_read_frame(ctx: *mut AVFormatContext, pkt: *mut AVPacket) -> c_int;

  pub fn av_seek_frame(
    ctx: *mut AVFormatContext,
    stream_index: c_int,
    timestamp: i64,
    flags: c_int,
  ) -> c_int;
  /// Seek to `ts`, landing somewhere in `min_ts..=max_ts`
  pub fn avformat_seek_file(
    ctx: *mut AVFormatContext,
    stream_index: c_int,
    min_ts: i64,
    ts: i64,
    max_ts: i64,
    flags: c_int,
  ) -> c_int;
}

// ----------------------------------------------------------------------------
// Muxing
// ----------------------------------------------------------------------------

unsafe extern "C" {
  /// The container is picked from `format` (a short name) or guessed from
  /// `filename` when `oformat` is NULL
  pub fn avformat_alloc_output_context2(
    ctx: *mut *mut AVFormatContext,
    oformat: *const AVOutputFormat,
    format: *const c_char,
    filename: *const c_char,
  ) -> c_int;
  pub fn avformat_free_context(ctx: *mut AVFormatContext);

  pub fn avformat_new_stream(ctx: *mut AVFormatContext, codec: *const AVCodec) -> *mut AVStream;

  /// May replace each stream's time base with one the container supports
  pub fn avformat_write_header(ctx: *mut AVFormatContext, options: *mut *mut AVDictionary)
  -> c_int;
  /// Consumes the packet's reference and leaves `pkt` blank
  pub fn av_interleaved_write_frame(ctx: *mut AVFormatContext, pkt: *mut AVPacket) -> c_int;
  pub fn av_write_trailer(ctx: *mut AVFormatContext) -> c_int;

  pub fn avio_open(pb: *mut *mut AVIOContext, url: *const c_char, flags: c_int) -> c_int;
  pub fn avio_closep(pb: *mut *mut AVIOContext) -> c_int;
}

unsafe extern "C" {
  /// Logs a summary of the container at info level
  pub fn av_dump_format(
    ctx: *mut AVFormatContext,
    index: c_int,
    url: *const c_char,
    is_output: c_int,
  );
}
