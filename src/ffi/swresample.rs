//! libswresample declarations (channel layout API, FFmpeg 5.1+)

use super::types::*;
use std::os::raw::c_int;

unsafe extern "C" {
  /// Allocate `*ps` if NULL and set both endpoints; `swr_init` must follow
  #[allow(clippy::too_many_arguments)]
  pub fn swr_alloc_set_opts2(
    ps: *mut *mut SwrContext,
    out_ch_layout: *const AVChannelLayout,
    out_sample_fmt: c_int,
    out_sample_rate: c_int,
    in_ch_layout: *const AVChannelLayout,
    in_sample_fmt: c_int,
    in_sample_rate: c_int,
    log_offset: c_int,
    log_ctx: *mut std::ffi::c_void,
  ) -> c_int;

  pub fn swr_init(s: *mut SwrContext) -> c_int;

  pub fn swr_free(s: *mut *mut SwrContext);

  /// Convert `input` (NULL drains) into `output`
  ///
  /// `output` must carry format, rate and layout; its buffers are allocated
  /// when it has none.
  pub fn swr_convert_frame(s: *mut SwrContext, output: *mut AVFrame, input: *const AVFrame)
    -> c_int;

  /// Upper bound on output samples for `in_samples` more input
  pub fn swr_get_out_samples(s: *mut SwrContext, in_samples: c_int) -> c_int;
}
