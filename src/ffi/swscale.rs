//! libswscale declarations

use super::types::*;
use std::os::raw::c_int;

unsafe extern "C" {
  /// NULL when the sizes or formats are unusable; swscale gives no code
  #[allow(clippy::too_many_arguments)]
  pub fn sws_getContext(
    src_w: c_int,
    src_h: c_int,
    src_format: c_int,
    dst_w: c_int,
    dst_h: c_int,
    dst_format: c_int,
    flags: c_int,
    src_filter: *mut SwsFilter,
    dst_filter: *mut SwsFilter,
    param: *const f64,
  ) -> *mut SwsContext;

  pub fn sws_freeContext(ctx: *mut SwsContext);

  /// Whole-frame conversion; allocates `dst` buffers when it has none
  pub fn sws_scale_frame(ctx: *mut SwsContext, dst: *mut AVFrame, src: *const AVFrame) -> c_int;

  pub fn sws_isSupportedInput(pix_fmt: c_int) -> c_int;
  pub fn sws_isSupportedOutput(pix_fmt: c_int) -> c_int;
}

/// Filter vectors are never passed; only NULL is used
#[repr(C)]
pub struct SwsFilter {
  _opaque: [u8; 0],
}

// Interpolation flags (`SWS_*`)
pub const SWS_FAST_BILINEAR: c_int = 0x1;
pub const SWS_BILINEAR: c_int = 0x2;
pub const SWS_BICUBIC: c_int = 0x4;
pub const SWS_POINT: c_int = 0x10;
pub const SWS_AREA: c_int = 0x20;
pub const SWS_LANCZOS: c_int = 0x200;
pub const SWS_SPLINE: c_int = 0x400;
