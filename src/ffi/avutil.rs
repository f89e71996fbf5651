//! libavutil: frames, buffers, formats, dictionaries, options and logging

use super::types::*;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};

// ----------------------------------------------------------------------------
// Frames and reference-counted buffers
// ----------------------------------------------------------------------------

unsafe extern "C" {
  pub fn av_frame_alloc() -> *mut AVFrame;
  pub fn av_frame_free(frame: *mut *mut AVFrame);
  pub fn av_frame_ref(dst: *mut AVFrame, src: *const AVFrame) -> c_int;
  pub fn av_frame_unref(frame: *mut AVFrame);
  /// New frame sharing the buffers of `src`
  pub fn av_frame_clone(src: *const AVFrame) -> *mut AVFrame;
  /// Allocate planes for the format, size or sample count already set;
  /// `align` 0 lets FFmpeg pick
  pub fn av_frame_get_buffer(frame: *mut AVFrame, align: c_int) -> c_int;
  /// Copies the data first when a buffer is shared
  pub fn av_frame_make_writable(frame: *mut AVFrame) -> c_int;

  pub fn av_buffer_ref(buf: *const AVBufferRef) -> *mut AVBufferRef;
  pub fn av_buffer_unref(buf: *mut *mut AVBufferRef);

  pub fn av_free(ptr: *mut c_void);
}

// ----------------------------------------------------------------------------
// Formats, images, channel layouts
// ----------------------------------------------------------------------------

unsafe extern "C" {
  /// AV_PIX_FMT_NONE for unknown names
  pub fn av_get_pix_fmt(name: *const c_char) -> c_int;
  pub fn av_get_pix_fmt_name(pix_fmt: c_int) -> *const c_char;
  pub fn av_get_sample_fmt_name(sample_fmt: c_int) -> *const c_char;
  pub fn av_sample_fmt_is_planar(sample_fmt: c_int) -> c_int;
  pub fn av_get_bytes_per_sample(sample_fmt: c_int) -> c_int;

  pub fn av_image_get_buffer_size(
    pix_fmt: c_int,
    width: c_int,
    height: c_int,
    align: c_int,
  ) -> c_int;
  /// Pack the planes described by `data`/`linesize` into `dst`
  #[allow(clippy::too_many_arguments)]
  pub fn av_image_copy_to_buffer(
    dst: *mut u8,
    dst_size: c_int,
    data: *const *const u8,
    linesize: *const c_int,
    pix_fmt: c_int,
    width: c_int,
    height: c_int,
    align: c_int,
  ) -> c_int;

  pub fn av_channel_layout_default(layout: *mut AVChannelLayout, nb_channels: c_int);
  /// Accepts "stereo", "5.1(side)", "FL+FR", "3c" and the like
  pub fn av_channel_layout_from_string(layout: *mut AVChannelLayout, desc: *const c_char)
  -> c_int;
  /// `dst` is uninitialized before the copy
  pub fn av_channel_layout_copy(dst: *mut AVChannelLayout, src: *const AVChannelLayout) -> c_int;
  pub fn av_channel_layout_uninit(layout: *mut AVChannelLayout);
  /// Returns the length the description needs, terminator included
  pub fn av_channel_layout_describe(
    layout: *const AVChannelLayout,
    buf: *mut c_char,
    buf_size: usize,
  ) -> c_int;
  /// 0 when equal, 1 when not
  pub fn av_channel_layout_compare(a: *const AVChannelLayout, b: *const AVChannelLayout) -> c_int;
}

// ----------------------------------------------------------------------------
// Dictionaries and options
// ----------------------------------------------------------------------------

unsafe extern "C" {
  /// Allocates `*dict` on first use; a NULL value deletes the key
  pub fn av_dict_set(
    dict: *mut *mut AVDictionary,
    key: *const c_char,
    value: *const c_char,
    flags: c_int,
  ) -> c_int;
  pub fn av_dict_set_int(
    dict: *mut *mut AVDictionary,
    key: *const c_char,
    value: i64,
    flags: c_int,
  ) -> c_int;
  /// Iterate by passing the previous entry back as `prev`
  pub fn av_dict_get(
    dict: *const AVDictionary,
    key: *const c_char,
    prev: *const AVDictionaryEntry,
    flags: c_int,
  ) -> *const AVDictionaryEntry;
  pub fn av_dict_count(dict: *const AVDictionary) -> c_int;
  pub fn av_dict_parse_string(
    dict: *mut *mut AVDictionary,
    text: *const c_char,
    key_val_sep: *const c_char,
    pairs_sep: *const c_char,
    flags: c_int,
  ) -> c_int;
  pub fn av_dict_free(dict: *mut *mut AVDictionary);

  pub fn av_opt_set(
    obj: *mut c_void,
    name: *const c_char,
    value: *const c_char,
    flags: c_int,
  ) -> c_int;
  pub fn av_opt_set_int(obj: *mut c_void, name: *const c_char, value: i64, flags: c_int) -> c_int;
  pub fn av_opt_set_q(
    obj: *mut c_void,
    name: *const c_char,
    value: AVRational,
    flags: c_int,
  ) -> c_int;
}

// ----------------------------------------------------------------------------
// Errors, logging, hashing
// ----------------------------------------------------------------------------

unsafe extern "C" {
  /// Negative when FFmpeg has no text for `errnum`; `buf` still gets a fallback
  pub fn av_strerror(errnum: c_int, buf: *mut c_char, buf_size: usize) -> c_int;

  pub fn av_log_set_level(level: c_int);
  pub fn av_log_get_level() -> c_int;
  /// Goes through the installed callback; a line may be built over several calls
  pub fn av_log(avcl: *mut c_void, level: c_int, fmt: *const c_char, ...);

  /// 16-byte digest of `len` bytes at `src`
  pub fn av_md5_sum(dst: *mut u8, src: *const u8, len: usize);
}

/// `AV_LOG_*` thresholds
pub mod log_level {
  use std::os::raw::c_int;

  pub const QUIET: c_int = -8;
  pub const PANIC: c_int = 0;
  pub const FATAL: c_int = 8;
  pub const ERROR: c_int = 16;
  pub const WARNING: c_int = 24;
  pub const INFO: c_int = 32;
  pub const VERBOSE: c_int = 40;
  pub const DEBUG: c_int = 48;
  pub const TRACE: c_int = 56;
}

/// Borrow a static C string returned by a name lookup
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string with static lifetime.
pub(crate) unsafe fn static_str(ptr: *const c_char) -> Option<&'static str> {
  if ptr.is_null() {
    None
  } else {
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
  }
}

impl AVPixelFormat {
  /// Look up a pixel format by its FFmpeg name ("nv12", "vaapi", "cuda", ...)
  pub fn from_name(name: &str) -> Option<Self> {
    let c_name = CString::new(name).ok()?;
    let raw = unsafe { av_get_pix_fmt(c_name.as_ptr()) };
    let fmt = Self(raw);
    (!fmt.is_none()).then_some(fmt)
  }

  /// FFmpeg's short name for this format
  pub fn name(&self) -> Option<&'static str> {
    unsafe { static_str(av_get_pix_fmt_name(self.0)) }
  }

  /// Required buffer size for one image of this format
  pub fn image_buffer_size(&self, width: i32, height: i32, align: i32) -> i32 {
    unsafe { av_image_get_buffer_size(self.0, width, height, align) }
  }
}

impl AVSampleFormat {
  /// FFmpeg's short name for this format ("s16", "fltp", ...)
  pub fn name(&self) -> Option<&'static str> {
    unsafe { static_str(av_get_sample_fmt_name(self.as_raw())) }
  }

  /// Bytes per sample, 0 for `None`
  pub fn bytes_per_sample(&self) -> usize {
    unsafe { av_get_bytes_per_sample(self.as_raw()) }.max(0) as usize
  }
}
