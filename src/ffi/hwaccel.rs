//! libavutil hwcontext: devices, frame pools and surface transfers

use super::types::*;
use std::os::raw::{c_char, c_int};

unsafe extern "C" {
  /// `device` is type specific (a DRM render node, a CUDA ordinal) or NULL
  /// for the default; `flags` must be 0
  pub fn av_hwdevice_ctx_create(
    out: *mut *mut AVBufferRef,
    device_type: c_int,
    device: *const c_char,
    options: *mut AVDictionary,
    flags: c_int,
  ) -> c_int;

  /// Walk the compiled-in device types, starting and ending at NONE
  pub fn av_hwdevice_iterate_types(prev: c_int) -> c_int;
  pub fn av_hwdevice_get_type_name(device_type: c_int) -> *const c_char;
  pub fn av_hwdevice_find_type_by_name(name: *const c_char) -> c_int;

  /// Unconfigured pool on `device`; set its fields, then init
  pub fn av_hwframe_ctx_alloc(device: *mut AVBufferRef) -> *mut AVBufferRef;
  pub fn av_hwframe_ctx_init(frames: *mut AVBufferRef) -> c_int;
  /// Take one surface from the pool
  pub fn av_hwframe_get_buffer(frames: *mut AVBufferRef, frame: *mut AVFrame, flags: c_int)
  -> c_int;

  /// Upload or download; a `dst` without buffers gets them in the pool's
  /// software format
  pub fn av_hwframe_transfer_data(dst: *mut AVFrame, src: *const AVFrame, flags: c_int) -> c_int;
}

impl AVHWDeviceType {
  pub fn from_name(name: &str) -> Option<Self> {
    let c_name = std::ffi::CString::new(name).ok()?;
    let raw = unsafe { av_hwdevice_find_type_by_name(c_name.as_ptr()) };
    match Self::from_raw(raw) {
      Self::None => None,
      device_type => Some(device_type),
    }
  }

  /// FFmpeg's name for this device type
  pub fn name(&self) -> Option<&'static str> {
    unsafe { super::avutil::static_str(av_hwdevice_get_type_name(self.as_raw())) }
  }

  /// Types this libavutil was built with; a listed type may still have no
  /// device on this machine
  pub fn supported() -> Vec<Self> {
    let none = Self::None.as_raw();
    std::iter::successors(Some(none), |&prev| {
      let next = unsafe { av_hwdevice_iterate_types(prev) };
      (next != none).then_some(next)
    })
    .skip(1)
    .map(Self::from_raw)
    .filter(|device_type| *device_type != Self::None)
    .collect()
  }
}
