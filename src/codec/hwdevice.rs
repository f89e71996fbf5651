//! Hardware devices (a VAAPI display, a CUDA context, ...)

use std::ffi::CString;
use std::ptr::{self, NonNull};

use crate::error::{check_config, non_null, Result};
use crate::ffi::{
  avutil::{av_buffer_ref, av_buffer_unref},
  hwaccel::av_hwdevice_ctx_create,
  AVBufferRef, AVHWDeviceType,
};
use crate::util::{cstring, Dictionary};

/// Owned reference to an opened `AVHWDeviceContext`
///
/// Codec contexts and frame pools take their own references, so the device
/// may be dropped as soon as they are set up.
pub struct HwDeviceContext {
  ptr: NonNull<AVBufferRef>,
  device_type: AVHWDeviceType,
}

impl HwDeviceContext {
  /// Open the default device of the given type
  pub fn new(device_type: AVHWDeviceType) -> Result<Self> {
    Self::with_options(device_type, None, None, 0)
  }

  /// `device` names a specific device, e.g. "/dev/dri/renderD128"
  pub fn with_options(
    device_type: AVHWDeviceType,
    device: Option<&str>,
    options: Option<&Dictionary>,
    flags: i32,
  ) -> Result<Self> {
    const OP: &str = "av_hwdevice_ctx_create";
    let c_device: Option<CString> = device.map(|d| cstring(OP, d)).transpose()?;
    let mut out: *mut AVBufferRef = ptr::null_mut();
    check_config(OP, unsafe {
      av_hwdevice_ctx_create(
        &mut out,
        device_type.as_raw(),
        c_device.as_deref().map_or(ptr::null(), |d| d.as_ptr()),
        options.map_or(ptr::null_mut(), |o| o.as_ptr() as *mut _),
        flags,
      )
    })?;
    let ptr = non_null(OP, out)?;
    tracing::debug!(
      device_type = device_type.name().unwrap_or("unknown"),
      device = device.unwrap_or("default"),
      "opened hardware device"
    );
    Ok(Self { ptr, device_type })
  }

  #[inline]
  pub fn as_ptr(&self) -> *mut AVBufferRef {
    self.ptr.as_ptr()
  }

  #[inline]
  pub fn device_type(&self) -> AVHWDeviceType {
    self.device_type
  }

  pub fn device_name(&self) -> &'static str {
    self.device_type.name().unwrap_or("unknown")
  }

  /// New reference to the same device
  pub fn try_clone(&self) -> Result<Self> {
    let ptr = unsafe { av_buffer_ref(self.as_ptr()) };
    Ok(Self {
      ptr: non_null("av_buffer_ref", ptr)?,
      device_type: self.device_type,
    })
  }
}

impl Drop for HwDeviceContext {
  fn drop(&mut self) {
    let mut buf = self.ptr.as_ptr();
    unsafe { av_buffer_unref(&mut buf) };
  }
}

unsafe impl Send for HwDeviceContext {}

impl std::fmt::Debug for HwDeviceContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HwDeviceContext")
      .field("type", &self.device_type)
      .field("name", &self.device_name())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_device_type_names_round_trip() {
    for device_type in AVHWDeviceType::supported() {
      assert_ne!(device_type, AVHWDeviceType::None);
      assert_eq!(AVHWDeviceType::from_name(device_type.name().unwrap()), Some(device_type));
    }
    assert_eq!(AVHWDeviceType::Vaapi.name(), Some("vaapi"));
    assert_eq!(AVHWDeviceType::from_name("no-such-device"), None);
  }

  #[test]
  fn test_missing_device_is_an_error() {
    let result = HwDeviceContext::with_options(
      AVHWDeviceType::Vaapi,
      Some("/nonexistent/renderD999"),
      None,
      0,
    );
    assert!(result.is_err());
  }

  #[test]
  #[cfg(target_os = "linux")]
  fn test_vaapi_clone_if_available() {
    let Ok(device) = HwDeviceContext::new(AVHWDeviceType::Vaapi) else {
      eprintln!("no VAAPI device, skipping");
      return;
    };
    let clone = device.try_clone().unwrap();
    assert_eq!(clone.device_type(), AVHWDeviceType::Vaapi);
    assert_eq!(clone.device_name(), "vaapi");
  }
}
