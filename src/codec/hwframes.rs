//! Safe wrapper around FFmpeg hardware frames context
//!
//! A frames context is a pool of GPU surfaces tied to one device. Encoders
//! take frames from it, decoders hand out frames backed by it, and
//! [`HwFramesContext::transfer_data`] moves pixels between the pool and
//! system memory.

use std::ptr::NonNull;

use crate::error::{check, check_config, non_null, Error, Result};
use crate::ffi::{
  accessors::{
    avk_ctx_get_hw_frames_ctx, avk_frame_get_hw_frames_ctx, avk_hwframes_get_format, avk_hwframes_get_height,
    avk_hwframes_get_sw_format, avk_hwframes_get_width, avk_hwframes_set_format, avk_hwframes_set_height,
    avk_hwframes_set_initial_pool_size, avk_hwframes_set_sw_format, avk_hwframes_set_width,
  },
  avutil::{av_buffer_ref, av_buffer_unref},
  hwaccel::{
    av_hwframe_ctx_alloc, av_hwframe_ctx_init, av_hwframe_get_buffer, av_hwframe_transfer_data,
  },
  AVBufferRef, AVHWDeviceType, AVPixelFormat,
};

use super::{CodecContext, Frame, HwDeviceContext, OwnedFrame};

/// Configuration for creating a hardware frames context
#[derive(Debug, Clone)]
pub struct HwFramesConfig {
  /// Hardware surface format; `None` picks the device type's own format
  pub format: Option<AVPixelFormat>,
  /// Format of the data inside the surfaces
  pub sw_format: AVPixelFormat,
  pub width: i32,
  pub height: i32,
  /// Surfaces allocated up front
  pub initial_pool_size: i32,
}

impl Default for HwFramesConfig {
  fn default() -> Self {
    Self {
      format: None,
      sw_format: AVPixelFormat::NV12, // Most hardware encoders prefer NV12
      width: 1920,
      height: 1080,
      initial_pool_size: 20,
    }
  }
}

/// Owned reference to an `AVHWFramesContext`
pub struct HwFramesContext {
  ptr: NonNull<AVBufferRef>,
}

impl HwFramesContext {
  /// Allocate and initialize a surface pool on `device`
  pub fn new(device: &HwDeviceContext, config: HwFramesConfig) -> Result<Self> {
    let frames_ref = unsafe { av_hwframe_ctx_alloc(device.as_ptr()) };
    // Wrapped right away so a failed init below releases it
    let ctx = Self {
      ptr: non_null("av_hwframe_ctx_alloc", frames_ref)?,
    };

    let format = match config.format {
      Some(format) => format,
      None => hw_pix_fmt_for(device.device_type()).ok_or_else(|| {
        Error::invalid_argument(
          "av_hwframe_ctx_init",
          format!("no surface format known for {}", device.device_name()),
        )
      })?,
    };

    unsafe {
      avk_hwframes_set_format(ctx.as_ptr(), format.as_raw());
      avk_hwframes_set_sw_format(ctx.as_ptr(), config.sw_format.as_raw());
      avk_hwframes_set_width(ctx.as_ptr(), config.width);
      avk_hwframes_set_height(ctx.as_ptr(), config.height);
      avk_hwframes_set_initial_pool_size(ctx.as_ptr(), config.initial_pool_size);
    }

    let ret = unsafe { av_hwframe_ctx_init(ctx.as_ptr()) };
    check_config("av_hwframe_ctx_init", ret)?;

    tracing::debug!(
      device = device.device_name(),
      format = format.name().unwrap_or("?"),
      sw_format = config.sw_format.name().unwrap_or("?"),
      width = config.width,
      height = config.height,
      pool = config.initial_pool_size,
      "initialized hardware frames context"
    );
    Ok(ctx)
  }

  /// New reference to the pool a codec context uses
  ///
  /// A hardware decoder creates its pool once it has seen the first frames,
  /// so this is `None` until then.
  pub fn from_codec_context(ctx: &CodecContext) -> Result<Option<Self>> {
    let frames = unsafe { avk_ctx_get_hw_frames_ctx(ctx.as_ptr()) };
    if frames.is_null() {
      return Ok(None);
    }
    let ptr = unsafe { av_buffer_ref(frames) };
    Ok(Some(Self {
      ptr: non_null("av_buffer_ref", ptr)?,
    }))
  }

  /// New reference to the pool a hardware frame was taken from
  pub fn from_frame(frame: &Frame) -> Result<Option<Self>> {
    let frames = unsafe { avk_frame_get_hw_frames_ctx(frame.as_ptr()) };
    if frames.is_null() {
      return Ok(None);
    }
    let ptr = unsafe { av_buffer_ref(frames) };
    Ok(Some(Self {
      ptr: non_null("av_buffer_ref", ptr)?,
    }))
  }

  /// Attach a free surface from the pool to `frame`
  pub fn get_buffer(&self, frame: &mut Frame) -> Result<()> {
    let ret = unsafe { av_hwframe_get_buffer(self.as_ptr(), frame.as_mut_ptr(), 0) };
    check("av_hwframe_get_buffer", ret)?;
    Ok(())
  }

  /// Copy pixels between a surface and system memory
  ///
  /// When `dst` has no buffers they are allocated in the pool's software
  /// format.
  pub fn transfer_data(dst: &mut Frame, src: &Frame) -> Result<()> {
    let ret = unsafe { av_hwframe_transfer_data(dst.as_mut_ptr(), src.as_ptr(), 0) };
    check("av_hwframe_transfer_data", ret)?;
    Ok(())
  }

  /// Upload a system-memory frame into a new surface from the pool
  pub fn upload(&self, sw_frame: &Frame) -> Result<OwnedFrame> {
    let mut hw_frame = OwnedFrame::new()?;
    self.get_buffer(&mut hw_frame)?;
    Self::transfer_data(&mut hw_frame, sw_frame)?;
    hw_frame.set_pts(sw_frame.pts());
    Ok(hw_frame)
  }

  /// Raw reference, for APIs that take their own `av_buffer_ref`
  #[inline]
  pub fn as_ptr(&self) -> *mut AVBufferRef {
    self.ptr.as_ptr()
  }

  pub fn format(&self) -> AVPixelFormat {
    AVPixelFormat(unsafe { avk_hwframes_get_format(self.as_ptr()) })
  }

  pub fn sw_format(&self) -> AVPixelFormat {
    AVPixelFormat(unsafe { avk_hwframes_get_sw_format(self.as_ptr()) })
  }

  pub fn width(&self) -> i32 {
    unsafe { avk_hwframes_get_width(self.as_ptr()) }
  }

  pub fn height(&self) -> i32 {
    unsafe { avk_hwframes_get_height(self.as_ptr()) }
  }
}

impl Drop for HwFramesContext {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_buffer_unref(&mut ptr);
    }
  }
}

unsafe impl Send for HwFramesContext {}

impl std::fmt::Debug for HwFramesContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HwFramesContext")
      .field("format", &self.format())
      .field("sw_format", &self.sw_format())
      .field("width", &self.width())
      .field("height", &self.height())
      .finish()
  }
}

/// Surface pixel format used by a device type
///
/// Hardware pixel format values moved between FFmpeg releases, so they are
/// resolved by name at runtime.
pub fn hw_pix_fmt_for(device_type: AVHWDeviceType) -> Option<AVPixelFormat> {
  let name = match device_type {
    AVHWDeviceType::Vaapi => "vaapi",
    AVHWDeviceType::Cuda => "cuda",
    AVHWDeviceType::Qsv => "qsv",
    AVHWDeviceType::Videotoolbox => "videotoolbox_vld",
    AVHWDeviceType::D3d11va => "d3d11",
    AVHWDeviceType::Dxva2 => "dxva2_vld",
    AVHWDeviceType::Vdpau => "vdpau",
    AVHWDeviceType::Drm => "drm_prime",
    AVHWDeviceType::Opencl => "opencl",
    AVHWDeviceType::Mediacodec => "mediacodec",
    AVHWDeviceType::Vulkan => "vulkan",
    AVHWDeviceType::None => return None,
  };
  AVPixelFormat::from_name(name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hwframes_config_default() {
    let config = HwFramesConfig::default();
    assert_eq!(config.format, None);
    assert_eq!(config.sw_format, AVPixelFormat::NV12);
    assert_eq!(config.initial_pool_size, 20);
  }

  #[test]
  fn test_hw_pix_fmt_mapping() {
    let vaapi = hw_pix_fmt_for(AVHWDeviceType::Vaapi).unwrap();
    assert_eq!(vaapi.name(), Some("vaapi"));
    let cuda = hw_pix_fmt_for(AVHWDeviceType::Cuda).unwrap();
    assert_eq!(cuda.name(), Some("cuda"));
    assert_eq!(hw_pix_fmt_for(AVHWDeviceType::None), None);
  }

  #[test]
  fn test_software_context_has_no_pool() {
    let ctx = CodecContext::new(None).unwrap();
    assert!(HwFramesContext::from_codec_context(&ctx).unwrap().is_none());
    let frame = OwnedFrame::new_video(8, 8, AVPixelFormat::NV12, 0).unwrap();
    assert!(HwFramesContext::from_frame(&frame).unwrap().is_none());
  }

  #[test]
  #[cfg(target_os = "linux")]
  fn test_vaapi_pool_if_available() {
    let Ok(device) = HwDeviceContext::new(AVHWDeviceType::Vaapi) else {
      println!("VAAPI not available, skipping test");
      return;
    };
    let config = HwFramesConfig {
      width: 320,
      height: 240,
      initial_pool_size: 4,
      ..Default::default()
    };
    let Ok(pool) = HwFramesContext::new(&device, config) else {
      println!("VAAPI pool creation failed, skipping test");
      return;
    };
    assert_eq!(pool.width(), 320);
    assert_eq!(pool.sw_format(), AVPixelFormat::NV12);

    let mut frame = OwnedFrame::new().unwrap();
    pool.get_buffer(&mut frame).unwrap();
    assert!(frame.is_hw_frame());
    let shared = HwFramesContext::from_frame(&frame).unwrap().unwrap();
    assert_eq!(shared.width(), 320);
  }
}
