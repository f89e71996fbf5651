//! Safe wrapper around FFmpeg SwsContext
//!
//! Provides pixel format conversion and image scaling on whole frames.

use std::ptr::{self, NonNull};

use crate::error::{check, Error, Result};
use crate::ffi::{
  swscale::{
    sws_freeContext, sws_getContext, sws_isSupportedInput, sws_isSupportedOutput, sws_scale_frame,
  },
  AVPixelFormat, SwsContext,
};

use super::Frame;

/// Scaling algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleAlgorithm {
  /// Fast bilinear (fastest, lower quality)
  FastBilinear,
  #[default]
  Bilinear,
  Bicubic,
  /// Nearest neighbour
  Point,
  Area,
  Lanczos,
  Spline,
}

impl ScaleAlgorithm {
  fn to_sws_flags(self) -> i32 {
    use crate::ffi::swscale::*;
    match self {
      ScaleAlgorithm::FastBilinear => SWS_FAST_BILINEAR,
      ScaleAlgorithm::Bilinear => SWS_BILINEAR,
      ScaleAlgorithm::Bicubic => SWS_BICUBIC,
      ScaleAlgorithm::Point => SWS_POINT,
      ScaleAlgorithm::Area => SWS_AREA,
      ScaleAlgorithm::Lanczos => SWS_LANCZOS,
      ScaleAlgorithm::Spline => SWS_SPLINE,
    }
  }
}

/// Size and pixel format of one side of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleParams {
  pub width: i32,
  pub height: i32,
  pub pix_fmt: AVPixelFormat,
}

impl ScaleParams {
  pub fn new(width: i32, height: i32, pix_fmt: AVPixelFormat) -> Self {
    Self {
      width,
      height,
      pix_fmt,
    }
  }

  /// Size and format of a video frame
  pub fn of_frame(frame: &Frame) -> Self {
    Self::new(frame.width(), frame.height(), frame.pix_fmt())
  }
}

/// Safe wrapper around SwsContext
pub struct Scaler {
  ptr: NonNull<SwsContext>,
  src: ScaleParams,
  dst: ScaleParams,
}

impl Scaler {
  pub fn new(src: ScaleParams, dst: ScaleParams, algorithm: ScaleAlgorithm) -> Result<Self> {
    if !src.pix_fmt.is_none() && unsafe { sws_isSupportedInput(src.pix_fmt.as_raw()) } <= 0 {
      return Err(Error::invalid_argument(
        "sws_getContext",
        format!("{} is not a supported input format", src.pix_fmt.name().unwrap_or("?")),
      ));
    }
    if !dst.pix_fmt.is_none() && unsafe { sws_isSupportedOutput(dst.pix_fmt.as_raw()) } <= 0 {
      return Err(Error::invalid_argument(
        "sws_getContext",
        format!("{} is not a supported output format", dst.pix_fmt.name().unwrap_or("?")),
      ));
    }

    let raw = unsafe {
      sws_getContext(
        src.width,
        src.height,
        src.pix_fmt.as_raw(),
        dst.width,
        dst.height,
        dst.pix_fmt.as_raw(),
        algorithm.to_sws_flags(),
        ptr::null_mut(),
        ptr::null_mut(),
        ptr::null(),
      )
    };
    // swscale reports bad sizes and unsupported formats only as NULL
    let ptr = NonNull::new(raw).ok_or_else(|| {
      Error::invalid_argument(
        "sws_getContext",
        format!(
          "cannot convert {}x{} {} to {}x{} {}",
          src.width,
          src.height,
          src.pix_fmt.name().unwrap_or("none"),
          dst.width,
          dst.height,
          dst.pix_fmt.name().unwrap_or("none"),
        ),
      )
    })?;

    tracing::debug!(
      src = ?src,
      dst = ?dst,
      algorithm = ?algorithm,
      "created scaler"
    );
    Ok(Self { ptr, src, dst })
  }

  /// Scale `src` into `dst`
  ///
  /// When `dst` has no buffers they are allocated at the output size and
  /// format; otherwise they must already match it.
  pub fn scale_frame(&mut self, dst: &mut Frame, src: &Frame) -> Result<()> {
    if dst.nb_planes() == 0 {
      dst.set_width(self.dst.width);
      dst.set_height(self.dst.height);
      dst.set_pix_fmt(self.dst.pix_fmt);
    }
    let ret = unsafe { sws_scale_frame(self.ptr.as_ptr(), dst.as_mut_ptr(), src.as_ptr()) };
    check("sws_scale_frame", ret)?;
    dst.set_pts(src.pts());
    Ok(())
  }

  pub fn src(&self) -> ScaleParams {
    self.src
  }

  pub fn dst(&self) -> ScaleParams {
    self.dst
  }

  /// Check if this is a format-only conversion (no scaling)
  pub fn is_converter_only(&self) -> bool {
    self.src.width == self.dst.width && self.src.height == self.dst.height
  }
}

impl Drop for Scaler {
  fn drop(&mut self) {
    unsafe { sws_freeContext(self.ptr.as_ptr()) }
  }
}

unsafe impl Send for Scaler {}

impl std::fmt::Debug for Scaler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scaler")
      .field("src", &self.src)
      .field("dst", &self.dst)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::OwnedFrame;

  #[test]
  fn test_scaler_creation() {
    let scaler = Scaler::new(
      ScaleParams::new(1920, 1080, AVPixelFormat::YUV420P),
      ScaleParams::new(1280, 720, AVPixelFormat::YUV420P),
      ScaleAlgorithm::Bilinear,
    );
    assert!(scaler.is_ok());
    assert!(!scaler.unwrap().is_converter_only());
  }

  #[test]
  fn test_zero_size_is_configuration_error() {
    let err = Scaler::new(
      ScaleParams::new(0, 0, AVPixelFormat::YUV420P),
      ScaleParams::new(0, 0, AVPixelFormat::RGBA),
      ScaleAlgorithm::default(),
    )
    .unwrap_err();
    assert!(matches!(
      err,
      Error::Configuration {
        op: "sws_getContext",
        ..
      }
    ));
  }

  #[test]
  fn test_hardware_format_rejected() {
    let Some(vaapi) = AVPixelFormat::from_name("vaapi") else {
      return;
    };
    let err = Scaler::new(
      ScaleParams::new(64, 64, vaapi),
      ScaleParams::new(64, 64, AVPixelFormat::RGBA),
      ScaleAlgorithm::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("not a supported input format"));
  }

  #[test]
  fn test_convert_to_rgba() {
    let params = ScaleParams::new(32, 16, AVPixelFormat::YUV420P);
    let mut scaler = Scaler::new(
      params,
      ScaleParams::new(32, 16, AVPixelFormat::RGBA),
      ScaleAlgorithm::Point,
    )
    .unwrap();
    assert!(scaler.is_converter_only());

    let mut src = OwnedFrame::new_video(32, 16, AVPixelFormat::YUV420P, 0).unwrap();
    assert_eq!(ScaleParams::of_frame(&src), params);
    for plane in 0..3 {
      if let Some(data) = src.plane_mut(plane) {
        data.fill(128);
      }
    }
    src.set_pts(4);

    let mut dst = OwnedFrame::new().unwrap();
    scaler.scale_frame(&mut dst, &src).unwrap();
    assert_eq!(dst.width(), 32);
    assert_eq!(dst.pix_fmt(), AVPixelFormat::RGBA);
    assert_eq!(dst.pts(), 4);
    assert!(dst.linesize(0) >= 32 * 4);
  }
}
