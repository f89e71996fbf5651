//! Safe wrappers around FFmpeg AVFrame
//!
//! [`OwnedFrame`] owns an `AVFrame` and frees it on drop. [`Frame`] is the
//! borrowed form handed out by decoders, filter sinks and pools; every
//! getter and setter lives on it, and `OwnedFrame` derefs to it.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{check, check_config, non_null, Error, Result};
use crate::ffi::{
  accessors::{
    avk_frame_data, avk_frame_data_array, avk_frame_data_const, avk_frame_get_best_effort_timestamp,
    avk_frame_get_ch_layout, avk_frame_get_format, avk_frame_get_height, avk_frame_get_hw_frames_ctx,
    avk_frame_get_nb_samples, avk_frame_get_pts, avk_frame_get_sample_rate, avk_frame_get_width,
    avk_frame_linesize, avk_frame_linesize_array, avk_frame_plane_count, avk_frame_plane_size,
    avk_frame_set_ch_layout, avk_frame_set_format, avk_frame_set_height, avk_frame_set_nb_samples,
    avk_frame_set_pts, avk_frame_set_sample_rate, avk_frame_set_width,
  },
  avutil::{
    av_frame_alloc, av_frame_clone, av_frame_free, av_frame_get_buffer, av_frame_make_writable,
    av_frame_ref, av_frame_unref, av_image_copy_to_buffer, av_image_get_buffer_size,
  },
  AVFrame, AVPixelFormat, AVSampleFormat,
};
use crate::util::ChannelLayout;

// ============================================================================
// Borrowed Frame
// ============================================================================

/// A frame owned elsewhere (a decoder's output buffer, an [`OwnedFrame`])
#[repr(transparent)]
pub struct Frame(AVFrame);

impl Frame {
  /// # Safety
  /// `ptr` must be a valid frame that outlives `'a`.
  pub(crate) unsafe fn from_ptr<'a>(ptr: *const AVFrame) -> &'a Frame {
    unsafe { &*(ptr as *const Frame) }
  }

  /// # Safety
  /// `ptr` must be a valid frame that outlives `'a` and is not aliased.
  pub(crate) unsafe fn from_mut_ptr<'a>(ptr: *mut AVFrame) -> &'a mut Frame {
    unsafe { &mut *(ptr as *mut Frame) }
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVFrame {
    &self.0
  }

  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVFrame {
    &mut self.0
  }

  // ========================================================================
  // Video Properties
  // ========================================================================

  #[inline]
  pub fn width(&self) -> i32 {
    unsafe { avk_frame_get_width(self.as_ptr()) }
  }

  #[inline]
  pub fn set_width(&mut self, width: i32) {
    unsafe { avk_frame_set_width(self.as_mut_ptr(), width) }
  }

  #[inline]
  pub fn height(&self) -> i32 {
    unsafe { avk_frame_get_height(self.as_ptr()) }
  }

  #[inline]
  pub fn set_height(&mut self, height: i32) {
    unsafe { avk_frame_set_height(self.as_mut_ptr(), height) }
  }

  /// Raw `format` field: a pixel format for video, a sample format for audio
  #[inline]
  pub fn format(&self) -> i32 {
    unsafe { avk_frame_get_format(self.as_ptr()) }
  }

  #[inline]
  pub fn set_format(&mut self, format: i32) {
    unsafe { avk_frame_set_format(self.as_mut_ptr(), format) }
  }

  pub fn pix_fmt(&self) -> AVPixelFormat {
    AVPixelFormat(self.format())
  }

  pub fn set_pix_fmt(&mut self, pix_fmt: AVPixelFormat) {
    self.set_format(pix_fmt.as_raw());
  }

  // ========================================================================
  // Audio Properties
  // ========================================================================

  pub fn sample_fmt(&self) -> AVSampleFormat {
    AVSampleFormat::from_raw(self.format())
  }

  pub fn set_sample_fmt(&mut self, sample_fmt: AVSampleFormat) {
    self.set_format(sample_fmt.as_raw());
  }

  #[inline]
  pub fn nb_samples(&self) -> i32 {
    unsafe { avk_frame_get_nb_samples(self.as_ptr()) }
  }

  #[inline]
  pub fn set_nb_samples(&mut self, nb_samples: i32) {
    unsafe { avk_frame_set_nb_samples(self.as_mut_ptr(), nb_samples) }
  }

  #[inline]
  pub fn sample_rate(&self) -> i32 {
    unsafe { avk_frame_get_sample_rate(self.as_ptr()) }
  }

  #[inline]
  pub fn set_sample_rate(&mut self, sample_rate: i32) {
    unsafe { avk_frame_set_sample_rate(self.as_mut_ptr(), sample_rate) }
  }

  pub fn nb_channels(&self) -> i32 {
    unsafe { (*avk_frame_get_ch_layout(self.as_ptr())).nb_channels }
  }

  /// Copy of the frame's channel layout
  pub fn ch_layout(&self) -> Result<ChannelLayout> {
    unsafe { ChannelLayout::copy_from(avk_frame_get_ch_layout(self.as_ptr())) }
  }

  pub fn set_ch_layout(&mut self, layout: &ChannelLayout) -> Result<()> {
    let ret = unsafe { avk_frame_set_ch_layout(self.as_mut_ptr(), layout.as_ptr()) };
    check("av_channel_layout_copy", ret)?;
    Ok(())
  }

  // ========================================================================
  // Timestamps
  // ========================================================================

  /// Presentation timestamp in the time base of whoever produced the frame
  #[inline]
  pub fn pts(&self) -> i64 {
    unsafe { avk_frame_get_pts(self.as_ptr()) }
  }

  #[inline]
  pub fn set_pts(&mut self, pts: i64) {
    unsafe { avk_frame_set_pts(self.as_mut_ptr(), pts) }
  }

  pub fn best_effort_timestamp(&self) -> i64 {
    unsafe { avk_frame_get_best_effort_timestamp(self.as_ptr()) }
  }

  /// Whether the frame lives in a hardware surface pool
  pub fn is_hw_frame(&self) -> bool {
    !unsafe { avk_frame_get_hw_frames_ctx(self.as_ptr()) }.is_null()
  }

  // ========================================================================
  // Data Access
  // ========================================================================

  /// Number of data planes (0 when no buffers are attached)
  pub fn nb_planes(&self) -> usize {
    unsafe { avk_frame_plane_count(self.as_ptr()) }.max(0) as usize
  }

  /// Stride of `plane` in bytes
  #[inline]
  pub fn linesize(&self, plane: usize) -> i32 {
    unsafe { avk_frame_linesize(self.as_ptr(), plane as i32) }
  }

  /// Raw pointer to `plane`, NULL past the last plane
  pub fn data(&self, plane: usize) -> *const u8 {
    unsafe { avk_frame_data_const(self.as_ptr(), plane as i32) }
  }

  pub fn data_mut(&mut self, plane: usize) -> *mut u8 {
    unsafe { avk_frame_data(self.as_mut_ptr(), plane as i32) }
  }

  /// Bytes of `plane`, including line padding
  pub fn plane(&self, plane: usize) -> Option<&[u8]> {
    let ptr = self.data(plane);
    let size = unsafe { avk_frame_plane_size(self.as_ptr(), plane as i32) };
    if ptr.is_null() || size <= 0 {
      return None;
    }
    Some(unsafe { std::slice::from_raw_parts(ptr, size as usize) })
  }

  /// Mutable bytes of `plane`
  ///
  /// The buffer may be shared with other frames; call
  /// [`make_writable`](Self::make_writable) first when it was not freshly
  /// allocated.
  pub fn plane_mut(&mut self, plane: usize) -> Option<&mut [u8]> {
    let size = unsafe { avk_frame_plane_size(self.as_ptr(), plane as i32) };
    let ptr = self.data_mut(plane);
    if ptr.is_null() || size <= 0 {
      return None;
    }
    Some(unsafe { std::slice::from_raw_parts_mut(ptr, size as usize) })
  }

  // ========================================================================
  // Buffers
  // ========================================================================

  /// Allocate buffers for the format and size fields already set
  ///
  /// Video needs width, height and pixel format; audio needs nb_samples,
  /// sample format and channel layout. `align` 0 picks one for the CPU.
  pub fn get_buffer(&mut self, align: i32) -> Result<()> {
    let ret = unsafe { av_frame_get_buffer(self.as_mut_ptr(), align) };
    check_config("av_frame_get_buffer", ret)?;
    Ok(())
  }

  /// Ensure the buffers are not shared, copying them if they are
  pub fn make_writable(&mut self) -> Result<()> {
    let ret = unsafe { av_frame_make_writable(self.as_mut_ptr()) };
    check("av_frame_make_writable", ret)?;
    Ok(())
  }

  /// Bytes needed to hold the image packed with lines aligned to `align`
  pub fn image_buffer_size(&self, align: i32) -> Result<usize> {
    let ret =
      unsafe { av_image_get_buffer_size(self.format(), self.width(), self.height(), align) };
    check("av_image_get_buffer_size", ret).map(|size| size as usize)
  }

  /// Copy the image into `dst` packed, returning the bytes written
  pub fn copy_image_to(&self, dst: &mut [u8], align: i32) -> Result<usize> {
    let needed = self.image_buffer_size(align)?;
    if dst.len() < needed {
      return Err(Error::invalid_argument(
        "av_image_copy_to_buffer",
        format!("buffer holds {} bytes, image needs {}", dst.len(), needed),
      ));
    }
    let size = i32::try_from(dst.len()).unwrap_or(i32::MAX);
    let ret = unsafe {
      av_image_copy_to_buffer(
        dst.as_mut_ptr(),
        size,
        avk_frame_data_array(self.as_ptr()),
        avk_frame_linesize_array(self.as_ptr()),
        self.format(),
        self.width(),
        self.height(),
        align,
      )
    };
    check("av_image_copy_to_buffer", ret).map(|written| written as usize)
  }

  // ========================================================================
  // References
  // ========================================================================

  /// Drop the data references and reset the fields, keeping the frame
  pub fn unref(&mut self) {
    unsafe { av_frame_unref(self.as_mut_ptr()) }
  }

  /// Make this frame reference the same data as `src`
  ///
  /// The frame must be empty (freshly allocated or unref'd).
  pub fn ref_from(&mut self, src: &Frame) -> Result<()> {
    let ret = unsafe { av_frame_ref(self.as_mut_ptr(), src.as_ptr()) };
    check("av_frame_ref", ret)?;
    Ok(())
  }

  /// New owned frame referencing the same data
  pub fn try_clone(&self) -> Result<OwnedFrame> {
    let ptr = unsafe { av_frame_clone(self.as_ptr()) };
    Ok(OwnedFrame {
      ptr: non_null("av_frame_clone", ptr)?,
    })
  }
}

impl fmt::Debug for Frame {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut s = f.debug_struct("Frame");
    if self.nb_samples() > 0 {
      s.field("sample_fmt", &self.sample_fmt())
        .field("nb_samples", &self.nb_samples())
        .field("sample_rate", &self.sample_rate())
        .field("nb_channels", &self.nb_channels());
    } else {
      s.field("width", &self.width())
        .field("height", &self.height())
        .field("pix_fmt", &self.pix_fmt());
    }
    s.field("pts", &self.pts()).finish()
  }
}

// ============================================================================
// Owned Frame
// ============================================================================

/// Owned AVFrame with RAII cleanup
pub struct OwnedFrame {
  ptr: NonNull<AVFrame>,
}

impl OwnedFrame {
  /// Allocate an empty frame
  pub fn new() -> Result<Self> {
    let ptr = unsafe { av_frame_alloc() };
    Ok(Self {
      ptr: non_null("av_frame_alloc", ptr)?,
    })
  }

  /// Allocate a video frame with buffers
  pub fn new_video(width: i32, height: i32, pix_fmt: AVPixelFormat, align: i32) -> Result<Self> {
    let mut frame = Self::new()?;
    frame.set_width(width);
    frame.set_height(height);
    frame.set_pix_fmt(pix_fmt);
    frame.get_buffer(align)?;
    Ok(frame)
  }

  /// Allocate an audio frame with buffers
  pub fn new_audio(
    nb_samples: i32,
    sample_fmt: AVSampleFormat,
    sample_rate: i32,
    layout: &ChannelLayout,
  ) -> Result<Self> {
    let mut frame = Self::new()?;
    frame.set_nb_samples(nb_samples);
    frame.set_sample_fmt(sample_fmt);
    frame.set_sample_rate(sample_rate);
    frame.set_ch_layout(layout)?;
    frame.get_buffer(0)?;
    Ok(frame)
  }
}

impl Deref for OwnedFrame {
  type Target = Frame;

  fn deref(&self) -> &Frame {
    unsafe { Frame::from_ptr(self.ptr.as_ptr()) }
  }
}

impl DerefMut for OwnedFrame {
  fn deref_mut(&mut self) -> &mut Frame {
    unsafe { Frame::from_mut_ptr(self.ptr.as_ptr()) }
  }
}

impl Drop for OwnedFrame {
  fn drop(&mut self) {
    let mut ptr = self.ptr.as_ptr();
    unsafe { av_frame_free(&mut ptr) };
  }
}

// The frame is exclusively owned; its buffers are refcounted atomically
unsafe impl Send for OwnedFrame {}

impl fmt::Debug for OwnedFrame {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&**self, f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_frame_allocation() {
    let frame = OwnedFrame::new().unwrap();
    assert_eq!(frame.width(), 0);
    assert_eq!(frame.height(), 0);
    assert_eq!(frame.nb_planes(), 0);
    assert!(frame.plane(0).is_none());
    assert!(!frame.is_hw_frame());
  }

  #[test]
  fn test_video_frame_allocation() {
    let frame = OwnedFrame::new_video(64, 48, AVPixelFormat::YUV420P, 32).unwrap();
    assert_eq!(frame.width(), 64);
    assert_eq!(frame.height(), 48);
    assert_eq!(frame.pix_fmt(), AVPixelFormat::YUV420P);
    assert_eq!(frame.nb_planes(), 3);

    let luma = frame.plane(0).unwrap();
    assert_eq!(luma.len(), frame.linesize(0) as usize * 48);
    let chroma = frame.plane(1).unwrap();
    assert_eq!(chroma.len(), frame.linesize(1) as usize * 24);
    assert!(frame.plane(3).is_none());
  }

  #[test]
  fn test_get_buffer_without_size_fails() {
    let mut frame = OwnedFrame::new().unwrap();
    frame.set_pix_fmt(AVPixelFormat::RGBA);
    assert!(matches!(
      frame.get_buffer(0),
      Err(Error::Configuration {
        op: "av_frame_get_buffer",
        ..
      })
    ));
  }

  #[test]
  fn test_image_buffer_size_and_copy() {
    let mut frame = OwnedFrame::new_video(4, 2, AVPixelFormat::RGBA, 32).unwrap();
    assert_eq!(frame.image_buffer_size(1).unwrap(), 4 * 2 * 4);

    let stride = frame.linesize(0) as usize;
    let plane = frame.plane_mut(0).unwrap();
    for row in 0..2 {
      for byte in 0..16 {
        plane[row * stride + byte] = (row * 16 + byte) as u8;
      }
    }

    let mut packed = vec![0u8; 32];
    let written = frame.copy_image_to(&mut packed, 1).unwrap();
    assert_eq!(written, 32);
    assert_eq!(packed, (0..32).map(|v| v as u8).collect::<Vec<_>>());

    let mut short = vec![0u8; 8];
    assert!(frame.copy_image_to(&mut short, 1).is_err());
  }

  #[test]
  fn test_audio_planes() {
    let layout = ChannelLayout::from_name("5.0").unwrap();
    let frame = OwnedFrame::new_audio(1024, AVSampleFormat::Fltp, 48000, &layout).unwrap();
    assert_eq!(frame.nb_planes(), 5);
    assert_eq!(frame.nb_channels(), 5);
    assert!(frame.plane(4).unwrap().len() >= 1024 * 4);
    assert!(frame.plane(5).is_none());
    assert_eq!(frame.ch_layout().unwrap(), layout);

    let stereo = ChannelLayout::default_for(2);
    let packed = OwnedFrame::new_audio(256, AVSampleFormat::S16, 44100, &stereo).unwrap();
    assert_eq!(packed.nb_planes(), 1);
    assert!(packed.plane(0).unwrap().len() >= 256 * 2 * 2);
  }

  #[test]
  fn test_clone_and_unref() {
    let mut frame = OwnedFrame::new_video(16, 16, AVPixelFormat::GRAY8, 0).unwrap();
    frame.set_pts(42);
    let clone = frame.try_clone().unwrap();
    assert_eq!(clone.pts(), 42);
    assert_eq!(clone.data(0), frame.data(0));

    frame.unref();
    assert_eq!(frame.nb_planes(), 0);
    assert_eq!(clone.width(), 16);

    frame.ref_from(&clone).unwrap();
    assert_eq!(frame.width(), 16);
  }

  #[test]
  fn test_frames_move_through_containers() {
    let frames: Vec<OwnedFrame> = (0..4)
      .map(|i| {
        let mut f = OwnedFrame::new().unwrap();
        f.set_pts(i);
        f
      })
      .collect();
    let moved: Vec<_> = frames.into_iter().rev().collect();
    assert_eq!(moved[0].pts(), 3);
  }
}
