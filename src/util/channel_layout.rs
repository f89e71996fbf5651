use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_char;

use crate::error::{check, check_config, Result};
use crate::ffi::avutil::*;
use crate::ffi::AVChannelLayout;

use super::cstring;

/// Owned `AVChannelLayout`
///
/// Custom-order layouts carry a heap-allocated channel map, so the value is
/// released with `av_channel_layout_uninit` and copied with
/// `av_channel_layout_copy`.
pub struct ChannelLayout {
  inner: AVChannelLayout,
}

impl ChannelLayout {
  /// Default native layout for `nb_channels` (mono, stereo, 5.0, ...)
  pub fn default_for(nb_channels: i32) -> Self {
    let mut inner = AVChannelLayout::default();
    unsafe { av_channel_layout_default(&mut inner, nb_channels) };
    Self { inner }
  }

  /// Parse a layout description such as "stereo", "5.0" or "FL+FR"
  pub fn from_name(name: &str) -> Result<Self> {
    let c_name = cstring("av_channel_layout_from_string", name)?;
    let mut inner = AVChannelLayout::default();
    let ret = unsafe { av_channel_layout_from_string(&mut inner, c_name.as_ptr()) };
    check_config("av_channel_layout_from_string", ret)?;
    Ok(Self { inner })
  }

  /// Copy a layout owned elsewhere
  ///
  /// # Safety
  /// `src` must point to an initialized layout.
  pub(crate) unsafe fn copy_from(src: *const AVChannelLayout) -> Result<Self> {
    let mut inner = AVChannelLayout::default();
    let ret = unsafe { av_channel_layout_copy(&mut inner, src) };
    check("av_channel_layout_copy", ret)?;
    Ok(Self { inner })
  }

  pub fn nb_channels(&self) -> i32 {
    self.inner.nb_channels
  }

  /// Human-readable description, as printed by ffmpeg ("5.0(side)")
  pub fn describe(&self) -> Result<String> {
    let mut buf = [0 as c_char; 128];
    let ret = unsafe { av_channel_layout_describe(&self.inner, buf.as_mut_ptr(), buf.len()) };
    check("av_channel_layout_describe", ret)?;
    Ok(
      unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned(),
    )
  }

  pub fn try_clone(&self) -> Result<Self> {
    unsafe { Self::copy_from(&self.inner) }
  }

  pub fn as_ptr(&self) -> *const AVChannelLayout {
    &self.inner
  }

  pub(crate) fn as_mut_ptr(&mut self) -> *mut AVChannelLayout {
    &mut self.inner
  }

  /// Uninitialized layout for functions that fill one in
  pub(crate) fn empty() -> Self {
    Self {
      inner: AVChannelLayout::default(),
    }
  }
}

impl PartialEq for ChannelLayout {
  fn eq(&self, other: &Self) -> bool {
    unsafe { av_channel_layout_compare(&self.inner, &other.inner) == 0 }
  }
}

impl Drop for ChannelLayout {
  fn drop(&mut self) {
    unsafe { av_channel_layout_uninit(&mut self.inner) };
  }
}

unsafe impl Send for ChannelLayout {}

impl fmt::Debug for ChannelLayout {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.describe() {
      Ok(desc) => f.debug_tuple("ChannelLayout").field(&desc).finish(),
      Err(_) => f
        .debug_struct("ChannelLayout")
        .field("nb_channels", &self.inner.nb_channels)
        .finish(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_for() {
    let stereo = ChannelLayout::default_for(2);
    assert_eq!(stereo.nb_channels(), 2);
    assert_eq!(stereo.describe().unwrap(), "stereo");

    let mono = ChannelLayout::default_for(1);
    assert_eq!(mono.describe().unwrap(), "mono");
  }

  #[test]
  fn test_from_name() {
    let layout = ChannelLayout::from_name("5.0").unwrap();
    assert_eq!(layout.nb_channels(), 5);
    assert!(ChannelLayout::from_name("not-a-layout").is_err());
  }

  #[test]
  fn test_equality_and_clone() {
    let a = ChannelLayout::from_name("stereo").unwrap();
    let b = a.try_clone().unwrap();
    assert_eq!(a, b);
    assert_ne!(a, ChannelLayout::default_for(1));
  }

  #[test]
  fn test_moves_do_not_double_free() {
    let layouts: Vec<ChannelLayout> = (1..=6).map(ChannelLayout::default_for).collect();
    let moved = layouts;
    assert_eq!(moved.len(), 6);
    assert_eq!(moved[5].nb_channels(), 6);
  }
}
