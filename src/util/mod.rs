//! Small helpers shared by the wrappers: options dictionaries, channel
//! layouts and sample-type mapping

mod channel_layout;
mod dictionary;

pub use channel_layout::ChannelLayout;
pub use dictionary::{Dictionary, DictionaryIter, DictionaryRef};

pub(crate) use dictionary::opts_ptr;

use std::ffi::CString;

use crate::error::{Error, Result};
use crate::ffi::AVSampleFormat;

/// Convert a Rust string for a native call, rejecting interior NUL bytes
pub(crate) fn cstring(op: &'static str, s: &str) -> Result<CString> {
  CString::new(s).map_err(|_| Error::invalid_argument(op, format!("{:?} contains a NUL byte", s)))
}

/// Round `x` up to the next multiple of 8
///
/// swscale writes whole SIMD blocks, so line strides handed to it should be
/// padded this way.
#[inline]
pub const fn nearest_multiple_8(x: i32) -> i32 {
  (x + 7) & !7
}

// ============================================================================
// Sample Types
// ============================================================================

/// Rust types that map onto an FFmpeg sample format
pub trait SampleType: Copy + Default + 'static {
  /// The packed (interleaved) sample format for this type
  const PACKED: AVSampleFormat;
  /// The planar sample format for this type
  const PLANAR: AVSampleFormat;
}

impl SampleType for u8 {
  const PACKED: AVSampleFormat = AVSampleFormat::U8;
  const PLANAR: AVSampleFormat = AVSampleFormat::U8p;
}

impl SampleType for i16 {
  const PACKED: AVSampleFormat = AVSampleFormat::S16;
  const PLANAR: AVSampleFormat = AVSampleFormat::S16p;
}

impl SampleType for i32 {
  const PACKED: AVSampleFormat = AVSampleFormat::S32;
  const PLANAR: AVSampleFormat = AVSampleFormat::S32p;
}

impl SampleType for f32 {
  const PACKED: AVSampleFormat = AVSampleFormat::Flt;
  const PLANAR: AVSampleFormat = AVSampleFormat::Fltp;
}

impl SampleType for f64 {
  const PACKED: AVSampleFormat = AVSampleFormat::Dbl;
  const PLANAR: AVSampleFormat = AVSampleFormat::Dblp;
}

impl SampleType for i64 {
  const PACKED: AVSampleFormat = AVSampleFormat::S64;
  const PLANAR: AVSampleFormat = AVSampleFormat::S64p;
}

/// Sample format for `T`, planar or interleaved
pub fn sample_fmt_for<T: SampleType>(planar: bool) -> AVSampleFormat {
  if planar {
    T::PLANAR
  } else {
    T::PACKED
  }
}

/// Whether samples of `fmt` are interleaved in a single plane
pub fn is_interleaved(fmt: AVSampleFormat) -> Result<bool> {
  use AVSampleFormat::*;

  match fmt {
    U8 | S16 | S32 | Flt | Dbl | S64 => Ok(true),
    U8p | S16p | S32p | Fltp | Dblp | S64p => Ok(false),
    None => Err(Error::invalid_argument(
      "is_interleaved",
      "sample format is not set",
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_nearest_multiple_8() {
    assert_eq!(nearest_multiple_8(0), 0);
    assert_eq!(nearest_multiple_8(1), 8);
    assert_eq!(nearest_multiple_8(8), 8);
    assert_eq!(nearest_multiple_8(1919), 1920);
    assert_eq!(nearest_multiple_8(1921), 1928);
  }

  #[test]
  fn test_sample_fmt_for() {
    assert_eq!(sample_fmt_for::<i16>(false), AVSampleFormat::S16);
    assert_eq!(sample_fmt_for::<i16>(true), AVSampleFormat::S16p);
    assert_eq!(sample_fmt_for::<f32>(true), AVSampleFormat::Fltp);
    assert_eq!(sample_fmt_for::<u8>(false), AVSampleFormat::U8);
    assert_eq!(sample_fmt_for::<i64>(false), AVSampleFormat::S64);
    assert_eq!(sample_fmt_for::<i64>(true), AVSampleFormat::S64p);
  }

  #[test]
  fn test_is_interleaved() {
    assert!(is_interleaved(AVSampleFormat::S16).unwrap());
    assert!(is_interleaved(AVSampleFormat::Dbl).unwrap());
    assert!(is_interleaved(AVSampleFormat::S64).unwrap());
    assert!(!is_interleaved(AVSampleFormat::Fltp).unwrap());
    assert!(!is_interleaved(AVSampleFormat::S64p).unwrap());
    assert!(is_interleaved(AVSampleFormat::None).is_err());
  }

  #[test]
  fn test_is_interleaved_agrees_with_ffmpeg() {
    for raw in 0..=11 {
      let fmt = AVSampleFormat::from_raw(raw);
      let planar = unsafe { crate::ffi::avutil::av_sample_fmt_is_planar(raw) } != 0;
      assert_eq!(is_interleaved(fmt).unwrap(), !planar, "{:?}", fmt);
    }
  }

  #[test]
  fn test_cstring_rejects_nul() {
    assert!(cstring("op", "ok").is_ok());
    let err = cstring("avfilter_get_by_name", "a\0b").unwrap_err();
    assert_eq!(err.op(), "avfilter_get_by_name");
  }
}
