//! Native FFmpeg status codes
//!
//! `AVERROR_*` constants and the `FFmpegError` value that carries a negative
//! status together with its `av_strerror` text.

use std::ffi::CStr;
use std::fmt;
use std::os::raw::{c_char, c_int};

// ============================================================================
// Status Codes
// ============================================================================

/// `FFERRTAG`: FFmpeg's own codes are negated four-character tags
const fn fferrtag(a: u8, b: u8, c: u8, d: u8) -> c_int {
  -((a as c_int) | ((b as c_int) << 8) | ((c as c_int) << 16) | ((d as c_int) << 24))
}

pub const AVERROR_EOF: c_int = fferrtag(b'E', b'O', b'F', b' ');
pub const AVERROR_INVALIDDATA: c_int = fferrtag(b'I', b'N', b'D', b'A');

// Failed lookups
pub const AVERROR_BSF_NOT_FOUND: c_int = fferrtag(0xF8, b'B', b'S', b'F');
pub const AVERROR_DECODER_NOT_FOUND: c_int = fferrtag(0xF8, b'D', b'E', b'C');
pub const AVERROR_DEMUXER_NOT_FOUND: c_int = fferrtag(0xF8, b'D', b'E', b'M');
pub const AVERROR_ENCODER_NOT_FOUND: c_int = fferrtag(0xF8, b'E', b'N', b'C');
pub const AVERROR_FILTER_NOT_FOUND: c_int = fferrtag(0xF8, b'F', b'I', b'L');
pub const AVERROR_MUXER_NOT_FOUND: c_int = fferrtag(0xF8, b'M', b'U', b'X');
pub const AVERROR_OPTION_NOT_FOUND: c_int = fferrtag(0xF8, b'O', b'P', b'T');
pub const AVERROR_PROTOCOL_NOT_FOUND: c_int = fferrtag(0xF8, b'P', b'R', b'O');
pub const AVERROR_STREAM_NOT_FOUND: c_int = fferrtag(0xF8, b'S', b'T', b'R');

// Negated errno values. EAGAIN is the only one that differs by platform.

#[cfg(target_os = "macos")]
pub const AVERROR_EAGAIN: c_int = -35;
#[cfg(not(target_os = "macos"))]
pub const AVERROR_EAGAIN: c_int = -11;

pub const AVERROR_ENOMEM: c_int = -12;
pub const AVERROR_EINVAL: c_int = -22;

// ============================================================================
// FFmpeg Error Type
// ============================================================================

/// A negative native status and its text
#[derive(Clone, PartialEq, Eq)]
pub struct FFmpegError {
  pub code: c_int,
  pub message: String,
}

impl FFmpegError {
  /// Describe `code` with `av_strerror`
  pub fn from_code(code: c_int) -> Self {
    let mut buf = [0 as c_char; 256];
    let message = unsafe {
      if super::avutil::av_strerror(code, buf.as_mut_ptr(), buf.len()) < 0 {
        format!("unknown error {}", code)
      } else {
        CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
      }
    };
    Self { code, message }
  }

  pub fn new(code: c_int, message: impl Into<String>) -> Self {
    Self {
      code,
      message: message.into(),
    }
  }

  #[inline]
  pub fn is_eagain(&self) -> bool {
    self.code == AVERROR_EAGAIN
  }

  #[inline]
  pub fn is_eof(&self) -> bool {
    self.code == AVERROR_EOF
  }

  #[inline]
  pub fn is_invalid(&self) -> bool {
    self.code == AVERROR_EINVAL
  }

  #[inline]
  pub fn is_oom(&self) -> bool {
    self.code == AVERROR_ENOMEM
  }

  /// A codec, format, filter, option, protocol or stream lookup came up empty
  pub fn is_not_found(&self) -> bool {
    matches!(
      self.code,
      AVERROR_BSF_NOT_FOUND
        | AVERROR_DECODER_NOT_FOUND
        | AVERROR_DEMUXER_NOT_FOUND
        | AVERROR_ENCODER_NOT_FOUND
        | AVERROR_FILTER_NOT_FOUND
        | AVERROR_MUXER_NOT_FOUND
        | AVERROR_OPTION_NOT_FOUND
        | AVERROR_PROTOCOL_NOT_FOUND
        | AVERROR_STREAM_NOT_FOUND
    )
  }
}

impl fmt::Debug for FFmpegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FFmpegError")
      .field("code", &self.code)
      .field("message", &self.message)
      .finish()
  }
}

impl fmt::Display for FFmpegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.message, self.code)
  }
}

impl std::error::Error for FFmpegError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tag_values() {
    assert_eq!(AVERROR_EOF, -0x20464F45);
    assert_eq!(AVERROR_INVALIDDATA, -0x41444E49);
    assert_ne!(AVERROR_EOF, AVERROR_EAGAIN);
  }

  #[test]
  fn test_predicates() {
    assert!(FFmpegError::new(AVERROR_EAGAIN, "again").is_eagain());
    assert!(FFmpegError::new(AVERROR_EOF, "eof").is_eof());
    assert!(FFmpegError::new(AVERROR_ENOMEM, "oom").is_oom());
    assert!(FFmpegError::new(AVERROR_FILTER_NOT_FOUND, "nf").is_not_found());
    assert!(!FFmpegError::new(AVERROR_EINVAL, "inval").is_not_found());
  }

  #[test]
  fn test_from_code_has_message() {
    let err = FFmpegError::from_code(AVERROR_EOF);
    assert_eq!(err.code, AVERROR_EOF);
    assert!(!err.message.is_empty());
  }
}
