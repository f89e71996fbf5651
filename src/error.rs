//! Error taxonomy and the three-way operation outcome
//!
//! Fatal conditions are [`Error`] values carrying the name of the failing
//! native function. "Try again" and "end of stream" are not errors; data-flow
//! calls report them through [`Outcome`].

use std::os::raw::c_int;

use crate::ffi::error::{AVERROR_EAGAIN, AVERROR_EINVAL, AVERROR_ENOMEM, AVERROR_EOF};
use crate::ffi::FFmpegError;

/// Wrapper error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A native allocation returned NULL or `AVERROR(ENOMEM)`
  #[error("{op}: cannot allocate memory")]
  Allocation { op: &'static str },

  /// Invalid arguments, a lookup that found nothing, or a failed
  /// open/init/configure step
  #[error("{op}: {source}")]
  Configuration {
    op: &'static str,
    #[source]
    source: FFmpegError,
  },

  /// Any other negative status from a native call
  #[error("{op}: {source}")]
  Native {
    op: &'static str,
    #[source]
    source: FFmpegError,
  },

  /// A validated view was requested over a handle of the wrong kind
  #[error("expected a {expected} filter, found {found}")]
  TypeMismatch {
    expected: &'static str,
    found: String,
  },

  /// An operation was called in a state that does not allow it
  #[error("{op}: not allowed while {state}")]
  InvalidState {
    op: &'static str,
    state: &'static str,
  },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
  /// Name of the operation that failed
  pub fn op(&self) -> &'static str {
    match self {
      Self::Allocation { op }
      | Self::Configuration { op, .. }
      | Self::Native { op, .. }
      | Self::InvalidState { op, .. } => op,
      Self::TypeMismatch { .. } => "validate filter",
    }
  }

  /// Native status code, when the error came from one
  pub fn code(&self) -> Option<c_int> {
    match self {
      Self::Allocation { .. } => Some(AVERROR_ENOMEM),
      Self::Configuration { source, .. } | Self::Native { source, .. } => Some(source.code),
      Self::TypeMismatch { .. } | Self::InvalidState { .. } => None,
    }
  }

  /// Configuration error for a lookup that returned NULL
  pub(crate) fn not_found(op: &'static str, what: impl std::fmt::Display) -> Self {
    Self::Configuration {
      op,
      source: FFmpegError::new(AVERROR_EINVAL, format!("{} not found", what)),
    }
  }

  /// Configuration error for an argument rejected before reaching FFmpeg
  pub(crate) fn invalid_argument(op: &'static str, message: impl Into<String>) -> Self {
    Self::Configuration {
      op,
      source: FFmpegError::new(AVERROR_EINVAL, message),
    }
  }
}

/// Classify a negative status code returned by `op`
pub(crate) fn from_status(op: &'static str, code: c_int) -> Error {
  let source = FFmpegError::from_code(code);
  if source.is_oom() {
    Error::Allocation { op }
  } else if source.is_invalid() || source.is_not_found() {
    Error::Configuration { op, source }
  } else {
    Error::Native { op, source }
  }
}

/// Check a status code where every negative value is fatal
#[inline]
pub(crate) fn check(op: &'static str, ret: c_int) -> Result<c_int> {
  if ret < 0 {
    Err(from_status(op, ret))
  } else {
    Ok(ret)
  }
}

/// Check the status of an open/init/configure step
///
/// Everything except out-of-memory is a configuration failure here, whatever
/// the code: a codec refusing its parameters may report any error.
#[inline]
pub(crate) fn check_config(op: &'static str, ret: c_int) -> Result<c_int> {
  if ret >= 0 {
    Ok(ret)
  } else if ret == AVERROR_ENOMEM {
    Err(Error::Allocation { op })
  } else {
    Err(Error::Configuration {
      op,
      source: FFmpegError::from_code(ret),
    })
  }
}

/// Turn a NULL handle into an allocation error
#[inline]
pub(crate) fn non_null<T>(op: &'static str, ptr: *mut T) -> Result<std::ptr::NonNull<T>> {
  std::ptr::NonNull::new(ptr).ok_or(Error::Allocation { op })
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of a data-flow call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
  /// The operation produced or accepted a unit
  Ready(T),
  /// Nothing available yet: supply more input (or drain output) and retry
  RetryLater,
  /// No more output will ever be produced
  EndOfStream,
}

impl<T> Outcome<T> {
  pub fn is_ready(&self) -> bool {
    matches!(self, Self::Ready(_))
  }

  pub fn is_retry_later(&self) -> bool {
    matches!(self, Self::RetryLater)
  }

  pub fn is_end_of_stream(&self) -> bool {
    matches!(self, Self::EndOfStream)
  }

  /// The produced value, if any
  pub fn ready(self) -> Option<T> {
    match self {
      Self::Ready(value) => Some(value),
      _ => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
    match self {
      Self::Ready(value) => Outcome::Ready(f(value)),
      Self::RetryLater => Outcome::RetryLater,
      Self::EndOfStream => Outcome::EndOfStream,
    }
  }
}

/// Check a data-flow status code: EAGAIN and EOF become outcomes, other
/// negative codes are fatal
#[inline]
pub(crate) fn outcome(op: &'static str, ret: c_int) -> Result<Outcome<c_int>> {
  if ret >= 0 {
    Ok(Outcome::Ready(ret))
  } else if ret == AVERROR_EAGAIN {
    Ok(Outcome::RetryLater)
  } else if ret == AVERROR_EOF {
    Ok(Outcome::EndOfStream)
  } else {
    Err(from_status(op, ret))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ffi::error::{AVERROR_DECODER_NOT_FOUND, AVERROR_INVALIDDATA};

  #[test]
  fn test_check_passes_non_negative() {
    assert_eq!(check("av_op", 0).unwrap(), 0);
    assert_eq!(check("av_op", 42).unwrap(), 42);
  }

  #[test]
  fn test_classification() {
    assert!(matches!(
      check("av_frame_get_buffer", AVERROR_ENOMEM),
      Err(Error::Allocation {
        op: "av_frame_get_buffer"
      })
    ));
    assert!(matches!(
      check("avcodec_open2", AVERROR_EINVAL),
      Err(Error::Configuration {
        op: "avcodec_open2",
        ..
      })
    ));
    assert!(matches!(
      check("av_find_best_stream", AVERROR_DECODER_NOT_FOUND),
      Err(Error::Configuration { .. })
    ));
    assert!(matches!(
      check("av_read_frame", AVERROR_INVALIDDATA),
      Err(Error::Native {
        op: "av_read_frame",
        ..
      })
    ));
  }

  #[test]
  fn test_check_treats_eagain_as_fatal() {
    let err = check("avio_open", AVERROR_EAGAIN).unwrap_err();
    assert_eq!(err.code(), Some(AVERROR_EAGAIN));
  }

  #[test]
  fn test_check_config() {
    assert!(matches!(
      check_config("avfilter_graph_config", AVERROR_INVALIDDATA),
      Err(Error::Configuration {
        op: "avfilter_graph_config",
        ..
      })
    ));
    assert!(matches!(
      check_config("avfilter_graph_config", AVERROR_ENOMEM),
      Err(Error::Allocation { .. })
    ));
  }

  #[test]
  fn test_outcome_mapping() {
    assert_eq!(outcome("recv", 0).unwrap(), Outcome::Ready(0));
    assert_eq!(outcome("recv", AVERROR_EAGAIN).unwrap(), Outcome::RetryLater);
    assert_eq!(outcome("recv", AVERROR_EOF).unwrap(), Outcome::EndOfStream);
    assert!(outcome("recv", AVERROR_INVALIDDATA).is_err());
  }

  #[test]
  fn test_display_carries_op_and_message() {
    let err = check("av_read_frame", AVERROR_EOF).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("av_read_frame: "), "{}", text);
    assert_eq!(err.op(), "av_read_frame");
  }

  #[test]
  fn test_non_null() {
    let mut value = 5u8;
    assert!(non_null("alloc", &mut value as *mut u8).is_ok());
    assert!(matches!(
      non_null::<u8>("av_packet_alloc", std::ptr::null_mut()),
      Err(Error::Allocation {
        op: "av_packet_alloc"
      })
    ));
  }

  #[test]
  fn test_outcome_helpers() {
    let ready: Outcome<i32> = Outcome::Ready(3);
    assert!(ready.is_ready());
    assert_eq!(ready.map(|v| v * 2), Outcome::Ready(6));
    assert_eq!(Outcome::<i32>::EndOfStream.ready(), None);
    assert!(Outcome::<()>::RetryLater.is_retry_later());
  }
}
