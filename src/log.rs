//! Bridge from FFmpeg's `av_log` to `tracing`
//!
//! FFmpeg prints to stderr by default. [`init`] replaces its callback with one
//! that formats each line in C and hands it to [`forward`], which emits it
//! as a `tracing` event under the `ffmpeg` target, so a subscriber can filter
//! it with `RUST_LOG=ffmpeg=debug`.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::Once;

use crate::ffi::accessors::avk_log_install;
use crate::ffi::avutil::{av_log_get_level, av_log_set_level, log_level};

static INSTALL: Once = Once::new();

/// FFmpeg log verbosity (`AV_LOG_*`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
  Quiet,
  Panic,
  Fatal,
  Error,
  Warning,
  Info,
  Verbose,
  Debug,
  Trace,
}

impl Level {
  pub fn as_raw(self) -> c_int {
    match self {
      Self::Quiet => log_level::QUIET,
      Self::Panic => log_level::PANIC,
      Self::Fatal => log_level::FATAL,
      Self::Error => log_level::ERROR,
      Self::Warning => log_level::WARNING,
      Self::Info => log_level::INFO,
      Self::Verbose => log_level::VERBOSE,
      Self::Debug => log_level::DEBUG,
      Self::Trace => log_level::TRACE,
    }
  }

  /// Closest level at or below `raw`
  pub fn from_raw(raw: c_int) -> Self {
    match raw {
      i32::MIN..=-1 => Self::Quiet,
      0..=7 => Self::Panic,
      8..=15 => Self::Fatal,
      16..=23 => Self::Error,
      24..=31 => Self::Warning,
      32..=39 => Self::Info,
      40..=47 => Self::Verbose,
      48..=55 => Self::Debug,
      _ => Self::Trace,
    }
  }
}

/// Route FFmpeg's log output into `tracing` and set its verbosity
///
/// The callback is installed once per process; later calls only change the
/// level.
pub fn init(level: Level) {
  INSTALL.call_once(|| {
    unsafe { avk_log_install(forward) };
    tracing::debug!(target: "avkit", "installed av_log bridge");
  });
  set_level(level);
}

/// Set FFmpeg's log level (`av_log_set_level`)
pub fn set_level(level: Level) {
  unsafe { av_log_set_level(level.as_raw()) };
}

/// Current FFmpeg log level
pub fn level() -> Level {
  Level::from_raw(unsafe { av_log_get_level() })
}

/// `tracing` level an `AV_LOG_*` value is emitted at
fn tracing_level(raw: c_int) -> tracing::Level {
  if raw <= log_level::ERROR {
    tracing::Level::ERROR
  } else if raw <= log_level::WARNING {
    tracing::Level::WARN
  } else if raw <= log_level::INFO {
    tracing::Level::INFO
  } else if raw <= log_level::DEBUG {
    tracing::Level::DEBUG
  } else {
    tracing::Level::TRACE
  }
}

unsafe extern "C" fn forward(level: c_int, line: *const c_char) {
  if line.is_null() {
    return;
  }
  let line = unsafe { CStr::from_ptr(line) }.to_string_lossy();
  let message = line.trim_end_matches(['\n', '\r']);
  if message.is_empty() {
    return;
  }

  // tracing needs the level as a constant at each call site
  match tracing_level(level) {
    tracing::Level::ERROR => tracing::error!(target: "ffmpeg", "{}", message),
    tracing::Level::WARN => tracing::warn!(target: "ffmpeg", "{}", message),
    tracing::Level::INFO => tracing::info!(target: "ffmpeg", "{}", message),
    tracing::Level::DEBUG => tracing::debug!(target: "ffmpeg", "{}", message),
    _ => tracing::trace!(target: "ffmpeg", "{}", message),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io;
  use std::os::raw::c_void;
  use std::sync::{Arc, Mutex};
  use std::thread;

  use crate::codec::{Codec, CodecContext};
  use crate::ffi::avutil::av_log;
  use crate::ffi::AVCodecID;

  #[test]
  fn test_level_round_trip() {
    for level in [
      Level::Quiet,
      Level::Panic,
      Level::Fatal,
      Level::Error,
      Level::Warning,
      Level::Info,
      Level::Verbose,
      Level::Debug,
      Level::Trace,
    ] {
      assert_eq!(Level::from_raw(level.as_raw()), level);
    }
  }

  #[test]
  fn test_tracing_level_mapping() {
    assert_eq!(tracing_level(log_level::PANIC), tracing::Level::ERROR);
    assert_eq!(tracing_level(log_level::FATAL), tracing::Level::ERROR);
    assert_eq!(tracing_level(log_level::ERROR), tracing::Level::ERROR);
    assert_eq!(tracing_level(log_level::WARNING), tracing::Level::WARN);
    assert_eq!(tracing_level(log_level::INFO), tracing::Level::INFO);
    assert_eq!(tracing_level(log_level::VERBOSE), tracing::Level::DEBUG);
    assert_eq!(tracing_level(log_level::DEBUG), tracing::Level::DEBUG);
    assert_eq!(tracing_level(log_level::TRACE), tracing::Level::TRACE);
  }

  #[test]
  fn test_init_is_idempotent() {
    init(Level::Warning);
    init(Level::Error);
    assert_eq!(level(), Level::Error);
  }

  #[test]
  fn test_forward_ignores_null_and_blank_lines() {
    unsafe {
      forward(log_level::INFO, std::ptr::null());
      forward(log_level::INFO, c"\n".as_ptr());
      forward(log_level::WARNING, c"[volume @ 0x1] something\n".as_ptr());
    }
  }

  #[derive(Clone, Default)]
  struct Capture(Arc<Mutex<Vec<u8>>>);

  impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn test_line_prefix_state_is_per_thread() {
    init(Level::Error);

    let workers: Vec<_> = (0..4)
      .map(|_| {
        thread::spawn(|| {
          let capture = Capture::default();
          let sink = capture.clone();
          let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .without_time()
            .finish();

          let codec = Codec::find_encoder(AVCodecID::PCM_S16LE).unwrap();
          let mut ctx = CodecContext::new(Some(codec)).unwrap();
          let avcl = ctx.as_mut_ptr() as *mut c_void;
          tracing::subscriber::with_default(subscriber, || {
            for _ in 0..200 {
              unsafe {
                av_log(avcl, log_level::ERROR, c"%s".as_ptr(), c"head ".as_ptr());
                av_log(avcl, log_level::ERROR, c"%s".as_ptr(), c"tail\n".as_ptr());
                av_log(avcl, log_level::ERROR, c"%s".as_ptr(), c"whole\n".as_ptr());
              }
            }
          });

          let text = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
          text
        })
      })
      .collect();

    for worker in workers {
      let text = worker.join().unwrap();
      let lines: Vec<&str> = text.lines().collect();
      assert_eq!(lines.len(), 600);
      for line in lines {
        let prefixed = line.contains(" @ 0x");
        if line.ends_with("tail") {
          assert!(!prefixed, "{line}");
        } else {
          assert!(prefixed, "{line}");
        }
      }
    }
  }
}
