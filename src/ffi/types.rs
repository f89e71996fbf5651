//! Core FFmpeg type definitions
//!
//! Most FFmpeg structs are opaque (zero-sized) to avoid version-specific layout
//! dependencies. Field access is done via the thin C accessor library in
//! accessors.c. The few value types that are passed by value or embedded
//! (`AVRational`, `AVChannelLayout`, `AVDictionaryEntry`) carry their real
//! layout, which has been stable since FFmpeg 5.1.

use std::ffi::{c_char, c_void};
use std::marker::PhantomData;
use std::os::raw::c_int;

// ============================================================================
// Rational Number
// ============================================================================

/// Rational number for time bases and frame rates
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AVRational {
  /// Numerator
  pub num: c_int,
  /// Denominator
  pub den: c_int,
}

impl AVRational {
  pub const fn new(num: c_int, den: c_int) -> Self {
    Self { num, den }
  }

  pub fn as_f64(&self) -> f64 {
    if self.den == 0 {
      0.0
    } else {
      self.num as f64 / self.den as f64
    }
  }

  /// Swap numerator and denominator (frame rate <-> frame duration)
  pub const fn invert(self) -> Self {
    Self {
      num: self.den,
      den: self.num,
    }
  }

  /// Microsecond time base (1/1000000), the unit of `AV_TIME_BASE`
  pub const MICROSECONDS: Self = Self {
    num: 1,
    den: 1_000_000,
  };
}

// ============================================================================
// Codec IDs
// ============================================================================

/// Codec identifier
///
/// A transparent newtype rather than an enum: libavcodec grows this list every
/// release and any value it hands back must round-trip unchanged.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AVCodecID(pub c_int);

impl AVCodecID {
  pub const NONE: Self = Self(0);
  pub const MJPEG: Self = Self(7);
  pub const MPEG4: Self = Self(12);
  pub const RAWVIDEO: Self = Self(13);
  pub const H264: Self = Self(27);
  pub const VP8: Self = Self(139);
  pub const VP9: Self = Self(167);
  pub const HEVC: Self = Self(173);
  pub const AV1: Self = Self(226);
  pub const PCM_S16LE: Self = Self(0x10000);
  pub const MP2: Self = Self(0x15000);
  pub const MP3: Self = Self(0x15001);
  pub const AAC: Self = Self(0x15002);

  /// Get the raw FFmpeg codec ID value
  pub fn as_raw(&self) -> c_int {
    self.0
  }
}

// ============================================================================
// Media Types
// ============================================================================

/// Kind of elementary stream
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVMediaType {
  Unknown = -1,
  Video = 0,
  Audio = 1,
  Data = 2,
  Subtitle = 3,
  Attachment = 4,
}

impl AVMediaType {
  pub fn from_raw(raw: c_int) -> Self {
    match raw {
      0 => Self::Video,
      1 => Self::Audio,
      2 => Self::Data,
      3 => Self::Subtitle,
      4 => Self::Attachment,
      _ => Self::Unknown,
    }
  }

  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }
}

// ============================================================================
// Pixel Formats
// ============================================================================

/// Video pixel format
///
/// Software formats below have had fixed values for a long time. Hardware
/// surface formats (vaapi, cuda, videotoolbox, ...) moved between releases, so
/// look them up with [`AVPixelFormat::from_name`] instead of hardcoding them.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AVPixelFormat(pub c_int);

impl AVPixelFormat {
  pub const NONE: Self = Self(-1);
  pub const YUV420P: Self = Self(0);
  pub const YUYV422: Self = Self(1);
  pub const RGB24: Self = Self(2);
  pub const BGR24: Self = Self(3);
  pub const YUV422P: Self = Self(4);
  pub const YUV444P: Self = Self(5);
  pub const GRAY8: Self = Self(8);
  pub const NV12: Self = Self(23);
  pub const NV21: Self = Self(24);
  pub const ARGB: Self = Self(25);
  pub const RGBA: Self = Self(26);
  pub const ABGR: Self = Self(27);
  pub const BGRA: Self = Self(28);
  pub const YUVA420P: Self = Self(33);

  pub fn as_raw(&self) -> c_int {
    self.0
  }

  pub fn is_none(&self) -> bool {
    self.0 < 0
  }
}

// ============================================================================
// Sample Formats
// ============================================================================

/// Audio sample format
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVSampleFormat {
  None = -1,
  U8 = 0,
  S16 = 1,
  S32 = 2,
  Flt = 3,
  Dbl = 4,
  U8p = 5,
  S16p = 6,
  S32p = 7,
  Fltp = 8,
  Dblp = 9,
  S64 = 10,
  S64p = 11,
}

impl AVSampleFormat {
  pub fn from_raw(raw: c_int) -> Self {
    match raw {
      0 => Self::U8,
      1 => Self::S16,
      2 => Self::S32,
      3 => Self::Flt,
      4 => Self::Dbl,
      5 => Self::U8p,
      6 => Self::S16p,
      7 => Self::S32p,
      8 => Self::Fltp,
      9 => Self::Dblp,
      10 => Self::S64,
      11 => Self::S64p,
      _ => Self::None,
    }
  }

  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }
}

// ============================================================================
// Hardware Device Types
// ============================================================================

/// Hardware device types for acceleration
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVHWDeviceType {
  None = 0,
  Vdpau = 1,
  Cuda = 2,
  Vaapi = 3,
  Dxva2 = 4,
  Qsv = 5,
  Videotoolbox = 6,
  D3d11va = 7,
  Drm = 8,
  Opencl = 9,
  Mediacodec = 10,
  Vulkan = 11,
}

impl AVHWDeviceType {
  pub fn from_raw(raw: c_int) -> Self {
    match raw {
      1 => Self::Vdpau,
      2 => Self::Cuda,
      3 => Self::Vaapi,
      4 => Self::Dxva2,
      5 => Self::Qsv,
      6 => Self::Videotoolbox,
      7 => Self::D3d11va,
      8 => Self::Drm,
      9 => Self::Opencl,
      10 => Self::Mediacodec,
      11 => Self::Vulkan,
      _ => Self::None,
    }
  }

  /// Get the raw FFmpeg hardware device type value
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }
}

// ============================================================================
// Value Structs
// ============================================================================

/// Channel layout (FFmpeg 5.1+ `AVChannelLayout`)
///
/// `u` is the `mask`/`map` union; the mask member is the only one read here.
#[repr(C)]
#[derive(Debug)]
pub struct AVChannelLayout {
  pub order: c_int,
  pub nb_channels: c_int,
  pub u: u64,
  pub opaque: *mut c_void,
}

impl Default for AVChannelLayout {
  fn default() -> Self {
    Self {
      order: 0,
      nb_channels: 0,
      u: 0,
      opaque: std::ptr::null_mut(),
    }
  }
}

/// One key/value pair of an `AVDictionary`
#[repr(C)]
pub struct AVDictionaryEntry {
  pub key: *mut c_char,
  pub value: *mut c_char,
}

// ============================================================================
// Opaque Types
// ============================================================================

macro_rules! opaque_types {
  ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
    $(
      $(#[$meta])*
      #[repr(C)]
      pub struct $name {
        _opaque: [u8; 0],
        _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
      }
    )*
  };
}

opaque_types! {
  /// Codec implementation descriptor
  AVCodec,
  /// Encoder/decoder instance
  AVCodecContext,
  /// Stream codec parameters
  AVCodecParameters,
  /// Hardware configuration entry of a codec
  AVCodecHWConfig,
  /// Uncompressed video/audio data
  AVFrame,
  /// Compressed data
  AVPacket,
  /// Reference-counted buffer
  AVBufferRef,
  /// Key-value options
  AVDictionary,
  /// Software scaler context
  SwsContext,
  /// Software resampler context
  SwrContext,
  /// Hardware frames pool (the `data` of a frames `AVBufferRef`)
  AVHWFramesContext,
  /// Container context
  AVFormatContext,
  /// Container output format
  AVOutputFormat,
  /// Container input format
  AVInputFormat,
  /// Elementary stream inside a container
  AVStream,
  /// Byte I/O context
  AVIOContext,
  /// Filter implementation descriptor
  AVFilter,
  /// Filter instance inside a graph
  AVFilterContext,
  /// Filter graph
  AVFilterGraph,
  /// Open pad list used by graph parsing
  AVFilterInOut,
  /// Extra parameters for a buffer source
  AVBufferSrcParameters,
}

// ============================================================================
// Constants
// ============================================================================

/// No timestamp value
pub const AV_NOPTS_VALUE: i64 = 0x8000000000000000u64 as i64;

/// Internal time base, in microseconds
pub const AV_TIME_BASE: i64 = 1_000_000;

/// Packet flags
pub mod pkt_flag {
  use std::os::raw::c_int;

  pub const KEY: c_int = 0x0001;
  pub const CORRUPT: c_int = 0x0002;
  pub const DISCARD: c_int = 0x0004;
}

/// Stream disposition flags
pub mod disposition {
  use std::os::raw::c_int;

  pub const DEFAULT: c_int = 1 << 0;
  pub const ATTACHED_PIC: c_int = 1 << 10;
}

/// Seek flags for `av_seek_frame`/`avformat_seek_file`
pub mod seek_flag {
  use std::os::raw::c_int;

  pub const BACKWARD: c_int = 1;
  pub const BYTE: c_int = 2;
  pub const ANY: c_int = 4;
  pub const FRAME: c_int = 8;
}

/// Search child objects too (`AV_OPT_SEARCH_CHILDREN`)
pub const AV_OPT_SEARCH_CHILDREN: c_int = 1 << 0;

/// Output format needs no `AVIOContext` (`AVFMT_NOFILE`)
pub const AVFMT_NOFILE: c_int = 0x0001;

/// Output format wants global headers (`AVFMT_GLOBALHEADER`)
pub const AVFMT_GLOBALHEADER: c_int = 0x0040;

/// `avio_open` write mode
pub const AVIO_FLAG_WRITE: c_int = 2;

/// Keep a reference to the frame passed to the buffer source
pub const AV_BUFFERSRC_FLAG_KEEP_REF: c_int = 8;

/// `AVCodecHWConfig::methods` bits
pub mod hw_config_method {
  use std::os::raw::c_int;

  pub const HW_DEVICE_CTX: c_int = 0x01;
  pub const HW_FRAMES_CTX: c_int = 0x02;
}
