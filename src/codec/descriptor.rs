//! Codec descriptor lookup

use std::fmt;
use std::ptr::NonNull;

use crate::error::{Error, Result};
use crate::ffi::{
  accessors::{
    avk_codec_id, avk_codec_long_name, avk_codec_name, avk_codec_type, avk_hwcfg_device_type,
    avk_hwcfg_methods, avk_hwcfg_pix_fmt,
  },
  avcodec::{
    av_codec_is_decoder, av_codec_is_encoder, avcodec_find_decoder, avcodec_find_decoder_by_name,
    avcodec_find_encoder, avcodec_find_encoder_by_name, avcodec_get_hw_config, avcodec_get_name,
  },
  avutil::static_str,
  hw_config_method, AVCodec, AVCodecID, AVHWDeviceType, AVMediaType, AVPixelFormat,
};
use crate::util::cstring;

/// A registered codec implementation
///
/// Codec descriptors are static tables inside libavcodec, so this is a
/// plain `Copy` handle.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Codec {
  ptr: NonNull<AVCodec>,
}

// Points at immutable static data
unsafe impl Send for Codec {}
unsafe impl Sync for Codec {}

impl Codec {
  pub fn find_decoder(id: AVCodecID) -> Result<Self> {
    let ptr = unsafe { avcodec_find_decoder(id.as_raw()) };
    Self::from_lookup("avcodec_find_decoder", ptr, || codec_id_name(id))
  }

  pub fn find_encoder(id: AVCodecID) -> Result<Self> {
    let ptr = unsafe { avcodec_find_encoder(id.as_raw()) };
    Self::from_lookup("avcodec_find_encoder", ptr, || codec_id_name(id))
  }

  /// Look up a decoder by name ("h264", "h264_cuvid", ...)
  pub fn find_decoder_by_name(name: &str) -> Result<Self> {
    let c_name = cstring("avcodec_find_decoder_by_name", name)?;
    let ptr = unsafe { avcodec_find_decoder_by_name(c_name.as_ptr()) };
    Self::from_lookup("avcodec_find_decoder_by_name", ptr, || name.to_string())
  }

  /// Look up an encoder by name ("libx264", "h264_vaapi", ...)
  pub fn find_encoder_by_name(name: &str) -> Result<Self> {
    let c_name = cstring("avcodec_find_encoder_by_name", name)?;
    let ptr = unsafe { avcodec_find_encoder_by_name(c_name.as_ptr()) };
    Self::from_lookup("avcodec_find_encoder_by_name", ptr, || name.to_string())
  }

  fn from_lookup(
    op: &'static str,
    ptr: *const AVCodec,
    what: impl FnOnce() -> String,
  ) -> Result<Self> {
    NonNull::new(ptr as *mut AVCodec)
      .map(|ptr| Self { ptr })
      .ok_or_else(|| Error::not_found(op, format!("codec {}", what())))
  }

  /// # Safety
  /// `ptr` must be NULL or a codec descriptor returned by libavcodec.
  pub(crate) unsafe fn from_ptr(ptr: *const AVCodec) -> Option<Self> {
    NonNull::new(ptr as *mut AVCodec).map(|ptr| Self { ptr })
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVCodec {
    self.ptr.as_ptr()
  }

  /// Short name ("h264_vaapi")
  pub fn name(&self) -> &'static str {
    unsafe { static_str(avk_codec_name(self.as_ptr())) }.unwrap_or("")
  }

  /// Descriptive name, when the codec has one
  pub fn long_name(&self) -> Option<&'static str> {
    unsafe { static_str(avk_codec_long_name(self.as_ptr())) }
  }

  pub fn id(&self) -> AVCodecID {
    AVCodecID(unsafe { avk_codec_id(self.as_ptr()) })
  }

  pub fn media_type(&self) -> AVMediaType {
    AVMediaType::from_raw(unsafe { avk_codec_type(self.as_ptr()) })
  }

  pub fn is_encoder(&self) -> bool {
    unsafe { av_codec_is_encoder(self.as_ptr()) != 0 }
  }

  pub fn is_decoder(&self) -> bool {
    unsafe { av_codec_is_decoder(self.as_ptr()) != 0 }
  }

  // ========================================================================
  // Hardware Configurations
  // ========================================================================

  /// Hardware configurations the codec supports, in preference order
  pub fn hw_configs(&self) -> HwConfigIter {
    HwConfigIter {
      codec: *self,
      index: 0,
    }
  }

  /// Pixel format a decoder outputs when driven by a `device_type` device
  ///
  /// Only configurations usable through a device context count, which is how
  /// `hw_decode` style pipelines attach hardware.
  pub fn hw_pix_fmt(&self, device_type: AVHWDeviceType) -> Option<AVPixelFormat> {
    self
      .hw_configs()
      .find(|cfg| cfg.device_type == device_type && cfg.supports(hw_config_method::HW_DEVICE_CTX))
      .map(|cfg| cfg.pix_fmt)
  }
}

impl fmt::Debug for Codec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Codec")
      .field("name", &self.name())
      .field("id", &self.id())
      .field("media_type", &self.media_type())
      .finish()
  }
}

fn codec_id_name(id: AVCodecID) -> String {
  unsafe { static_str(avcodec_get_name(id.as_raw())) }
    .map(str::to_string)
    .unwrap_or_else(|| format!("#{}", id.as_raw()))
}

/// One `AVCodecHWConfig` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwConfig {
  pub pix_fmt: AVPixelFormat,
  /// Bitmask of `hw_config_method` values
  pub methods: i32,
  pub device_type: AVHWDeviceType,
}

impl HwConfig {
  pub fn supports(&self, method: i32) -> bool {
    self.methods & method != 0
  }
}

/// Iterator over a codec's hardware configurations
pub struct HwConfigIter {
  codec: Codec,
  index: i32,
}

impl Iterator for HwConfigIter {
  type Item = HwConfig;

  fn next(&mut self) -> Option<HwConfig> {
    let cfg = unsafe { avcodec_get_hw_config(self.codec.as_ptr(), self.index) };
    if cfg.is_null() {
      return None;
    }
    self.index += 1;
    Some(unsafe {
      HwConfig {
        pix_fmt: AVPixelFormat(avk_hwcfg_pix_fmt(cfg)),
        methods: avk_hwcfg_methods(cfg),
        device_type: AVHWDeviceType::from_raw(avk_hwcfg_device_type(cfg)),
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_find_by_id() {
    let enc = Codec::find_encoder(AVCodecID::RAWVIDEO).unwrap();
    assert_eq!(enc.name(), "rawvideo");
    assert_eq!(enc.id(), AVCodecID::RAWVIDEO);
    assert_eq!(enc.media_type(), AVMediaType::Video);
    assert!(enc.is_encoder());
    assert!(!enc.is_decoder());

    let dec = Codec::find_decoder(AVCodecID::PCM_S16LE).unwrap();
    assert_eq!(dec.media_type(), AVMediaType::Audio);
    assert!(dec.is_decoder());
  }

  #[test]
  fn test_find_by_name() {
    let enc = Codec::find_encoder_by_name("pcm_s16le").unwrap();
    assert_eq!(enc.id(), AVCodecID::PCM_S16LE);
  }

  #[test]
  fn test_unknown_encoder_name() {
    let err = Codec::find_encoder_by_name("no_such_encoder").unwrap_err();
    assert!(matches!(
      err,
      Error::Configuration {
        op: "avcodec_find_encoder_by_name",
        ..
      }
    ));
    assert!(err.to_string().contains("no_such_encoder"));
  }

  #[test]
  fn test_software_codec_has_no_hw_configs() {
    let enc = Codec::find_encoder(AVCodecID::RAWVIDEO).unwrap();
    assert_eq!(enc.hw_configs().count(), 0);
    assert_eq!(enc.hw_pix_fmt(AVHWDeviceType::Vaapi), None);
  }
}
