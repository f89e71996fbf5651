//! Compressed data: one `AVPacket` per [`Packet`]

use std::ptr::{self, NonNull};
use std::slice;

use crate::error::{check, non_null, Error, Result};
use crate::ffi::{
  accessors::{
    avk_pkt_data, avk_pkt_dts, avk_pkt_duration, avk_pkt_flags, avk_pkt_pts, avk_pkt_set_dts,
    avk_pkt_set_duration, avk_pkt_set_flags, avk_pkt_set_pts, avk_pkt_set_stream_index,
    avk_pkt_size, avk_pkt_stream_index,
  },
  avcodec::{
    av_new_packet, av_packet_alloc, av_packet_free, av_packet_ref, av_packet_rescale_ts,
    av_packet_unref,
  },
  pkt_flag, AVPacket, AVRational,
};

/// Owned packet
///
/// Encoders fill it, muxers consume its payload and decoders read it. The
/// same packet is meant to be reused: [`Packet::unref`] (or any call that
/// hands the payload on) leaves it blank again.
pub struct Packet {
  ptr: NonNull<AVPacket>,
}

impl Packet {
  /// Blank packet with no payload and unset timestamps
  pub fn new() -> Result<Self> {
    let raw = unsafe { av_packet_alloc() };
    Ok(Self {
      ptr: non_null("av_packet_alloc", raw)?,
    })
  }

  /// Packet owning a padded copy of `bytes`
  pub fn from_slice(bytes: &[u8]) -> Result<Self> {
    const OP: &str = "av_new_packet";
    let len = i32::try_from(bytes.len())
      .map_err(|_| Error::invalid_argument(OP, "payload larger than 2 GiB"))?;
    let mut pkt = Self::new()?;
    check(OP, unsafe { av_new_packet(pkt.as_mut_ptr(), len) })?;
    if len > 0 {
      let dst = unsafe { avk_pkt_data(pkt.as_ptr()) } as *mut u8;
      unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len()) };
    }
    Ok(pkt)
  }

  /// # Safety
  /// `src` must point to a valid packet.
  pub(crate) unsafe fn ref_from_ptr(src: *const AVPacket) -> Result<Self> {
    let pkt = Self::new()?;
    check("av_packet_ref", unsafe {
      av_packet_ref(pkt.ptr.as_ptr(), src)
    })?;
    Ok(pkt)
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVPacket {
    self.ptr.as_ptr()
  }

  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVPacket {
    self.ptr.as_ptr()
  }

  /// Payload bytes; empty for a blank packet
  pub fn data(&self) -> &[u8] {
    let data = unsafe { avk_pkt_data(self.as_ptr()) };
    match usize::try_from(self.size()) {
      Ok(len) if len > 0 && !data.is_null() => unsafe { slice::from_raw_parts(data, len) },
      _ => &[],
    }
  }

  #[inline]
  pub fn size(&self) -> i32 {
    unsafe { avk_pkt_size(self.as_ptr()) }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.size() == 0
  }

  // ========================================================================
  // Timing
  // ========================================================================

  // All three are in the time base of whoever produced the packet: the
  // encoder's for encoded output, the stream's for demuxed input.

  #[inline]
  pub fn pts(&self) -> i64 {
    unsafe { avk_pkt_pts(self.as_ptr()) }
  }

  #[inline]
  pub fn set_pts(&mut self, pts: i64) {
    unsafe { avk_pkt_set_pts(self.as_mut_ptr(), pts) }
  }

  #[inline]
  pub fn dts(&self) -> i64 {
    unsafe { avk_pkt_dts(self.as_ptr()) }
  }

  #[inline]
  pub fn set_dts(&mut self, dts: i64) {
    unsafe { avk_pkt_set_dts(self.as_mut_ptr(), dts) }
  }

  #[inline]
  pub fn duration(&self) -> i64 {
    unsafe { avk_pkt_duration(self.as_ptr()) }
  }

  #[inline]
  pub fn set_duration(&mut self, duration: i64) {
    unsafe { avk_pkt_set_duration(self.as_mut_ptr(), duration) }
  }

  /// Move the timing fields from units of `from` to units of `to`
  pub fn rescale_ts(&mut self, from: AVRational, to: AVRational) {
    unsafe { av_packet_rescale_ts(self.as_mut_ptr(), from, to) }
  }

  // ========================================================================
  // Routing
  // ========================================================================

  #[inline]
  pub fn stream_index(&self) -> i32 {
    unsafe { avk_pkt_stream_index(self.as_ptr()) }
  }

  #[inline]
  pub fn set_stream_index(&mut self, index: i32) {
    unsafe { avk_pkt_set_stream_index(self.as_mut_ptr(), index) }
  }

  /// `pkt_flag` bits
  #[inline]
  pub fn flags(&self) -> i32 {
    unsafe { avk_pkt_flags(self.as_ptr()) }
  }

  #[inline]
  pub fn set_flags(&mut self, flags: i32) {
    unsafe { avk_pkt_set_flags(self.as_mut_ptr(), flags) }
  }

  pub fn is_key(&self) -> bool {
    self.flags() & pkt_flag::KEY != 0
  }

  pub fn is_corrupt(&self) -> bool {
    self.flags() & pkt_flag::CORRUPT != 0
  }

  /// Release the payload and reset every field; the packet stays usable
  pub fn unref(&mut self) {
    unsafe { av_packet_unref(self.as_mut_ptr()) }
  }

  /// Second packet sharing this payload
  pub fn try_clone(&self) -> Result<Self> {
    unsafe { Self::ref_from_ptr(self.as_ptr()) }
  }
}

impl Drop for Packet {
  fn drop(&mut self) {
    let mut raw = self.ptr.as_ptr();
    unsafe { av_packet_free(&mut raw) };
  }
}

unsafe impl Send for Packet {}

impl std::fmt::Debug for Packet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Packet")
      .field("stream_index", &self.stream_index())
      .field("size", &self.size())
      .field("pts", &self.pts())
      .field("dts", &self.dts())
      .field("key", &self.is_key())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ffi::AV_NOPTS_VALUE;

  #[test]
  fn test_blank_packet() {
    let pkt = Packet::new().unwrap();
    assert!(pkt.is_empty());
    assert!(pkt.data().is_empty());
    assert_eq!(pkt.pts(), AV_NOPTS_VALUE);
    assert_eq!(pkt.dts(), AV_NOPTS_VALUE);
  }

  #[test]
  fn test_clone_shares_payload() {
    let mut pkt = Packet::from_slice(b"abcd").unwrap();
    pkt.set_pts(10);
    pkt.set_stream_index(1);
    pkt.set_flags(pkt_flag::KEY);

    let clone = pkt.try_clone().unwrap();
    pkt.unref();
    assert!(pkt.is_empty());
    assert!(!pkt.is_key());

    assert_eq!(clone.data(), b"abcd");
    assert_eq!(clone.pts(), 10);
    assert_eq!(clone.stream_index(), 1);
    assert!(clone.is_key());
  }

  #[test]
  fn test_rescale_to_mpegts_clock() {
    let mut pkt = Packet::new().unwrap();
    pkt.set_pts(3);
    pkt.set_dts(2);
    pkt.set_duration(1);
    pkt.rescale_ts(AVRational::new(1, 25), AVRational::new(1, 90000));
    assert_eq!((pkt.pts(), pkt.dts(), pkt.duration()), (10800, 7200, 3600));
  }
}
