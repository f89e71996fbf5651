//! Safe wrapper around FFmpeg SwrContext
//!
//! Provides audio resampling and format conversion on whole frames.

use std::ptr::{self, NonNull};

use crate::error::{check, check_config, Error, Result};
use crate::ffi::{
  swresample::{swr_alloc_set_opts2, swr_convert_frame, swr_free, swr_get_out_samples, swr_init},
  AVSampleFormat, SwrContext,
};
use crate::util::ChannelLayout;

use super::Frame;

/// One end of a resampling conversion
#[derive(Debug)]
pub struct AudioFormat {
  pub ch_layout: ChannelLayout,
  pub sample_fmt: AVSampleFormat,
  pub sample_rate: i32,
}

impl AudioFormat {
  pub fn new(ch_layout: ChannelLayout, sample_fmt: AVSampleFormat, sample_rate: i32) -> Self {
    Self {
      ch_layout,
      sample_fmt,
      sample_rate,
    }
  }

  /// Format of an audio frame
  pub fn of_frame(frame: &Frame) -> Result<Self> {
    Ok(Self {
      ch_layout: frame.ch_layout()?,
      sample_fmt: frame.sample_fmt(),
      sample_rate: frame.sample_rate(),
    })
  }
}

/// Safe wrapper around SwrContext
pub struct Resampler {
  ptr: NonNull<SwrContext>,
  out: AudioFormat,
  input: AudioFormat,
}

impl Resampler {
  /// Configure and initialize a conversion from `input` to `out`
  pub fn new(out: AudioFormat, input: AudioFormat) -> Result<Self> {
    let mut ctx: *mut SwrContext = ptr::null_mut();
    let ret = unsafe {
      swr_alloc_set_opts2(
        &mut ctx,
        out.ch_layout.as_ptr(),
        out.sample_fmt.as_raw(),
        out.sample_rate,
        input.ch_layout.as_ptr(),
        input.sample_fmt.as_raw(),
        input.sample_rate,
        0,
        ptr::null_mut(),
      )
    };
    check_config("swr_alloc_set_opts2", ret)?;
    let ptr = NonNull::new(ctx).ok_or(Error::Allocation {
      op: "swr_alloc_set_opts2",
    })?;
    // Owned from here on so a failed init frees it
    let resampler = Self { ptr, out, input };

    let ret = unsafe { swr_init(resampler.ptr.as_ptr()) };
    check_config("swr_init", ret)?;

    tracing::debug!(
      in_rate = resampler.input.sample_rate,
      in_fmt = resampler.input.sample_fmt.name().unwrap_or("?"),
      out_rate = resampler.out.sample_rate,
      out_fmt = resampler.out.sample_fmt.name().unwrap_or("?"),
      "initialized resampler"
    );
    Ok(resampler)
  }

  /// Convert `src` into `dst`, or flush buffered samples when `src` is `None`
  ///
  /// `dst` gets the output format stamped on it; when it has no buffers
  /// FFmpeg allocates them sized for the converted input.
  pub fn convert_frame(&mut self, dst: &mut Frame, src: Option<&Frame>) -> Result<()> {
    if dst.nb_planes() == 0 {
      dst.set_sample_fmt(self.out.sample_fmt);
      dst.set_sample_rate(self.out.sample_rate);
      dst.set_ch_layout(&self.out.ch_layout)?;
    }
    let ret = unsafe {
      swr_convert_frame(
        self.ptr.as_ptr(),
        dst.as_mut_ptr(),
        src.map_or(ptr::null(), Frame::as_ptr),
      )
    };
    check("swr_convert_frame", ret)?;
    if let Some(src) = src {
      dst.set_pts(src.pts());
    }
    Ok(())
  }

  /// Upper bound on output samples for `in_samples` more input samples
  pub fn out_samples(&self, in_samples: i32) -> i32 {
    unsafe { swr_get_out_samples(self.ptr.as_ptr(), in_samples) }.max(0)
  }

  pub fn output_format(&self) -> &AudioFormat {
    &self.out
  }

  pub fn input_format(&self) -> &AudioFormat {
    &self.input
  }
}

impl Drop for Resampler {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      swr_free(&mut ptr);
    }
  }
}

unsafe impl Send for Resampler {}

impl std::fmt::Debug for Resampler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Resampler")
      .field("out", &self.out)
      .field("input", &self.input)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::OwnedFrame;

  fn stereo(fmt: AVSampleFormat, rate: i32) -> AudioFormat {
    AudioFormat::new(ChannelLayout::default_for(2), fmt, rate)
  }

  #[test]
  fn test_resampler_creation() {
    let resampler = Resampler::new(
      stereo(AVSampleFormat::S16, 48000),
      stereo(AVSampleFormat::Fltp, 44100),
    );
    assert!(resampler.is_ok(), "{:?}", resampler.err());
  }

  #[test]
  fn test_invalid_rate_is_configuration_error() {
    let result = Resampler::new(
      stereo(AVSampleFormat::S16, 0),
      stereo(AVSampleFormat::Fltp, 44100),
    );
    assert!(matches!(result, Err(Error::Configuration { .. })));
  }

  #[test]
  fn test_format_conversion() {
    let mut resampler = Resampler::new(
      stereo(AVSampleFormat::S16, 48000),
      stereo(AVSampleFormat::Fltp, 48000),
    )
    .unwrap();
    assert!(resampler.out_samples(1024) >= 1024);

    let layout = ChannelLayout::default_for(2);
    let mut src = OwnedFrame::new_audio(1024, AVSampleFormat::Fltp, 48000, &layout).unwrap();
    for plane in 0..2 {
      if let Some(data) = src.plane_mut(plane) {
        data.fill(0);
      }
    }
    src.set_pts(7);

    let mut dst = OwnedFrame::new().unwrap();
    resampler.convert_frame(&mut dst, Some(&*src)).unwrap();
    assert_eq!(dst.sample_fmt(), AVSampleFormat::S16);
    assert_eq!(dst.nb_channels(), 2);
    assert_eq!(dst.pts(), 7);
    assert!(dst.nb_samples() > 0);
  }
}
