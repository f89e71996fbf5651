//! Decode the best video stream on a hardware device and dump the frames,
//! downloaded to system memory, as raw images

mod common;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use avkit::ffi::{AVHWDeviceType, AVMediaType};
use avkit::{Frame, HwDeviceContext, HwFramesContext, MediaReader, OwnedFrame, Outcome, Packet};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Hardware-accelerated decode to a raw image file")]
struct Args {
  /// Device type ("vaapi", "cuda", "videotoolbox", ...)
  device_type: String,
  input: String,
  output: PathBuf,
}

fn unsupported_device(name: &str) -> anyhow::Error {
  let available: Vec<&str> = AVHWDeviceType::supported()
    .iter()
    .filter_map(|t| t.name())
    .collect();
  anyhow::anyhow!(
    "device type {} is not supported; available: {}",
    name,
    available.join(" ")
  )
}

fn main() -> anyhow::Result<()> {
  common::init_logging();
  let args = Args::parse();

  let device_type =
    AVHWDeviceType::from_name(&args.device_type).ok_or_else(|| unsupported_device(&args.device_type))?;
  let device = HwDeviceContext::new(device_type)?;

  let mut reader = MediaReader::open(&args.input)?;
  reader.dump()?;

  let (stream_index, mut decoder, hw_pix_fmt) = {
    let (stream, codec) = reader.find_best_stream_with_decoder(AVMediaType::Video)?;
    let hw_pix_fmt = codec
      .hw_pix_fmt(device_type)
      .with_context(|| format!("decoder {} does not support {}", codec.name(), args.device_type))?;
    let mut decoder = stream.create_decoder()?;
    decoder.set_hw_device_ctx(&device)?;
    decoder.prefer_pix_fmt(hw_pix_fmt);
    decoder.open(None)?;
    (stream.index(), decoder, hw_pix_fmt)
  };
  tracing::info!(
    pix_fmt = decoder.pix_fmt().name().unwrap_or("?"),
    "decoder opened"
  );

  let mut out = common::create_output(&args.output)?;
  let mut sw_frame = OwnedFrame::new()?;
  let mut buffer = Vec::new();
  let mut frames = 0u64;

  let mut write_frame = |frame: &mut Frame| -> anyhow::Result<()> {
    if frame.pix_fmt() == hw_pix_fmt {
      sw_frame.unref();
      HwFramesContext::transfer_data(&mut sw_frame, frame)?;
      common::write_image(&mut out, &sw_frame, &mut buffer)?;
    } else {
      common::write_image(&mut out, frame, &mut buffer)?;
    }
    frames += 1;
    Ok(())
  };

  let mut packet = Packet::new()?;
  while let Outcome::Ready(()) = reader.read_packet(&mut packet)? {
    if packet.stream_index() != stream_index {
      continue;
    }
    decoder.decode(Some(&packet), &mut write_frame)?;
  }
  decoder.decode(None, &mut write_frame)?;

  out.flush()?;
  tracing::info!(frames, output = %args.output.display(), "done");
  Ok(())
}
