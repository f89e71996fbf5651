//! Decode the best video stream in software and dump it as packed RGBA

mod common;

use std::io::Write;
use std::path::PathBuf;

use avkit::ffi::{AVMediaType, AVPixelFormat};
use avkit::{Frame, MediaReader, OwnedFrame, Outcome, Packet, ScaleAlgorithm, ScaleParams, Scaler};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Decode a video stream to raw RGBA frames")]
struct Args {
  input: String,
  /// Raw RGBA output, one packed image after another
  output: PathBuf,
  /// Stop after this many frames
  #[arg(long)]
  limit: Option<u64>,
}

fn main() -> anyhow::Result<()> {
  common::init_logging();
  let args = Args::parse();

  let mut reader = MediaReader::open(&args.input)?;
  let (stream_index, mut decoder) = {
    let stream = reader.find_best_stream(AVMediaType::Video)?;
    let mut decoder = stream.create_decoder()?;
    decoder.open(None)?;
    (stream.index(), decoder)
  };
  tracing::info!(
    codec = decoder.codec().map_or("?", |c| c.name()),
    width = decoder.width(),
    height = decoder.height(),
    "decoding"
  );

  let mut out = common::create_output(&args.output)?;
  let mut scaler: Option<Scaler> = None;
  let mut rgba = OwnedFrame::new()?;
  let mut buffer = Vec::new();
  let mut frames = 0u64;
  let limit = args.limit.unwrap_or(u64::MAX);

  let mut convert = |frame: &mut Frame| -> anyhow::Result<()> {
    if frames >= limit {
      return Ok(());
    }
    let src = ScaleParams::of_frame(frame);
    // rebuilt when the stream changes size mid-way
    if scaler.as_ref().map(Scaler::src) != Some(src) {
      let dst = ScaleParams::new(src.width, src.height, AVPixelFormat::RGBA);
      scaler = Some(Scaler::new(src, dst, ScaleAlgorithm::default())?);
      rgba.unref();
    }
    if let Some(scaler) = scaler.as_mut() {
      scaler.scale_frame(&mut rgba, frame)?;
      common::write_image(&mut out, &rgba, &mut buffer)?;
    }
    frames += 1;
    Ok(())
  };

  let mut packet = Packet::new()?;
  while let Outcome::Ready(()) = reader.read_packet(&mut packet)? {
    if packet.stream_index() == stream_index {
      decoder.decode(Some(&packet), &mut convert)?;
    }
  }
  decoder.decode(None, &mut convert)?;

  out.flush()?;
  tracing::info!(frames, output = %args.output.display(), "done");
  Ok(())
}
