//! Encode a raw NV12 file with `h264_vaapi`
//!
//! Output is a raw H.264 elementary stream, or a container guessed from the
//! output name when `--mux` is given.

mod common;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use avkit::ffi::accessors::codec_flag;
use avkit::ffi::{AVHWDeviceType, AVPixelFormat, AVRational};
use avkit::{
  Dictionary, Encoder, HwDeviceContext, HwFramesConfig, HwFramesContext, MediaWriter, OwnedFrame,
  Packet,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "VAAPI H.264 encode of a raw NV12 file")]
struct Args {
  width: i32,
  height: i32,
  fps: i32,
  /// Raw NV12 input
  input: PathBuf,
  output: PathBuf,
  /// Write a container (format from the output name) instead of raw H.264
  #[arg(long)]
  mux: bool,
}

/// Where encoded packets go
enum Output {
  Raw(BufWriter<File>),
  Container {
    writer: MediaWriter,
    stream_index: i32,
    time_base: AVRational,
  },
}

impl Output {
  fn write(&mut self, packet: &mut Packet, enc_time_base: AVRational) -> anyhow::Result<()> {
    match self {
      Self::Raw(out) => out.write_all(packet.data())?,
      Self::Container {
        writer,
        stream_index,
        time_base,
      } => {
        packet.set_stream_index(*stream_index);
        packet.rescale_ts(enc_time_base, *time_base);
        writer.write_packet(packet)?;
      }
    }
    Ok(())
  }

  fn finish(self) -> anyhow::Result<()> {
    match self {
      Self::Raw(mut out) => out.flush()?,
      Self::Container { mut writer, .. } => writer.write_trailer()?,
    }
    Ok(())
  }
}

fn main() -> anyhow::Result<()> {
  common::init_logging();
  let args = Args::parse();
  anyhow::ensure!(
    args.width > 0 && args.height > 0 && args.fps > 0,
    "width, height and fps must be positive"
  );

  let mut input = BufReader::new(
    File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?,
  );

  let mut writer = if args.mux {
    Some(MediaWriter::create(&args.output.to_string_lossy())?)
  } else {
    None
  };

  let device = HwDeviceContext::new(AVHWDeviceType::Vaapi)?;
  let vaapi = AVPixelFormat::from_name("vaapi").context("libavutil has no vaapi pixel format")?;
  let frames = HwFramesContext::new(
    &device,
    HwFramesConfig {
      format: Some(vaapi),
      sw_format: AVPixelFormat::NV12,
      width: args.width,
      height: args.height,
      ..Default::default()
    },
  )?;

  let mut encoder = Encoder::by_name("h264_vaapi")?;
  encoder.set_width(args.width);
  encoder.set_height(args.height);
  encoder.set_time_base(AVRational::new(1, args.fps));
  encoder.set_framerate(AVRational::new(args.fps, 1));
  encoder.set_pix_fmt(vaapi);
  encoder.set_hw_frames_ctx(&frames)?;
  if writer.as_ref().is_some_and(MediaWriter::needs_global_header) {
    encoder.add_flags(codec_flag::GLOBAL_HEADER);
  }
  let mut options = Dictionary::new();
  options.set("qp", "20")?;
  encoder.open(Some(&mut options))?;

  let mut output = match writer.take() {
    Some(mut writer) => {
      let stream = writer.new_stream(None)?;
      stream.copy_params(&encoder)?;
      stream.set_time_base(encoder.time_base());
      let stream_index = stream.index();
      writer.write_header(None)?;
      writer.dump()?;
      let time_base = writer
        .stream(0)
        .map(|s| s.time_base())
        .context("output stream vanished")?;
      Output::Container {
        writer,
        stream_index,
        time_base,
      }
    }
    None => Output::Raw(common::create_output(&args.output)?),
  };

  let enc_time_base = encoder.time_base();
  let mut sw_frame = OwnedFrame::new_video(args.width, args.height, AVPixelFormat::NV12, 0)?;
  let mut pts = 0i64;

  while common::read_nv12(&mut input, &mut sw_frame)? {
    sw_frame.set_pts(pts);
    pts += 1;
    let hw_frame = frames.upload(&sw_frame)?;
    encoder.encode(Some(&*hw_frame), |packet| output.write(packet, enc_time_base))?;
  }
  encoder.encode(None, |packet| output.write(packet, enc_time_base))?;
  output.finish()?;

  tracing::info!(frames = pts, output = %args.output.display(), "done");
  Ok(())
}
