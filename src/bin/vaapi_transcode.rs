//! Transcode the best video stream entirely on a VAAPI device
//!
//! The encoder is opened on the first decoded frame so it can share the
//! decoder's surface pool; other streams are dropped.

mod common;

use anyhow::Context;
use avkit::ffi::{AVHWDeviceType, AVMediaType, AVPixelFormat, AVRational};
use avkit::{Encoder, Frame, HwDeviceContext, HwFramesContext, MediaReader, MediaWriter, Outcome, Packet};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "VAAPI decode and re-encode; the container is guessed from the output name")]
struct Args {
  input: String,
  /// Encoder name ("h264_vaapi", "hevc_vaapi", ...)
  encoder: String,
  output: String,
}

/// Encoder and muxer, opened once the first frame shows the pool to use
struct Sink {
  writer: MediaWriter,
  encoder: Encoder,
  /// Time base of decoded frames, which the encoder keeps
  time_base: AVRational,
  framerate: AVRational,
  vaapi: AVPixelFormat,
  stream: Option<(i32, AVRational)>,
  frames: u64,
}

impl Sink {
  fn open(&mut self, first: &Frame) -> anyhow::Result<(i32, AVRational)> {
    let frames = HwFramesContext::from_frame(first)?
      .context("decoder did not produce VAAPI surfaces")?;
    self.encoder.set_hw_frames_ctx(&frames)?;
    self.encoder.set_time_base(self.time_base);
    self.encoder.set_framerate(self.framerate);
    self.encoder.set_pix_fmt(self.vaapi);
    self.encoder.set_width(first.width());
    self.encoder.set_height(first.height());
    self.encoder.open(None)?;

    let codec = self.encoder.codec();
    let stream = self.writer.new_stream(codec)?;
    stream.copy_params(&self.encoder)?;
    stream.set_time_base(self.encoder.time_base());
    let index = stream.index();
    self.writer.write_header(None)?;

    let time_base = self
      .writer
      .stream(index as usize)
      .map(|s| s.time_base())
      .context("output stream vanished")?;
    Ok((index, time_base))
  }

  fn encode(&mut self, frame: Option<&Frame>) -> anyhow::Result<()> {
    let (index, out_time_base) = match (self.stream, frame) {
      (Some(stream), _) => stream,
      (None, Some(first)) => {
        let stream = self.open(first)?;
        self.stream = Some(stream);
        stream
      }
      // nothing was decoded, so there is nothing to flush
      (None, None) => return Ok(()),
    };

    let time_base = self.time_base;
    let writer = &mut self.writer;
    self.encoder.encode(frame, |packet: &mut Packet| {
      packet.set_stream_index(index);
      packet.rescale_ts(time_base, out_time_base);
      writer.write_packet(packet)?;
      Ok::<(), anyhow::Error>(())
    })?;
    if frame.is_some() {
      self.frames += 1;
    }
    Ok(())
  }
}

fn main() -> anyhow::Result<()> {
  common::init_logging();
  let args = Args::parse();

  let device = HwDeviceContext::new(AVHWDeviceType::Vaapi)?;
  let vaapi = AVPixelFormat::from_name("vaapi").context("libavutil has no vaapi pixel format")?;
  let mut reader = MediaReader::open(&args.input)?;

  let (stream_index, time_base, framerate, mut decoder) = {
    let stream = reader.find_best_stream(AVMediaType::Video)?;
    let mut decoder = stream.create_decoder()?;
    decoder.set_hw_device_ctx(&device)?;
    decoder.prefer_pix_fmt(vaapi);
    decoder.open(None)?;
    (stream.index(), stream.time_base(), stream.avg_frame_rate(), decoder)
  };

  let mut sink = Sink {
    writer: MediaWriter::create(&args.output)?,
    encoder: Encoder::by_name(&args.encoder)?,
    time_base,
    framerate,
    vaapi,
    stream: None,
    frames: 0,
  };

  let mut packet = Packet::new()?;
  while let Outcome::Ready(()) = reader.read_packet(&mut packet)? {
    if packet.stream_index() != stream_index {
      continue;
    }
    decoder.decode(Some(&packet), |frame| sink.encode(Some(&*frame)))?;
  }
  decoder.decode(None, |frame| sink.encode(Some(&*frame)))?;
  sink.encode(None)?;

  if sink.stream.is_some() {
    sink.writer.write_trailer()?;
  }
  tracing::info!(frames = sink.frames, output = %args.output, "done");
  Ok(())
}
