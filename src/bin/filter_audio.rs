//! Push a generated sine wave through `volume` and `aformat` and print the
//! MD5 of every output plane
//!
//! abuffer (5.0 fltp 48 kHz) -> volume -> aformat (s16 44.1 kHz stereo) -> abuffersink

mod common;

use std::f64::consts::PI;

use anyhow::Context;
use avkit::ffi::avutil::av_md5_sum;
use avkit::ffi::{AVRational, AVSampleFormat};
use avkit::filter::{BufferSink, BufferSrc};
use avkit::util::is_interleaved;
use avkit::{ChannelLayout, Dictionary, Filter, FilterGraph, Frame, OwnedFrame, Outcome};
use clap::Parser;

const INPUT_SAMPLE_RATE: i32 = 48000;
const INPUT_FORMAT: AVSampleFormat = AVSampleFormat::Fltp;
const INPUT_LAYOUT: &str = "5.0";
const VOLUME: f64 = 0.90;
const FRAME_SIZE: i32 = 1024;

#[derive(Parser, Debug)]
#[command(about = "Filter a generated sine wave and checksum the output")]
struct Args {
  /// Seconds of audio to generate
  duration: f32,
}

/// abuffer -> volume -> aformat -> abuffersink, configured
fn build_graph<'g>(
  graph: &'g FilterGraph,
  layout: &ChannelLayout,
) -> anyhow::Result<(BufferSrc<'g>, BufferSink<'g>)> {
  let src = graph.alloc_buffersrc("src", true)?;
  src.opt_set("channel_layout", layout.describe()?.as_str())?;
  src.opt_set("sample_fmt", INPUT_FORMAT.name().unwrap_or("fltp"))?;
  src.opt_set("time_base", AVRational::new(1, INPUT_SAMPLE_RATE))?;
  src.opt_set("sample_rate", INPUT_SAMPLE_RATE)?;
  src.init()?;

  let volume = graph.alloc_filter(Filter::by_name("volume")?, "volume")?;
  let mut options = Dictionary::new();
  options.set("volume", &VOLUME.to_string())?;
  volume.init_dict(&mut options)?;

  let aformat = graph.alloc_filter(Filter::by_name("aformat")?, "aformat")?;
  aformat.init_str("sample_fmts=s16:sample_rates=44100:channel_layouts=stereo")?;

  let sink = graph.alloc_filter(Filter::by_name("abuffersink")?, "sink")?;
  sink.init()?;

  src.link_to(volume)?.link_to(aformat)?.link_to(sink)?;
  graph.configure()?;
  Ok((src, graph.buffer_sink(sink)?))
}

fn generate_sine(frame: &mut Frame, layout: &ChannelLayout, index: i32) -> anyhow::Result<()> {
  frame.set_sample_rate(INPUT_SAMPLE_RATE);
  frame.set_sample_fmt(INPUT_FORMAT);
  frame.set_ch_layout(layout)?;
  frame.set_nb_samples(FRAME_SIZE);
  frame.set_pts(i64::from(index) * i64::from(FRAME_SIZE));
  frame.get_buffer(0)?;

  for channel in 0..layout.nb_channels() as usize {
    let plane = frame.plane_mut(channel).context("missing channel plane")?;
    for (j, sample) in plane
      .chunks_exact_mut(4)
      .take(FRAME_SIZE as usize)
      .enumerate()
    {
      let phase = 2.0 * PI * f64::from(index + j as i32) * (channel + 1) as f64 / f64::from(FRAME_SIZE);
      sample.copy_from_slice(&(phase.sin() as f32).to_ne_bytes());
    }
  }
  Ok(())
}

fn print_checksums(frame: &Frame) -> anyhow::Result<()> {
  let format = frame.sample_fmt();
  let interleaved = is_interleaved(format)?;
  let channels = frame.nb_channels() as usize;
  let planes = if interleaved { 1 } else { channels };
  let plane_size = format.bytes_per_sample()
    * frame.nb_samples() as usize
    * if interleaved { channels } else { 1 };

  for i in 0..planes {
    let data = frame.plane(i).context("missing output plane")?;
    let data = data.get(..plane_size).context("output plane is short")?;
    let mut digest = [0u8; 16];
    unsafe { av_md5_sum(digest.as_mut_ptr(), data.as_ptr(), data.len()) };
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    println!("plane {}: 0x{}", i, hex);
  }
  println!();
  Ok(())
}

fn main() -> anyhow::Result<()> {
  common::init_logging();
  let args = Args::parse();

  let nb_frames = (f64::from(args.duration) * f64::from(INPUT_SAMPLE_RATE) / f64::from(FRAME_SIZE)) as i32;
  anyhow::ensure!(nb_frames > 0, "invalid duration: {}", args.duration);

  let layout = ChannelLayout::from_name(INPUT_LAYOUT)?;
  let graph = FilterGraph::new()?;
  let (src, sink) = build_graph(&graph, &layout)?;
  tracing::debug!(graph = %graph.dump()?, "filter graph ready");

  let mut frame = OwnedFrame::new()?;
  for i in 0..nb_frames {
    generate_sine(&mut frame, &layout, i)?;
    src.add_frame(Some(&mut *frame))?;

    loop {
      match sink.get_frame(&mut frame)? {
        Outcome::Ready(()) => {
          print_checksums(&frame)?;
          frame.unref();
        }
        Outcome::RetryLater => break,
        Outcome::EndOfStream => return Ok(()),
      }
    }
  }
  Ok(())
}
