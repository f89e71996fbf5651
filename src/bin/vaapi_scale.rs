//! Scale a raw NV12 file on a VAAPI device with `scale_vaapi`
//!
//! buffer (VAAPI surfaces) -> scale_vaapi -> buffersink

mod common;

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use avkit::ffi::{AVHWDeviceType, AVPixelFormat, AVRational};
use avkit::filter::{BufferSink, BufferSrc};
use avkit::{
  BufferSrcParameters, Filter, FilterGraph, HwDeviceContext, HwFramesConfig, HwFramesContext,
  OwnedFrame, Outcome,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "VAAPI scaling of a raw NV12 file")]
struct Args {
  in_width: i32,
  in_height: i32,
  out_width: i32,
  out_height: i32,
  input: PathBuf,
  output: PathBuf,
}

fn build_graph<'g>(
  graph: &'g FilterGraph,
  frames: &HwFramesContext,
  args: &Args,
) -> anyhow::Result<(BufferSrc<'g>, BufferSink<'g>)> {
  let src = graph.alloc_buffersrc("src", false)?;
  src.opt_set("video_size", format!("{}:{}", args.in_width, args.in_height).as_str())?;
  src.opt_set("pix_fmt", i64::from(frames.format().as_raw()))?;
  src.opt_set("time_base", AVRational::new(1, 25))?;
  // the pool must be known before init
  let mut params = BufferSrcParameters::new()?;
  params.set_hw_frames_ctx(frames)?;
  src.parameters_set(&params)?;
  src.init()?;

  let scale = graph.create_filter(
    Filter::by_name("scale_vaapi")?,
    "scale",
    Some(format!("w={}:h={}", args.out_width, args.out_height).as_str()),
  )?;
  let sink = graph.create_filter(Filter::by_name("buffersink")?, "sink", None)?;

  src.link_to(scale)?.link_to(sink)?;
  graph.configure()?;
  Ok((src, graph.buffer_sink(sink)?))
}

/// Download every frame the sink has ready; false once it reached the end
fn drain(
  sink: &BufferSink<'_>,
  hw_frame: &mut OwnedFrame,
  sw_frame: &mut OwnedFrame,
  out: &mut impl Write,
  count: &mut u64,
) -> anyhow::Result<bool> {
  loop {
    match sink.get_frame(hw_frame)? {
      Outcome::Ready(()) => {
        sw_frame.unref();
        HwFramesContext::transfer_data(sw_frame, hw_frame)?;
        common::write_nv12(out, sw_frame)?;
        hw_frame.unref();
        *count += 1;
      }
      Outcome::RetryLater => return Ok(true),
      Outcome::EndOfStream => return Ok(false),
    }
  }
}

fn main() -> anyhow::Result<()> {
  common::init_logging();
  let args = Args::parse();
  tracing::info!(
    "scaling from {}x{} to {}x{}",
    args.in_width,
    args.in_height,
    args.out_width,
    args.out_height
  );

  let mut input = BufReader::new(
    File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?,
  );
  let mut out = common::create_output(&args.output)?;

  let device = HwDeviceContext::new(AVHWDeviceType::Vaapi)?;
  let frames = HwFramesContext::new(
    &device,
    HwFramesConfig {
      format: None,
      sw_format: AVPixelFormat::NV12,
      width: args.in_width,
      height: args.in_height,
      ..Default::default()
    },
  )?;

  let graph = FilterGraph::new()?;
  let (src, sink) = build_graph(&graph, &frames, &args)?;

  let mut sw_in = OwnedFrame::new_video(args.in_width, args.in_height, AVPixelFormat::NV12, 0)?;
  let mut hw_out = OwnedFrame::new()?;
  let mut sw_out = OwnedFrame::new()?;
  let mut count = 0u64;

  while common::read_nv12(&mut input, &mut sw_in)? {
    let mut hw_in = frames.upload(&sw_in)?;
    src.add_frame(Some(&mut *hw_in))?;
    drain(&sink, &mut hw_out, &mut sw_out, &mut out, &mut count)?;
  }

  src.add_frame(None)?;
  drain(&sink, &mut hw_out, &mut sw_out, &mut out, &mut count)?;

  out.flush()?;
  tracing::info!(frames = count, "done");
  Ok(())
}
