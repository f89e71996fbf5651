//! Setup shared by the demo binaries

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use avkit::log::Level;
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber (`RUST_LOG`, default `info`) and route
/// FFmpeg's own log into it
pub fn init_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();
  avkit::log::init(Level::Warning);
}

/// Buffered writer over a newly created file
#[allow(dead_code)]
pub fn create_output(path: &Path) -> anyhow::Result<BufWriter<File>> {
  let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
  Ok(BufWriter::new(file))
}

/// Pack `frame` tightly (alignment 1) and append it to `out`
#[allow(dead_code)]
pub fn write_image(out: &mut impl Write, frame: &avkit::Frame, buffer: &mut Vec<u8>) -> anyhow::Result<()> {
  let size = frame.image_buffer_size(1)?;
  buffer.resize(size, 0);
  let written = frame.copy_image_to(buffer, 1)?;
  out.write_all(&buffer[..written])?;
  Ok(())
}

/// Fill an allocated NV12 `frame` with the next picture from `input`
///
/// Returns false once the input cannot supply a whole picture.
#[allow(dead_code)]
pub fn read_nv12(input: &mut impl std::io::Read, frame: &mut avkit::Frame) -> anyhow::Result<bool> {
  let width = frame.width() as usize;
  let height = frame.height() as usize;
  // the interleaved chroma plane carries a U and a V byte per pair of columns
  let chroma_width = width.div_ceil(2) * 2;
  for (plane, bytes, rows) in [(0, width, height), (1, chroma_width, height.div_ceil(2))] {
    let stride = frame.linesize(plane) as usize;
    let data = frame.plane_mut(plane).context("NV12 frame has no buffers")?;
    for row in data.chunks_mut(stride).take(rows) {
      match input.read_exact(&mut row[..bytes]) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(false),
        Err(e) => return Err(e.into()),
      }
    }
  }
  Ok(true)
}

/// Append the visible bytes of an NV12 `frame` to `out`
#[allow(dead_code)]
pub fn write_nv12(out: &mut impl Write, frame: &avkit::Frame) -> anyhow::Result<()> {
  let width = frame.width() as usize;
  let height = frame.height() as usize;
  let chroma_width = width.div_ceil(2) * 2;
  for (plane, bytes, rows) in [(0, width, height), (1, chroma_width, height.div_ceil(2))] {
    let stride = frame.linesize(plane) as usize;
    let data = frame.plane(plane).context("NV12 frame has no buffers")?;
    for row in data.chunks(stride).take(rows) {
      out.write_all(&row[..bytes])?;
    }
  }
  Ok(())
}
