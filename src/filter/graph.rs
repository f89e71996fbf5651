//! Safe wrapper around AVFilterGraph

use std::cell::Cell;
use std::ffi::CStr;
use std::ptr::{self, NonNull};

use crate::error::{check_config, non_null, Error, Result};
use crate::ffi::{
  avfilter::{
    avfilter_graph_alloc, avfilter_graph_alloc_filter, avfilter_graph_config,
    avfilter_graph_create_filter, avfilter_graph_dump, avfilter_graph_free,
    avfilter_graph_get_filter, avfilter_graph_parse2, avfilter_inout_free,
  },
  avutil::av_free,
  AVFilterContext, AVFilterGraph, AVFilterInOut,
};
use crate::util::cstring;

use super::{BufferSink, BufferSrc, Filter, FilterContext};

/// Owned filter graph
///
/// Starts out building: filters are added, initialized and linked. After
/// [`FilterGraph::configure`] succeeds frames can flow through it.
pub struct FilterGraph {
  ptr: NonNull<AVFilterGraph>,
  configured: Cell<bool>,
}

impl FilterGraph {
  pub fn new() -> Result<Self> {
    let ptr = unsafe { avfilter_graph_alloc() };
    Ok(Self {
      ptr: non_null("avfilter_graph_alloc", ptr)?,
      configured: Cell::new(false),
    })
  }

  #[inline]
  pub fn as_ptr(&self) -> *mut AVFilterGraph {
    self.ptr.as_ptr()
  }

  // ========================================================================
  // Building
  // ========================================================================

  /// Add an uninitialized instance of `filter`; set options, then `init` it
  pub fn alloc_filter(&self, filter: Filter, name: &str) -> Result<&FilterContext> {
    let c_name = cstring("avfilter_graph_alloc_filter", name)?;
    let ctx =
      unsafe { avfilter_graph_alloc_filter(self.as_ptr(), filter.as_ptr(), c_name.as_ptr()) };
    let ctx = non_null("avfilter_graph_alloc_filter", ctx)?;
    Ok(unsafe { FilterContext::from_ptr(ctx.as_ptr()) })
  }

  /// Add an instance of `filter` initialized with `args`
  pub fn create_filter(
    &self,
    filter: Filter,
    name: &str,
    args: Option<&str>,
  ) -> Result<&FilterContext> {
    const OP: &str = "avfilter_graph_create_filter";
    let c_name = cstring(OP, name)?;
    let c_args = args.map(|a| cstring(OP, a)).transpose()?;
    let mut ctx: *mut AVFilterContext = ptr::null_mut();
    let ret = unsafe {
      avfilter_graph_create_filter(
        &mut ctx,
        filter.as_ptr(),
        c_name.as_ptr(),
        c_args.as_ref().map_or(ptr::null(), |a| a.as_ptr()),
        ptr::null_mut(),
        self.as_ptr(),
      )
    };
    check_config(OP, ret)?;
    let ctx = non_null(OP, ctx)?;
    Ok(unsafe { FilterContext::from_ptr(ctx.as_ptr()) })
  }

  /// Add an uninitialized `abuffer` (audio) or `buffer` (video) source
  pub fn alloc_buffersrc(&self, name: &str, audio: bool) -> Result<BufferSrc<'_>> {
    let filter = Filter::by_name(if audio { "abuffer" } else { "buffer" })?;
    let ctx = self.alloc_filter(filter, name)?;
    BufferSrc::new(ctx, self)
  }

  /// Validated sink view over an instance of this graph
  pub fn buffer_sink<'g>(&'g self, ctx: &'g FilterContext) -> Result<BufferSink<'g>> {
    BufferSink::new(ctx, self)
  }

  /// Instance of this graph with the given name (including ones added by
  /// [`FilterGraph::parse`])
  pub fn get_filter(&self, name: &str) -> Option<&FilterContext> {
    let c_name = cstring("avfilter_graph_get_filter", name).ok()?;
    let ctx = unsafe { avfilter_graph_get_filter(self.as_ptr(), c_name.as_ptr()) };
    NonNull::new(ctx).map(|ctx| unsafe { FilterContext::from_ptr(ctx.as_ptr()) })
  }

  /// Add the filters described by `filters` ("scale=640:360,format=rgba")
  ///
  /// Open pads are left unlinked; link them to named instances found with
  /// [`FilterGraph::get_filter`].
  pub fn parse(&self, filters: &str) -> Result<()> {
    let c_filters = cstring("avfilter_graph_parse2", filters)?;
    let mut inputs: *mut AVFilterInOut = ptr::null_mut();
    let mut outputs: *mut AVFilterInOut = ptr::null_mut();
    let ret = unsafe {
      avfilter_graph_parse2(self.as_ptr(), c_filters.as_ptr(), &mut inputs, &mut outputs)
    };
    unsafe {
      avfilter_inout_free(&mut inputs);
      avfilter_inout_free(&mut outputs);
    }
    check_config("avfilter_graph_parse2", ret)?;
    Ok(())
  }

  /// Check the graph and negotiate formats on every link
  pub fn configure(&self) -> Result<()> {
    if self.is_configured() {
      return Err(Error::InvalidState {
        op: "avfilter_graph_config",
        state: "configured",
      });
    }
    let ret = unsafe { avfilter_graph_config(self.as_ptr(), ptr::null_mut()) };
    check_config("avfilter_graph_config", ret)?;
    self.configured.set(true);
    tracing::debug!("configured filter graph");
    Ok(())
  }

  pub fn is_configured(&self) -> bool {
    self.configured.get()
  }

  /// Human-readable picture of the graph and its negotiated links
  pub fn dump(&self) -> Result<String> {
    let text = unsafe { avfilter_graph_dump(self.as_ptr(), ptr::null()) };
    let text = non_null("avfilter_graph_dump", text)?;
    let dumped = unsafe { CStr::from_ptr(text.as_ptr()) }
      .to_string_lossy()
      .into_owned();
    unsafe { av_free(text.as_ptr().cast()) };
    Ok(dumped)
  }
}

impl Drop for FilterGraph {
  fn drop(&mut self) {
    let mut ptr = self.ptr.as_ptr();
    unsafe { avfilter_graph_free(&mut ptr) };
  }
}

unsafe impl Send for FilterGraph {}

impl std::fmt::Debug for FilterGraph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FilterGraph")
      .field("configured", &self.is_configured())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_create_and_lookup() {
    let graph = FilterGraph::new().unwrap();
    let volume = graph
      .create_filter(Filter::by_name("volume").unwrap(), "gain", Some("volume=0.5"))
      .unwrap();
    assert_eq!(volume.name(), "gain");
    assert_eq!(volume.filter_name(), "volume");
    assert_eq!(graph.get_filter("gain").unwrap().name(), "gain");
    assert!(graph.get_filter("missing").is_none());
  }

  #[test]
  fn test_bad_args_are_configuration_errors() {
    let graph = FilterGraph::new().unwrap();
    let err = graph
      .create_filter(
        Filter::by_name("volume").unwrap(),
        "gain",
        Some("no_such_option=1"),
      )
      .unwrap_err();
    assert!(matches!(
      err,
      Error::Configuration {
        op: "avfilter_graph_create_filter",
        ..
      }
    ));
  }

  #[test]
  fn test_parse() {
    let graph = FilterGraph::new().unwrap();
    graph.parse("anull,anull").unwrap();
    assert!(matches!(
      graph.parse("no_such_filter"),
      Err(Error::Configuration {
        op: "avfilter_graph_parse2",
        ..
      })
    ));
  }

  #[test]
  fn test_unlinked_graph_fails_to_configure() {
    let graph = FilterGraph::new().unwrap();
    graph
      .create_filter(Filter::by_name("anull").unwrap(), "dangling", None)
      .unwrap();
    assert!(matches!(
      graph.configure(),
      Err(Error::Configuration { .. })
    ));
    assert!(!graph.is_configured());
  }
}
