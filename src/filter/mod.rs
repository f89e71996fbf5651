//! Filter graphs (libavfilter)
//!
//! A [`FilterGraph`] owns every filter instance in it. Instances are handed
//! out as [`FilterContext`] references borrowed from the graph, and the
//! validated views [`BufferSrc`] and [`BufferSink`] carry the graph along so
//! they can refuse to move frames before it is configured.

mod buffer;
mod context;
mod graph;

pub use buffer::{BufferSink, BufferSrc, BufferSrcParameters};
pub use context::{FilterContext, OptionValue};
pub use graph::FilterGraph;

use std::ptr::NonNull;

use crate::error::{Error, Result};
use crate::ffi::{
  accessors::{avk_filter_description, avk_filter_name},
  avfilter::avfilter_get_by_name,
  avutil::static_str,
  AVFilter,
};
use crate::util::cstring;

/// A registered filter implementation ("volume", "scale_vaapi", ...)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Filter {
  ptr: NonNull<AVFilter>,
}

// Filter descriptors are static tables inside libavfilter
unsafe impl Send for Filter {}
unsafe impl Sync for Filter {}

impl Filter {
  pub fn by_name(name: &str) -> Result<Self> {
    let c_name = cstring("avfilter_get_by_name", name)?;
    let ptr = unsafe { avfilter_get_by_name(c_name.as_ptr()) };
    NonNull::new(ptr as *mut AVFilter)
      .map(|ptr| Self { ptr })
      .ok_or_else(|| Error::not_found("avfilter_get_by_name", format!("filter {}", name)))
  }

  /// # Safety
  /// `ptr` must be NULL or a registered filter.
  pub(crate) unsafe fn from_ptr(ptr: *const AVFilter) -> Option<Self> {
    NonNull::new(ptr as *mut AVFilter).map(|ptr| Self { ptr })
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVFilter {
    self.ptr.as_ptr()
  }

  pub fn name(&self) -> &'static str {
    unsafe { static_str(avk_filter_name(self.as_ptr())) }.unwrap_or("")
  }

  pub fn description(&self) -> Option<&'static str> {
    unsafe { static_str(avk_filter_description(self.as_ptr())) }
  }
}

impl std::fmt::Debug for Filter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Filter").field(&self.name()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lookup() {
    let volume = Filter::by_name("volume").unwrap();
    assert_eq!(volume.name(), "volume");
    assert!(volume.description().is_some());
  }

  #[test]
  fn test_unknown_filter() {
    let err = Filter::by_name("no_such_filter").unwrap_err();
    assert!(matches!(
      err,
      Error::Configuration {
        op: "avfilter_get_by_name",
        ..
      }
    ));
  }
}
