//! Filter instances inside a graph

use std::ffi::{c_void, CStr};
use std::ptr;

use crate::error::{check, check_config, Result};
use crate::ffi::{
  accessors::{avk_filterctx_filter, avk_filterctx_name},
  avfilter::{avfilter_init_dict, avfilter_init_str, avfilter_link},
  avutil::{av_opt_set, av_opt_set_int, av_opt_set_q},
  AVFilterContext, AVRational, AV_OPT_SEARCH_CHILDREN,
};
use crate::util::{cstring, opts_ptr, Dictionary};

use super::Filter;

/// A filter instance, borrowed from its [`FilterGraph`](super::FilterGraph)
///
/// Methods take `&self`: several instances are in hand at once while a graph
/// is wired up, and the graph owns all of them.
#[repr(transparent)]
pub struct FilterContext(AVFilterContext);

impl FilterContext {
  /// # Safety
  /// `ptr` must be a filter instance of a graph that outlives `'a`.
  pub(crate) unsafe fn from_ptr<'a>(ptr: *mut AVFilterContext) -> &'a FilterContext {
    unsafe { &*(ptr as *const FilterContext) }
  }

  #[inline]
  pub fn as_ptr(&self) -> *mut AVFilterContext {
    &self.0 as *const AVFilterContext as *mut AVFilterContext
  }

  /// Instance name given at allocation
  pub fn name(&self) -> &str {
    let name = unsafe { avk_filterctx_name(self.as_ptr()) };
    if name.is_null() {
      return "";
    }
    unsafe { CStr::from_ptr(name) }.to_str().unwrap_or("")
  }

  pub fn filter(&self) -> Option<Filter> {
    unsafe { Filter::from_ptr(avk_filterctx_filter(self.as_ptr())) }
  }

  /// Name of the filter implementation ("abuffer", "volume", ...)
  pub fn filter_name(&self) -> &'static str {
    self.filter().map_or("", |f| f.name())
  }

  /// Set an option on the instance or its children before init
  pub fn opt_set<V: OptionValue>(&self, name: &str, value: V) -> Result<()> {
    let c_name = cstring(V::OP, name)?;
    let ret = value.set(self.as_ptr() as *mut c_void, c_name.as_ptr(), AV_OPT_SEARCH_CHILDREN)?;
    check_config(V::OP, ret)?;
    Ok(())
  }

  /// Initialize with the options set so far
  pub fn init(&self) -> Result<()> {
    let ret = unsafe { avfilter_init_str(self.as_ptr(), ptr::null()) };
    check_config("avfilter_init_str", ret)?;
    Ok(())
  }

  /// Initialize from a `key=value:key2=value2` string
  pub fn init_str(&self, args: &str) -> Result<()> {
    let c_args = cstring("avfilter_init_str", args)?;
    let ret = unsafe { avfilter_init_str(self.as_ptr(), c_args.as_ptr()) };
    check_config("avfilter_init_str", ret)?;
    Ok(())
  }

  /// Initialize from a dictionary; options not consumed stay in it
  pub fn init_dict(&self, options: &mut Dictionary) -> Result<()> {
    let ret = unsafe { avfilter_init_dict(self.as_ptr(), opts_ptr(Some(options))) };
    check_config("avfilter_init_dict", ret)?;
    Ok(())
  }

  /// Connect output pad `src_pad` of this instance to input `dst_pad` of `dst`
  pub fn link(&self, src_pad: u32, dst: &FilterContext, dst_pad: u32) -> Result<()> {
    let ret = unsafe { avfilter_link(self.as_ptr(), src_pad, dst.as_ptr(), dst_pad) };
    check("avfilter_link", ret)?;
    Ok(())
  }

  /// Link pad 0 to pad 0 of `dst` and return `dst`, for chaining
  pub fn link_to<'a>(&self, dst: &'a FilterContext) -> Result<&'a FilterContext> {
    self.link(0, dst, 0)?;
    Ok(dst)
  }
}

impl std::fmt::Debug for FilterContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FilterContext")
      .field("name", &self.name())
      .field("filter", &self.filter_name())
      .finish()
  }
}

// ============================================================================
// Option Values
// ============================================================================

mod sealed {
  pub trait Sealed {}
}

/// Values accepted by [`FilterContext::opt_set`]
pub trait OptionValue: sealed::Sealed {
  /// Native setter used, reported in errors
  const OP: &'static str;

  #[doc(hidden)]
  fn set(self, obj: *mut c_void, name: *const std::ffi::c_char, flags: i32) -> Result<i32>;
}

impl sealed::Sealed for &str {}
impl OptionValue for &str {
  const OP: &'static str = "av_opt_set";

  fn set(self, obj: *mut c_void, name: *const std::ffi::c_char, flags: i32) -> Result<i32> {
    let value = cstring(Self::OP, self)?;
    Ok(unsafe { av_opt_set(obj, name, value.as_ptr(), flags) })
  }
}

impl sealed::Sealed for i64 {}
impl OptionValue for i64 {
  const OP: &'static str = "av_opt_set_int";

  fn set(self, obj: *mut c_void, name: *const std::ffi::c_char, flags: i32) -> Result<i32> {
    Ok(unsafe { av_opt_set_int(obj, name, self, flags) })
  }
}

impl sealed::Sealed for i32 {}
impl OptionValue for i32 {
  const OP: &'static str = "av_opt_set_int";

  fn set(self, obj: *mut c_void, name: *const std::ffi::c_char, flags: i32) -> Result<i32> {
    i64::from(self).set(obj, name, flags)
  }
}

impl sealed::Sealed for AVRational {}
impl OptionValue for AVRational {
  const OP: &'static str = "av_opt_set_q";

  fn set(self, obj: *mut c_void, name: *const std::ffi::c_char, flags: i32) -> Result<i32> {
    Ok(unsafe { av_opt_set_q(obj, name, self, flags) })
  }
}
