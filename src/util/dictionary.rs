use std::ffi::CStr;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

use crate::error::{check, check_config, Result};
use crate::ffi::avutil::*;
use crate::ffi::{AVDictionary, AVDictionaryEntry};

use super::cstring;

/// `AV_DICT_IGNORE_SUFFIX`: with an empty key, matches every entry
const IGNORE_SUFFIX: i32 = 2;

/// Owned `AVDictionary`
///
/// An empty dictionary holds a NULL pointer, which is what FFmpeg expects for
/// "no options". Functions that consume options (`avcodec_open2`,
/// `avfilter_init_dict`, ...) remove the entries they recognised, so after
/// such a call the dictionary holds only the unused ones.
pub struct Dictionary {
  ptr: *mut AVDictionary,
}

impl Dictionary {
  pub fn new() -> Self {
    Self {
      ptr: ptr::null_mut(),
    }
  }

  /// Parse a "key=value:key2=value2" style string
  pub fn parse(options: &str, key_val_sep: &str, pairs_sep: &str) -> Result<Self> {
    let c_options = cstring("av_dict_parse_string", options)?;
    let c_kv = cstring("av_dict_parse_string", key_val_sep)?;
    let c_pairs = cstring("av_dict_parse_string", pairs_sep)?;

    let mut dict = Self::new();
    let ret = unsafe {
      av_dict_parse_string(
        &mut dict.ptr,
        c_options.as_ptr(),
        c_kv.as_ptr(),
        c_pairs.as_ptr(),
        0,
      )
    };
    check_config("av_dict_parse_string", ret)?;
    Ok(dict)
  }

  /// Set `key` to `value`, replacing any previous entry
  pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
    let c_key = cstring("av_dict_set", key)?;
    let c_value = cstring("av_dict_set", value)?;
    let ret = unsafe { av_dict_set(&mut self.ptr, c_key.as_ptr(), c_value.as_ptr(), 0) };
    check("av_dict_set", ret)?;
    Ok(())
  }

  /// Set `key` to the decimal string of `value`
  pub fn set_int(&mut self, key: &str, value: i64) -> Result<()> {
    let c_key = cstring("av_dict_set_int", key)?;
    let ret = unsafe { av_dict_set_int(&mut self.ptr, c_key.as_ptr(), value, 0) };
    check("av_dict_set_int", ret)?;
    Ok(())
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.as_dict_ref().get(key)
  }

  pub fn len(&self) -> usize {
    self.as_dict_ref().len()
  }

  pub fn is_empty(&self) -> bool {
    self.ptr.is_null() || self.len() == 0
  }

  pub fn iter(&self) -> DictionaryIter<'_> {
    self.as_dict_ref().iter()
  }

  /// Borrow as a read-only view
  pub fn as_dict_ref(&self) -> DictionaryRef<'_> {
    unsafe { DictionaryRef::from_ptr(self.ptr) }
  }

  pub fn as_ptr(&self) -> *const AVDictionary {
    self.ptr
  }

  /// Slot for functions that take `AVDictionary **`
  pub fn as_mut_ptr(&mut self) -> *mut *mut AVDictionary {
    &mut self.ptr
  }
}

impl Default for Dictionary {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for Dictionary {
  fn drop(&mut self) {
    unsafe { av_dict_free(&mut self.ptr) };
  }
}

// Owned and not shared with anything else
unsafe impl Send for Dictionary {}

impl fmt::Debug for Dictionary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

/// Optional dictionary argument as the `AVDictionary **` FFmpeg expects
pub(crate) fn opts_ptr(options: Option<&mut Dictionary>) -> *mut *mut AVDictionary {
  options.map_or(ptr::null_mut(), Dictionary::as_mut_ptr)
}

// ============================================================================
// Borrowed view
// ============================================================================

/// Read-only view of a dictionary owned elsewhere (stream or container
/// metadata)
#[derive(Clone, Copy)]
pub struct DictionaryRef<'a> {
  ptr: *const AVDictionary,
  _marker: PhantomData<&'a AVDictionary>,
}

impl<'a> DictionaryRef<'a> {
  /// # Safety
  /// `ptr` must be NULL or a dictionary that outlives `'a` unmodified.
  pub(crate) unsafe fn from_ptr(ptr: *const AVDictionary) -> Self {
    Self {
      ptr,
      _marker: PhantomData,
    }
  }

  /// Value for an exact (case-insensitive) key match
  pub fn get(&self, key: &str) -> Option<&'a str> {
    if self.ptr.is_null() {
      return None;
    }
    let c_key = cstring("av_dict_get", key).ok()?;
    let entry = unsafe { av_dict_get(self.ptr, c_key.as_ptr(), ptr::null(), 0) };
    unsafe { entry_value(entry) }
  }

  pub fn len(&self) -> usize {
    unsafe { av_dict_count(self.ptr) }.max(0) as usize
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn iter(&self) -> DictionaryIter<'a> {
    DictionaryIter {
      dict: self.ptr,
      prev: ptr::null(),
      _marker: PhantomData,
    }
  }
}

impl fmt::Debug for DictionaryRef<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

unsafe fn entry_value<'a>(entry: *const AVDictionaryEntry) -> Option<&'a str> {
  if entry.is_null() {
    return None;
  }
  let value = unsafe { (*entry).value };
  if value.is_null() {
    return None;
  }
  unsafe { CStr::from_ptr(value) }.to_str().ok()
}

/// Iterator over `(key, value)` pairs in insertion order
pub struct DictionaryIter<'a> {
  dict: *const AVDictionary,
  prev: *const AVDictionaryEntry,
  _marker: PhantomData<&'a AVDictionary>,
}

impl<'a> Iterator for DictionaryIter<'a> {
  type Item = (&'a str, &'a str);

  fn next(&mut self) -> Option<Self::Item> {
    if self.dict.is_null() {
      return None;
    }
    loop {
      let entry = unsafe { av_dict_get(self.dict, c"".as_ptr(), self.prev, IGNORE_SUFFIX) };
      if entry.is_null() {
        return None;
      }
      self.prev = entry;
      // Entries that are not valid UTF-8 are skipped
      let key = unsafe { CStr::from_ptr((*entry).key) }.to_str();
      let value = unsafe { entry_value(entry) };
      if let (Ok(key), Some(value)) = (key, value) {
        return Some((key, value));
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_and_get() {
    let mut dict = Dictionary::new();
    assert!(dict.is_empty());
    dict.set("volume", "0.90").unwrap();
    dict.set_int("qp", 20).unwrap();
    assert_eq!(dict.get("volume"), Some("0.90"));
    assert_eq!(dict.get("qp"), Some("20"));
    assert_eq!(dict.get("missing"), None);
    assert_eq!(dict.len(), 2);
  }

  #[test]
  fn test_overwrite() {
    let mut dict = Dictionary::new();
    dict.set("key", "a").unwrap();
    dict.set("key", "b").unwrap();
    assert_eq!(dict.get("key"), Some("b"));
    assert_eq!(dict.len(), 1);
  }

  #[test]
  fn test_iter_in_insertion_order() {
    let mut dict = Dictionary::new();
    dict.set("sample_fmts", "s16").unwrap();
    dict.set("sample_rates", "44100").unwrap();
    let pairs: Vec<_> = dict.iter().collect();
    assert_eq!(pairs, vec![("sample_fmts", "s16"), ("sample_rates", "44100")]);
  }

  #[test]
  fn test_parse() {
    let dict =
      Dictionary::parse("sample_fmts=s16:sample_rates=44100:channel_layouts=stereo", "=", ":")
        .unwrap();
    assert_eq!(dict.len(), 3);
    assert_eq!(dict.get("channel_layouts"), Some("stereo"));
  }

  #[test]
  fn test_interior_nul_rejected() {
    let mut dict = Dictionary::new();
    assert!(dict.set("bad\0key", "v").is_err());
  }

  #[test]
  fn test_empty_views() {
    let dict = Dictionary::default();
    assert_eq!(dict.iter().count(), 0);
    assert_eq!(dict.as_dict_ref().get("anything"), None);
  }
}
