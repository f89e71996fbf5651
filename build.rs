//! Finds FFmpeg, compiles the field accessor shim and emits link directives.
//!
//! `FFMPEG_DIR` wins over pkg-config, which wins over the usual prefixes.
//! Shared libraries are linked unless the `static` feature is on.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

// Dependents before their dependencies, as static linking needs
const LIBS: [&str; 6] = [
  "avformat",
  "avfilter",
  "avcodec",
  "swscale",
  "swresample",
  "avutil",
];

// Optional external encoders a static FFmpeg may have been configured with
const EXTERNAL_CODECS: [&str; 12] = [
  "x264", "x265", "vpx", "aom", "dav1d", "SvtAv1Enc", "mp3lame", "opus", "vorbisenc", "vorbis",
  "ogg", "soxr",
];

fn main() {
  let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
  let prefix = ffmpeg_prefix(&os);

  build_shim(&prefix.join("include"));

  let lib_dir = prefix.join("lib");
  if env::var_os("CARGO_FEATURE_STATIC").is_some() {
    link_archives(&lib_dir, &os);
    link_system(&os, env::var_os("CARGO_FEATURE_HWACCEL").is_some());
  } else {
    if lib_dir.is_dir() {
      println!("cargo:rustc-link-search=native={}", lib_dir.display());
    }
    for lib in LIBS {
      println!("cargo:rustc-link-lib=dylib={lib}");
    }
  }

  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-changed=src/ffi/accessors.c");
  println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
}

fn ffmpeg_prefix(os: &str) -> PathBuf {
  if let Some(dir) = env::var_os("FFMPEG_DIR") {
    return PathBuf::from(dir);
  }

  let from_pkg_config = Command::new("pkg-config")
    .args(["--variable=prefix", "libavcodec"])
    .output()
    .ok()
    .filter(|out| out.status.success())
    .map(|out| PathBuf::from(String::from_utf8_lossy(&out.stdout).trim()))
    .filter(|dir| dir.is_dir());
  if let Some(dir) = from_pkg_config {
    return dir;
  }

  let candidates: &[&str] = match os {
    "macos" => &["/opt/homebrew", "/usr/local", "/opt/local"],
    "linux" => &["/usr", "/usr/local", "/opt/ffmpeg"],
    "windows" => &["C:\\ffmpeg", "C:\\Program Files\\ffmpeg"],
    _ => &[],
  };
  candidates
    .iter()
    .map(PathBuf::from)
    .find(|dir| dir.join("include/libavcodec/avcodec.h").exists())
    .unwrap_or_else(|| {
      println!("cargo:warning=FFmpeg headers not found; set FFMPEG_DIR");
      PathBuf::from("/usr/local")
    })
}

fn build_shim(include: &Path) {
  let mut build = cc::Build::new();
  build
    .file("src/ffi/accessors.c")
    .include(include)
    // Some distributions nest the headers one level down
    .include(include.join("ffmpeg"))
    .warnings(true)
    .extra_warnings(true);
  if cfg!(target_os = "macos") {
    build.flag("-Wno-deprecated-declarations");
  }
  build.compile("avkit_accessors");
}

fn link_archives(lib_dir: &Path, os: &str) {
  for lib in LIBS {
    let archive = lib_dir.join(format!("lib{lib}.a"));
    if !archive.exists() {
      panic!(
        "{} is missing; point FFMPEG_DIR at a static FFmpeg build or drop the `static` feature",
        archive.display()
      );
    }
    // A full path keeps the linker from preferring a shared copy
    println!("cargo:rustc-link-arg={}", archive.display());
  }

  let search = archive_search_path(os);
  let mut needs_cxx = false;
  for name in EXTERNAL_CODECS {
    let file = format!("lib{name}.a");
    if let Some(archive) = search.iter().map(|dir| dir.join(&file)).find(|p| p.exists()) {
      println!("cargo:rustc-link-arg={}", archive.display());
      needs_cxx |= name == "x265";
    }
  }
  if needs_cxx {
    match os {
      "macos" => println!("cargo:rustc-link-lib=c++"),
      "linux" => println!("cargo:rustc-link-lib=stdc++"),
      _ => {}
    }
  }
}

fn archive_search_path(os: &str) -> Vec<PathBuf> {
  let mut dirs: Vec<PathBuf> = env::var("LIBRARY_PATH")
    .map(|paths| env::split_paths(&paths).collect())
    .unwrap_or_default();
  let system: &[&str] = match os {
    "macos" => &["/opt/homebrew/lib", "/usr/local/lib", "/opt/local/lib"],
    "linux" => &[
      "/usr/lib",
      "/usr/local/lib",
      "/usr/lib/x86_64-linux-gnu",
      "/usr/lib/aarch64-linux-gnu",
    ],
    _ => &[],
  };
  dirs.extend(system.iter().map(PathBuf::from));
  if let Some(dir) = env::var_os("FFMPEG_DIR") {
    dirs.push(PathBuf::from(dir).join("lib"));
  }
  dirs
}

fn link_system(os: &str, hwaccel: bool) {
  let (libs, hw_libs): (&[&str], &[&str]) = match os {
    "macos" => {
      for framework in [
        "VideoToolbox",
        "CoreMedia",
        "CoreVideo",
        "CoreFoundation",
        "CoreServices",
        "AudioToolbox",
        "Security",
      ] {
        println!("cargo:rustc-link-lib=framework={framework}");
      }
      (&["bz2", "iconv", "lzma"], &[])
    }
    "linux" => (&["m", "pthread", "dl"], &["va", "va-drm", "va-x11"]),
    "windows" => (
      &[
        "bcrypt", "ole32", "oleaut32", "user32", "ws2_32", "secur32", "advapi32",
      ],
      &["mfplat", "mfuuid"],
    ),
    other => {
      println!("cargo:warning=no system libraries known for target os {other}");
      return;
    }
  };
  for lib in libs {
    println!("cargo:rustc-link-lib={lib}");
  }
  if hwaccel {
    for lib in hw_libs {
      println!("cargo:rustc-link-lib={lib}");
    }
  }
}
