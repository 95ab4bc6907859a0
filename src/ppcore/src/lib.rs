// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! Shared support code for the `ppguard` utility: error machinery, user-facing
//! diagnostic macros, display helpers and line iteration.

use std::ffi::OsString;
use std::path::PathBuf;

#[macro_use]
pub mod macros;

pub mod display;
pub mod error;
pub mod lines;

/// Conversion trait for the argument iterator handed to `uumain`.
pub trait Args: Iterator<Item = OsString> + Sized {}

impl<T: Iterator<Item = OsString> + Sized> Args for T {}

/// The name the binary was invoked as, for diagnostic prefixes.
pub fn util_name() -> String {
    std::env::args_os()
        .next()
        .map(PathBuf::from)
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "ppguard".to_string())
}
