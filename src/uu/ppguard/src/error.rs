// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::io;
use thiserror::Error;

use ppcore::error::UError;

/// Errors raised while filtering one input/output pair.
#[derive(Debug, Error)]
pub enum PpguardError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Subprocess '{pid}' exited with non-zero code: {code}")]
    ChildFailed { pid: u32, code: i32 },
    #[error("Subprocess '{pid}' did not exit within {timeout}s")]
    ChildTimeout { pid: u32, timeout: f64 },
    #[error("fd #{0} is closed.")]
    ClosedPipe(u32),
    #[error("stdbuf is not found in $PATH.")]
    StdbufNotFound,
    #[error("clang is not found in $PATH. Specify the path to the preprocessor executable. See -h,--help.")]
    PreprocessorNotFound,
}

impl UError for PpguardError {}

/// One element of a lazy line stream: a line, or the failure that ended it.
pub type LineResult = Result<String, PpguardError>;
