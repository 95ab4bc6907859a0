// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! All utility errors flow through [`UResult`]. An error that implements
//! [`UError`] carries its own exit code; a worker failure that has already
//! been reported can instead raise the process-wide exit code with
//! [`set_exit_code`] and let `uumain` return `Ok(())`.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicI32, Ordering};

static EXIT_CODE: AtomicI32 = AtomicI32::new(0);

pub fn get_exit_code() -> i32 {
    EXIT_CODE.load(Ordering::SeqCst)
}

pub fn set_exit_code(code: i32) {
    EXIT_CODE.store(code, Ordering::SeqCst);
}

pub type UResult<T> = Result<T, Box<dyn UError>>;

pub trait UError: Error + Send {
    /// The process exit code for this error.
    fn code(&self) -> i32 {
        1
    }

    /// Whether a usage hint should follow the message.
    fn usage(&self) -> bool {
        false
    }
}

impl<T: UError + 'static> From<T> for Box<dyn UError> {
    fn from(t: T) -> Self {
        Box::new(t)
    }
}

/// A simple error with a message and an exit code.
#[derive(Debug)]
pub struct USimpleError {
    pub code: i32,
    pub message: String,
}

impl USimpleError {
    #[allow(clippy::new_ret_no_self)]
    pub fn new<S: Into<String>>(code: i32, message: S) -> Box<dyn UError> {
        Box::new(Self {
            code,
            message: message.into(),
        })
    }
}

impl Display for USimpleError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl Error for USimpleError {}

impl UError for USimpleError {
    fn code(&self) -> i32 {
        self.code
    }
}

/// Like [`USimpleError`], but the message is followed by a `--help` hint.
#[derive(Debug)]
pub struct UUsageError {
    pub code: i32,
    pub message: String,
}

impl UUsageError {
    #[allow(clippy::new_ret_no_self)]
    pub fn new<S: Into<String>>(code: i32, message: S) -> Box<dyn UError> {
        Box::new(Self {
            code,
            message: message.into(),
        })
    }
}

impl Display for UUsageError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl Error for UUsageError {}

impl UError for UUsageError {
    fn code(&self) -> i32 {
        self.code
    }

    fn usage(&self) -> bool {
        true
    }
}
