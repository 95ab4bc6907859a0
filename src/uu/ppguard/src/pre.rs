// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! The pre stage: rewrite every `#include` line into a marker plus a
//! commented pragma carrying the same random tag.

use log::debug;
use rand::Rng;
use regex::Regex;

use crate::error::LineResult;
use crate::line::{COMMENT_CLOSE, COMMENT_OPEN, MARKER_CLOSE, MARKER_OPEN};

/// What counts as an `#include` directive, anchored at the start of the line.
pub const INCLUDE_PATTERN: &str = r"^#[ \t]*include[ \t]+.*";

pub struct PreStage<I, R> {
    input: I,
    rgx: Regex,
    rng: R,
    pending: Option<String>,
}

impl<I, R> PreStage<I, R> {
    pub fn new(input: I, rgx: Regex, rng: R) -> Self {
        Self {
            input,
            rgx,
            rng,
            pending: None,
        }
    }
}

impl<I, R> Iterator for PreStage<I, R>
where
    I: Iterator<Item = LineResult>,
    R: Rng,
{
    type Item = LineResult;

    fn next(&mut self) -> Option<LineResult> {
        if let Some(pragma) = self.pending.take() {
            return Some(Ok(pragma));
        }
        match self.input.next()? {
            Err(e) => Some(Err(e)),
            Ok(line) => {
                if !self.rgx.is_match(&line) {
                    return Some(Ok(line));
                }
                debug!("guarding {:?}", line);
                let tag: i64 = self.rng.random_range(0..=999_999);
                let stripped = line.strip_suffix('\n').unwrap_or(&line);
                self.pending = Some(format!("{COMMENT_OPEN}{tag}{stripped}{COMMENT_CLOSE}"));
                Some(Ok(format!("{MARKER_OPEN}{tag}{MARKER_CLOSE}")))
            }
        }
    }
}
