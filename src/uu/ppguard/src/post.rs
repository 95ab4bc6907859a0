// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! The post stage: a sliding two-line window that decides, for each pair of
//! adjacent lines, which of the shapes planted by the pre stage survived the
//! preprocessor and what to emit for them.
//!
//! The decision is purely structural; the tags of a marker and the pragma
//! after it are not compared. A window that restores an include emits the
//! pragma payload without its newline and arms `skip`; the next window then
//! emits the lone `"\n"` that completes the line. That split is what makes
//! a pre-then-post run reproduce its input byte for byte.

use crate::error::LineResult;
use crate::line::{marker_tag, pragma_parts};

pub struct PostStage<I> {
    input: I,
    prev: Option<String>,
    skip: bool,
    windowed: bool,
    done: bool,
}

impl<I> PostStage<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            prev: None,
            skip: false,
            windowed: false,
            done: false,
        }
    }
}

impl<I: Iterator<Item = LineResult>> Iterator for PostStage<I> {
    type Item = LineResult;

    fn next(&mut self) -> Option<LineResult> {
        if self.done {
            return None;
        }
        if self.prev.is_none() {
            match self.input.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(first)) => self.prev = Some(first),
            }
        }
        match self.input.next() {
            None => {
                self.done = true;
                // The final stream line is the `nxt` of the last window and
                // is emitted verbatim unless already consumed. A stream of
                // fewer than two lines never formed a window and yields
                // nothing.
                if self.windowed && !self.skip {
                    return Some(Ok(self.prev.take().unwrap_or_default()));
                }
                None
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            Some(Ok(nxt)) => {
                self.windowed = true;
                let cur = self.prev.replace(nxt);
                let cur = cur.unwrap_or_default();
                let nxt = self.prev.as_deref().unwrap_or_default();
                if self.skip {
                    self.skip = false;
                    return Some(Ok("\n".to_string()));
                }
                let marker = marker_tag(&cur);
                let (pragma, payload) = pragma_parts(nxt);
                let out = match (marker, pragma) {
                    // Both regular; `nxt` gets its turn as `cur`.
                    (-1, -1) => cur,
                    // A marker the preprocessor kept, with its pragma
                    // stripped away along with the other comments.
                    (_, -1) => String::new(),
                    // A pragma whose marker fell inside a deleted branch.
                    (-1, _) => {
                        self.skip = true;
                        String::new()
                    }
                    // Marker and pragma intact: restore the include.
                    (_, _) => {
                        self.skip = true;
                        payload.to_string()
                    }
                };
                Some(Ok(out))
            }
        }
    }
}
