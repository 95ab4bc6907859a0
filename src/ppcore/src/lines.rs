// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! Line iteration that, unlike [`BufRead::lines`], keeps the trailing
//! newline on every line. The final line of a stream may lack one.

use std::io::{self, BufRead};

pub struct Lines<R> {
    reader: R,
}

pub fn lines<R: BufRead>(reader: R) -> Lines<R> {
    Lines { reader }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<io::Result<String>> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}
