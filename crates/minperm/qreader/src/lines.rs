//! Line splitting that tolerates bytes which are not UTF-8.
//!
//! Logs carry whatever the client sent: binary literals, latin1 data. Invalid
//! sequences are replaced with U+FFFD so one entry cannot fail the whole read.

use std::io::{self, BufRead};

/// Lines of `reader` without their `\n` / `\r\n` terminators, decoded lossily.
pub(crate) struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

pub(crate) fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
