//! Plain statement files.
//!
//! A statement ends on the line whose last non-blank character is `;`. Lines in
//! between are kept with their line breaks. Blank lines between statements are
//! skipped, and a trailing statement without a terminator is kept.

use crate::fingerprint::fingerprint;
use crate::lines::lossy_lines;
use minperm_types::TestCase;
use std::io::{self, BufRead};

pub fn parse(reader: impl BufRead) -> io::Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    let mut buffer: Vec<String> = Vec::new();

    for line in lossy_lines(reader) {
        let line = line?;
        let trimmed = line.trim_end();
        if buffer.is_empty() && trimmed.trim_start().is_empty() {
            continue;
        }
        buffer.push(trimmed.to_string());
        if trimmed.ends_with(';') {
            push_statement(&mut cases, &buffer);
            buffer.clear();
        }
    }
    push_statement(&mut cases, &buffer);

    Ok(cases)
}

fn push_statement(cases: &mut Vec<TestCase>, lines: &[String]) {
    let joined = lines.join("\n");
    let query = joined.trim().trim_end_matches(';').trim_end();
    if query.is_empty() {
        return;
    }
    cases.push(TestCase::new(query).with_fingerprint(fingerprint(query)));
}
