//! MySQL general query log.
//!
//! Each entry starts with an optional timestamp, the connection id and the command
//! name; anything that does not start that way continues the previous entry. Only
//! `Query` entries become statements. `Init DB` and `Connect ... on <db>` entries
//! track each connection's current database.

use crate::fingerprint::fingerprint;
use crate::lines::lossy_lines;
use minperm_types::TestCase;
use regex::Regex;
use std::collections::HashMap;
use std::io::{self, BufRead};
use std::sync::LazyLock;

static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:\d{6}\s+\d{1,2}:\d\d:\d\d|\d{4}-\d{1,2}-\d{1,2}T\d\d:\d\d:\d\d\.\d+(?:Z|[+-]?\d\d:\d\d)?)?",
        r"\s+(\d+)\s([A-Z][A-Za-z]*(?: DB| stmt| List| user| option| Out| Slave| Dump| Data)?)",
        r"(?:\s+(.*))?$",
    ))
    .expect("valid regex")
});

static CONNECT_DB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\son (\S*)(?:\s|$)").expect("valid regex"));

static BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:, Version: .*started with:$|^Tcp port: |^Time\s+Id\s+Command\s+Argument)")
        .expect("valid regex")
});

/// The entry being accumulated.
struct Entry {
    thread: u64,
    query: String,
}

pub fn parse(reader: impl BufRead) -> io::Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    let mut databases: HashMap<u64, String> = HashMap::new();
    let mut current: Option<Entry> = None;

    for line in lossy_lines(reader) {
        let line = line?;
        if BANNER.is_match(&line) {
            continue;
        }

        let Some(caps) = ENTRY.captures(&line) else {
            if let Some(entry) = current.as_mut() {
                entry.query.push('\n');
                entry.query.push_str(&line);
            }
            continue;
        };

        if let Some(entry) = current.take() {
            push_query(&mut cases, &databases, entry);
        }

        let thread: u64 = caps[1].parse().unwrap_or_default();
        let argument = caps.get(3).map_or("", |m| m.as_str()).trim_end();
        match &caps[2] {
            "Query" => {
                current = Some(Entry {
                    thread,
                    query: argument.to_string(),
                })
            }
            "Init DB" => {
                databases.insert(thread, argument.trim().to_string());
            }
            "Connect" => {
                match CONNECT_DB.captures(argument) {
                    Some(db) if !db[1].is_empty() => {
                        databases.insert(thread, db[1].to_string());
                    }
                    _ => {
                        databases.remove(&thread);
                    }
                }
            }
            "Quit" => {
                databases.remove(&thread);
            }
            _ => {}
        }
    }

    if let Some(entry) = current.take() {
        push_query(&mut cases, &databases, entry);
    }

    Ok(cases)
}

fn push_query(cases: &mut Vec<TestCase>, databases: &HashMap<u64, String>, entry: Entry) {
    let query = entry.query.trim();
    if query.is_empty() {
        return;
    }
    let mut case = TestCase::new(query).with_fingerprint(fingerprint(query));
    if let Some(db) = databases.get(&entry.thread) {
        case = case.with_database(db.as_str());
    }
    cases.push(case);
}
