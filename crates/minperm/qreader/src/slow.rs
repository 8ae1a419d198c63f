//! MySQL slow query log.
//!
//! Entries are separated by their `#` header lines. One case is produced per
//! distinct fingerprint: the last entry seen for that fingerprint, placed where the
//! fingerprint first appeared. Session bookkeeping lines (`SET timestamp=...`,
//! `use <db>;`) and `# administrator command` entries never become statements.

use crate::fingerprint::fingerprint;
use crate::lines::lossy_lines;
use minperm_types::TestCase;
use regex::Regex;
use std::collections::HashMap;
use std::io::{self, BufRead};
use std::sync::LazyLock;
use tracing::debug;

static BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:, Version: .*started with:$|^Tcp port: |^Time\s+Id\s+Command\s+Argument)")
        .expect("valid regex")
});

static USE_DB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^use\s+`?([^`;\s]+)`?\s*;\s*$").expect("valid regex"));

static SCHEMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*Schema:\s*(\S*)").expect("valid regex"));

static SESSION_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^SET\s+(?:timestamp|insert_id|last_insert_id)\s*=").expect("valid regex")
});

#[derive(Default)]
struct Entry {
    lines: Vec<String>,
    database: Option<String>,
    admin: bool,
}

/// Cases in first-appearance order, deduplicated by fingerprint.
#[derive(Default)]
struct Groups {
    cases: Vec<TestCase>,
    index: HashMap<String, usize>,
}

impl Groups {
    fn push(&mut self, entry: Entry) {
        if entry.admin {
            return;
        }
        let joined = entry.lines.join("\n");
        let query = joined.trim().trim_end_matches(';').trim_end();
        if query.is_empty() {
            return;
        }

        let fp = fingerprint(query);
        let mut case = TestCase::new(query).with_fingerprint(fp.clone());
        if let Some(db) = entry.database {
            case = case.with_database(db);
        }

        match self.index.get(&fp) {
            Some(&slot) => self.cases[slot] = case,
            None => {
                self.index.insert(fp, self.cases.len());
                self.cases.push(case);
            }
        }
    }
}

pub fn parse(reader: impl BufRead) -> io::Result<Vec<TestCase>> {
    let mut groups = Groups::default();
    let mut database: Option<String> = None;
    let mut entry = Entry::default();
    let mut entries = 0usize;

    for line in lossy_lines(reader) {
        let line = line?;

        if BANNER.is_match(&line) {
            continue;
        }

        if line.starts_with('#') {
            if !entry.lines.is_empty() || entry.admin {
                groups.push(std::mem::take(&mut entry));
                entries += 1;
            }
            if line.starts_with("# administrator command:") {
                entry.admin = true;
            } else if let Some(caps) = SCHEMA.captures(&line) {
                if !caps[1].is_empty() {
                    database = Some(caps[1].to_string());
                }
            }
            entry.database = database.clone();
            continue;
        }

        if entry.lines.is_empty() {
            let trimmed = line.trim();
            if trimmed.is_empty() || SESSION_SET.is_match(trimmed) {
                continue;
            }
            if let Some(caps) = USE_DB.captures(trimmed) {
                database = Some(caps[1].to_string());
                entry.database = database.clone();
                continue;
            }
        }

        entry.lines.push(line);
    }

    if !entry.lines.is_empty() {
        groups.push(entry);
        entries += 1;
    }

    debug!(entries, distinct = groups.cases.len(), "Parsed slow log");
    Ok(groups.cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
/usr/sbin/mysqld, Version: 5.7.22-log (MySQL Community Server (GPL)). started with:
Tcp port: 3306  Unix socket: /var/run/mysqld/mysqld.sock
Time                 Id Command    Argument
# Time: 2018-05-17T17:04:52.123456Z
# User@Host: root[root] @ localhost []  Id:     3
# Query_time: 0.000123  Lock_time: 0.000050 Rows_sent: 1  Rows_examined: 0
use sakila;
SET timestamp=1526576692;
SELECT * FROM actor WHERE actor_id = 1;
# Time: 2018-05-17T17:04:53.000000Z
# User@Host: root[root] @ localhost []  Id:     3
# Query_time: 0.000200  Lock_time: 0.000000 Rows_sent: 0  Rows_examined: 0
SET timestamp=1526576693;
UPDATE film
SET title = 'x'
WHERE film_id = 9;
# Time: 2018-05-17T17:04:54.000000Z
# User@Host: root[root] @ localhost []  Id:     3
# Query_time: 0.000010  Lock_time: 0.000000 Rows_sent: 0  Rows_examined: 0
SET timestamp=1526576694;
# administrator command: Quit;
# Time: 2018-05-17T17:04:55.000000Z
# User@Host: app[app] @ 10.0.0.2 []  Id:     5
# Schema: employees  Last_errno: 0  Killed: 0
# Query_time: 0.000300  Lock_time: 0.000000 Rows_sent: 1  Rows_examined: 1
SET timestamp=1526576695;
SELECT * FROM actor WHERE actor_id = 42;
";

    #[test]
    fn test_entries_grouped_by_fingerprint() {
        let cases = parse(LOG.as_bytes()).unwrap();
        let queries: Vec<&str> = cases.iter().map(|c| c.query.as_str()).collect();
        assert_eq!(
            queries,
            vec![
                "SELECT * FROM actor WHERE actor_id = 42",
                "UPDATE film\nSET title = 'x'\nWHERE film_id = 9",
            ]
        );
        assert_eq!(
            cases[0].fingerprint.as_deref(),
            Some("select * from actor where actor_id = ?")
        );
    }

    #[test]
    fn test_last_occurrence_carries_database() {
        let cases = parse(LOG.as_bytes()).unwrap();
        assert_eq!(cases[0].database.as_deref(), Some("employees"));
        assert_eq!(cases[1].database.as_deref(), Some("sakila"));
    }

    #[test]
    fn test_administrator_commands_discarded() {
        let log = "\
# Time: 2018-05-17T17:04:54.000000Z
# administrator command: Ping;
# Time: 2018-05-17T17:04:55.000000Z
SET timestamp=1526576695;
SHOW STATUS;
";
        let cases = parse(log.as_bytes()).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].query, "SHOW STATUS");
    }

    #[test]
    fn test_empty_log() {
        assert!(parse("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_binary_literal_does_not_lose_other_entries() {
        let log: &[u8] = b"\
# Time: 2018-05-17T17:04:52.000000Z
SELECT * FROM actor WHERE actor_id = 1;
# Time: 2018-05-17T17:04:53.000000Z
INSERT INTO blobs VALUES ('\xff\xfe');
# Time: 2018-05-17T17:04:54.000000Z
DELETE FROM film WHERE film_id = 3;
";
        let cases = parse(log).unwrap();
        let queries: Vec<&str> = cases.iter().map(|c| c.query.as_str()).collect();
        assert_eq!(
            queries,
            vec![
                "SELECT * FROM actor WHERE actor_id = 1",
                "INSERT INTO blobs VALUES ('\u{FFFD}\u{FFFD}')",
                "DELETE FROM film WHERE film_id = 3",
            ]
        );
    }
}
