//! Statement fingerprints.
//!
//! Two statements that differ only in literal values, comments, whitespace or
//! keyword case share a fingerprint:
//!
//! ```
//! use minperm_qreader::fingerprint;
//!
//! assert_eq!(
//!     fingerprint("SELECT * FROM t WHERE id IN (1, 2, 3) -- hot path"),
//!     fingerprint("select *  from t where id in (42)"),
//! );
//! ```

use regex::Regex;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:0x[0-9a-f]+|\d+(?:\.\d+)?(?:e[+-]?\d+)?)\b").expect("valid regex")
});

static IN_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bin\s*\(\s*\?(?:\s*,\s*\?)*\s*\)").expect("valid regex")
});

static VALUES_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bvalues?\s*\(\s*\?(?:\s*,\s*\?)*\s*\)(?:\s*,\s*\(\s*\?(?:\s*,\s*\?)*\s*\))*")
        .expect("valid regex")
});

/// Normalized identity of a statement.
pub fn fingerprint(query: &str) -> String {
    let stripped = strip_literals_and_comments(query).to_lowercase();
    let numbered = NUMBER.replace_all(&stripped, "?");
    let listed = IN_LIST.replace_all(&numbered, "in(?+)");
    let valued = VALUES_LIST.replace_all(&listed, "values(?+)");
    valued.trim().trim_end_matches(';').trim_end().to_string()
}

/// Replace quoted strings with `?`, drop comments and collapse whitespace.
///
/// Version comments (`/*!40101 ... */`) are dropped like any other comment.
/// Backtick-quoted identifiers are kept verbatim.
fn strip_literals_and_comments(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();
    let mut pending_space = false;

    let push = |out: &mut String, pending: &mut bool, s: &str| {
        if *pending && !out.is_empty() {
            out.push(' ');
        }
        *pending = false;
        out.push_str(s);
    };

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                while let Some(next) = chars.next() {
                    if next == '\\' {
                        chars.next();
                    } else if next == c {
                        if chars.peek() == Some(&c) {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
                push(&mut out, &mut pending_space, "?");
            }
            '`' => {
                let mut ident = String::from('`');
                for next in chars.by_ref() {
                    ident.push(next);
                    if next == '`' {
                        break;
                    }
                }
                push(&mut out, &mut pending_space, &ident);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                pending_space = true;
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                pending_space = true;
            }
            '#' => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                pending_space = true;
            }
            c if c.is_whitespace() => pending_space = true,
            c => {
                let mut buf = [0u8; 4];
                push(&mut out, &mut pending_space, c.encode_utf8(&mut buf));
            }
        }
    }

    out
}
