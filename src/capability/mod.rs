//! Read-Only Query Guard
//!
//! Reports only ever read. Every query is checked here before it reaches the
//! server so that a mistyped report query can never modify the winery data.
//!
//! # Validation Strategy
//! - Comments are stripped (string literals are left untouched)
//! - Empty and multi-statement queries are rejected
//! - The leading keyword decides: `SELECT`, `WITH`, `SHOW`, `DESCRIBE`, `DESC`
//!   and `EXPLAIN` are permitted, everything else is rejected

use crate::error::{Result, VintageError};

/// Statement category derived from the leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCategory {
    /// Returns rows without modifying anything
    Read,
    /// Anything that may modify data or schema
    Write,
}

/// Validate that a query is a single read-only statement
pub fn validate_query(sql: &str) -> Result<()> {
    let statement = preprocess_sql(sql)?;

    match categorize(&statement) {
        QueryCategory::Read => Ok(()),
        QueryCategory::Write => Err(VintageError::capability_violation(format!(
            "Report queries must be read-only; refusing to run:\n\n{}",
            sql.trim()
        ))),
    }
}

/// Categorize a preprocessed statement by its leading keyword
#[must_use]
pub fn categorize(statement: &str) -> QueryCategory {
    let mut words = statement.split_whitespace().map(str::to_uppercase);

    let first = match words.next() {
        Some(word) if word == "EXPLAIN" => words.next(),
        other => other,
    };

    match first.as_deref() {
        Some("SELECT" | "SHOW" | "DESCRIBE" | "DESC") => QueryCategory::Read,
        // A CTE may end in a data-modifying statement
        Some("WITH") => {
            let upper = statement.to_uppercase();
            let writes = ["INSERT", "UPDATE", "DELETE", "REPLACE"]
                .iter()
                .any(|kw| upper.split_whitespace().any(|w| w == *kw));
            if writes {
                QueryCategory::Write
            } else {
                QueryCategory::Read
            }
        }
        _ => QueryCategory::Write,
    }
}

/// Trim, strip comments, and reject empty or multi-statement input
fn preprocess_sql(sql: &str) -> Result<String> {
    let stripped = strip_comments(sql);
    let statement = stripped.trim().trim_end_matches(';').trim();

    if statement.is_empty() {
        return Err(VintageError::invalid_input("Query cannot be empty"));
    }

    if contains_unquoted(statement, ';') {
        return Err(VintageError::invalid_input("Multi-statement queries are not supported"));
    }

    Ok(statement.to_string())
}

/// Strip `-- line` and `/* block */` comments outside string literals
fn strip_comments(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            result.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' | '`' => {
                quote = Some(ch);
                result.push(ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for ch in chars.by_ref() {
                    if prev == '*' && ch == '/' {
                        break;
                    }
                    prev = ch;
                }
                result.push(' ');
            }
            _ => result.push(ch),
        }
    }

    result
}

fn contains_unquoted(sql: &str, needle: char) -> bool {
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if matches!(ch, '\'' | '"' | '`') => quote = Some(ch),
            None if ch == needle => return true,
            None => {}
        }
    }
    false
}
