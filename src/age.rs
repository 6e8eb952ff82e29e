// Building-age lookup built from a `*_build.csv` detail file.
//
// A table is scoped to one batch (one directory's pairing of detail file and
// main file). The loader builds a fresh one per pairing and drops it once
// the paired main file has been normalized.
use crate::error::{LvrError, Result};
use crate::portal_csv::{self, find_column};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Some regional exports write the region segment inside a serial code as
/// `<region><letter>B` where the main file has `<region>AI`.
static REGIONAL_SUBCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z])[A-Z]B").expect("valid sub-code pattern"));

/// `RPUNMLRKKHIFFCB08CA` becomes `RPUNMLRKKHIFFAI08CA`; codes without the
/// segment pass through.
pub fn canonical_code(code: &str) -> Cow<'_, str> {
    REGIONAL_SUBCODE.replace_all(code, "${1}AI")
}

fn is_code_label(label: &str) -> bool {
    label.contains("編號") || label.to_ascii_lowercase().contains("serial number") || has_word(label, "code")
}

fn is_age_label(label: &str) -> bool {
    label.contains("屋齡") || has_word(label, "age")
}

fn has_word(label: &str, word: &str) -> bool {
    label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|w| w.eq_ignore_ascii_case(word))
}

#[derive(Debug, Default, Clone)]
pub struct AgeTable {
    ages: HashMap<String, u32>,
}

impl AgeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file, &path.display().to_string())?;
        info!(file = %path.display(), entries = table.len(), "building age table ready");
        Ok(table)
    }

    /// Column order differs between regional exports, so the code and age
    /// columns are located by their labels.
    pub fn from_reader<R: Read>(rdr: R, source: &str) -> Result<Self> {
        let (headers, rows) = portal_csv::open_reader(rdr)?;
        let code_col = find_column(&headers, is_code_label);
        let age_col = find_column(&headers, is_age_label);
        let (Some(code_col), Some(age_col)) = (code_col, age_col) else {
            return Err(LvrError::MalformedRow {
                file: source.to_string(),
                line: 1,
                reason: format!(
                    "header lacks a code or age column (code={:?}, age={:?})",
                    code_col, age_col
                ),
            });
        };

        let mut table = Self::new();
        for row in rows {
            let (line, record) = match row {
                Ok(r) => r,
                Err(e) => {
                    warn!(file = source, error = %e, "unreadable row in building file");
                    continue;
                }
            };
            let code = record.get(code_col).unwrap_or("").trim();
            let age_str = record.get(age_col).unwrap_or("").trim();
            if code.is_empty() || age_str.is_empty() {
                debug!(file = source, line, "building row without code or age");
                continue;
            }
            match age_str.parse::<i64>() {
                Ok(age) if age < 0 => warn!(file = source, line, code, age, "negative building age rejected"),
                Ok(age) => match u32::try_from(age) {
                    Ok(age) => table.insert(code, age),
                    Err(_) => warn!(file = source, line, code, age, "non-numeric building age rejected"),
                },
                Err(_) => warn!(file = source, line, code, age = age_str, "non-numeric building age rejected"),
            }
        }
        Ok(table)
    }

    /// Last write wins when two raw codes share a canonical form.
    pub fn insert(&mut self, code: &str, age: u32) {
        let key = canonical_code(code.trim()).into_owned();
        if let Some(prev) = self.ages.insert(key, age) {
            if prev != age {
                debug!(code, prev, age, "building age overwritten");
            }
        }
    }

    /// Age in years for a main-file serial code, 0 when unknown.
    pub fn resolve(&self, code: &str) -> u32 {
        self.ages
            .get(canonical_code(code.trim()).as_ref())
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.ages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }
}
