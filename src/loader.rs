use crate::age::AgeTable;
use crate::error::{LvrError, Result};
use crate::normalize::{normalize_row, paired_main_name, FileMeta, RowKind};
use crate::portal_csv;
use crate::reference;
use crate::types::TransactionRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub directories: usize,
    pub files_read: usize,
    pub files_skipped: usize,
    pub total_rows: usize,
    pub records: usize,
    pub parse_errors: usize,
    pub ages_resolved: usize,
    pub towns_backfilled: usize,
}

impl LoadReport {
    pub fn merge(&mut self, other: &LoadReport) {
        self.directories += other.directories;
        self.files_read += other.files_read;
        self.files_skipped += other.files_skipped;
        self.total_rows += other.total_rows;
        self.records += other.records;
        self.parse_errors += other.parse_errors;
        self.ages_resolved += other.ages_resolved;
        self.towns_backfilled += other.towns_backfilled;
    }
}

/// Ingest every immediate subdirectory of `root` (the quarterly
/// `data0..dataN` layout). A root without subdirectories is ingested as a
/// single batch. A directory that cannot be read is logged and skipped.
pub fn ingest_root(root: &Path) -> Result<(Vec<TransactionRecord>, LoadReport)> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    if dirs.is_empty() {
        dirs.push(root.to_path_buf());
    }

    let mut all = Vec::new();
    let mut report = LoadReport::default();
    for dir in &dirs {
        match ingest_directory(dir) {
            Ok((records, dir_report)) => {
                all.extend(records);
                report.merge(&dir_report);
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "directory skipped"),
        }
    }
    Ok((all, report))
}

/// Ingest one directory of extracts as a single batch.
///
/// 1. split `*.csv` files into building detail files and the rest
/// 2. build one age table per detail file, keyed by its main file's name
/// 3. normalize every row of every other file, with the matching age table
/// 4. fill in town codes still missing after address matching
///
/// Detail files whose main file is absent are skipped entirely. Bad files
/// and rows are logged and skipped; they never abort the batch.
pub fn ingest_directory(dir: &Path) -> Result<(Vec<TransactionRecord>, LoadReport)> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.to_ascii_lowercase().ends_with(".csv"))
        .collect();
    names.sort();
    let present: HashSet<&str> = names.iter().map(String::as_str).collect();

    let mut report = LoadReport {
        directories: 1,
        ..LoadReport::default()
    };
    let mut build_files = Vec::new();
    let mut other_files = Vec::new();
    for name in &names {
        match FileMeta::from_file_name(name) {
            Some(meta) if meta.kind == RowKind::Build => build_files.push(meta),
            Some(meta) => other_files.push(meta),
            None => {
                debug!(file = %name, "not an extract, ignored");
                report.files_skipped += 1;
            }
        }
    }

    let mut age_tables: HashMap<String, AgeTable> = HashMap::new();
    for meta in &build_files {
        let main = meta.main_file_name();
        if !present.contains(main.as_str()) {
            warn!(error = %missing_main(meta, &main), "building file skipped");
            report.files_skipped += 1;
            continue;
        }
        match AgeTable::build(&dir.join(&meta.file_name)) {
            Ok(table) => {
                report.files_read += 1;
                age_tables.insert(main, table);
            }
            Err(e) => {
                warn!(file = %meta.file_name, error = %e, "building file unreadable, ages default to 0");
                report.files_skipped += 1;
            }
        }
    }

    let mut records = Vec::new();
    for meta in &other_files {
        if meta.kind.is_detail() {
            let main = paired_main_name(&meta.file_name);
            if !present.contains(main.as_str()) {
                warn!(error = %missing_main(meta, &main), "detail file skipped");
                report.files_skipped += 1;
                continue;
            }
        }
        // The table is scoped to its main file and dropped once that file is done.
        let ages = if meta.kind.needs_age() {
            age_tables.remove(&meta.file_name)
        } else {
            None
        };
        match process_file(&dir.join(&meta.file_name), meta, ages.as_ref(), &mut report) {
            Ok(rows) => {
                report.files_read += 1;
                records.extend(rows);
            }
            Err(e) => {
                warn!(file = %meta.file_name, error = %e, "file skipped");
                report.files_skipped += 1;
            }
        }
    }

    report.towns_backfilled = backfill_town_codes(&mut records);
    report.records = records.len();
    info!(
        dir = %dir.display(),
        records = report.records,
        parse_errors = report.parse_errors,
        "directory ingested"
    );
    Ok((records, report))
}

fn missing_main(meta: &FileMeta, main: &str) -> LvrError {
    LvrError::MissingMainFile {
        file: meta.file_name.clone(),
        main: main.to_string(),
    }
}

fn process_file(
    path: &Path,
    meta: &FileMeta,
    ages: Option<&AgeTable>,
    report: &mut LoadReport,
) -> Result<Vec<TransactionRecord>> {
    let (headers, rows) = portal_csv::open_path(path)?;
    let mut out = Vec::new();
    for row in rows {
        report.total_rows += 1;
        let (line, record) = match row {
            Ok(r) => r,
            Err(e) => {
                report.parse_errors += 1;
                warn!(file = %meta.file_name, error = %e, "unreadable row skipped");
                continue;
            }
        };
        match normalize_row(meta, &headers, &record, line, ages) {
            Ok(rec) => {
                if rec.age > 0 && ages.is_some() {
                    report.ages_resolved += 1;
                }
                out.push(rec);
            }
            Err(e) => {
                report.parse_errors += 1;
                warn!(error = %e, "row skipped");
            }
        }
    }
    info!(file = %meta.file_name, rows = out.len(), "file normalized");
    Ok(out)
}

/// Records that reached this point without a town code but with a town name
/// get one from the reference table: an exact title match first, then the
/// first title found in the address. Returns how many were filled.
pub fn backfill_town_codes(records: &mut [TransactionRecord]) -> usize {
    let mut filled = 0;
    for rec in records
        .iter_mut()
        .filter(|r| r.town_code.is_empty() && !r.town_name.is_empty())
    {
        let town = reference::town_by_title(&rec.city_code, &rec.town_name)
            .or_else(|| reference::town_in_address(&rec.city_code, &rec.address));
        if let Some(town) = town {
            rec.town_code = town.code.to_string();
            filled += 1;
        }
    }
    filled
}
