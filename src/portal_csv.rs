// Reading the portal's CSV extracts.
//
// Every extract starts with a Traditional Chinese header row, usually
// followed by an English translation of it. The Chinese row becomes the
// header (with any UTF-8 BOM removed from its first cell); the English row
// is dropped before callers see any data.
use crate::error::Result;
use crate::util::{is_english_header, strip_bom};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub struct PortalRows<R> {
    records: StringRecordsIntoIter<R>,
    first: bool,
}

pub fn open_path(path: &Path) -> Result<(StringRecord, PortalRows<File>)> {
    let file = File::open(path)?;
    open_reader(file)
}

pub fn open_reader<R: Read>(rdr: R) -> Result<(StringRecord, PortalRows<R>)> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers: StringRecord = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| if i == 0 { strip_bom(h).trim() } else { h.trim() })
        .collect();
    reader.set_headers(headers.clone());
    let rows = PortalRows {
        records: reader.into_records(),
        first: true,
    };
    Ok((headers, rows))
}

/// Position of the first header label accepted by `pred`.
pub fn find_column<F>(headers: &StringRecord, pred: F) -> Option<usize>
where
    F: Fn(&str) -> bool,
{
    headers.iter().position(pred)
}

impl<R: Read> Iterator for PortalRows<R> {
    /// Source line number plus the record.
    type Item = Result<(u64, StringRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(r) => r,
                Err(e) => return Some(Err(e.into())),
            };
            let first = std::mem::replace(&mut self.first, false);
            if first && is_english_header(record.iter()) {
                continue;
            }
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let line = record.position().map_or(0, |p| p.line());
            return Some(Ok((line, record)));
        }
    }
}
