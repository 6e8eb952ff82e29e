use crate::types::{MonthlyRow, SummaryStats, TransactionRecord, YearMonth};
use crate::util::{average, format_number};
use std::collections::BTreeMap;

#[derive(Default)]
struct Acc {
    sum: f64,
    count: usize,
}

fn accumulate(records: &[TransactionRecord]) -> BTreeMap<u32, Acc> {
    let mut map: BTreeMap<u32, Acc> = BTreeMap::new();
    for r in records {
        // Land and parking sub-records carry no date and cannot be placed.
        let Some(date) = r.trade_date else { continue };
        let e = map.entry(date.year_month().key()).or_default();
        e.sum += r.price_unit as f64;
        e.count += 1;
    }
    map
}

/// Mean unit price per `YYYMM` month, oldest month first.
///
/// Only months with at least one dated record appear.
pub fn monthly_average(records: &[TransactionRecord]) -> BTreeMap<u32, f64> {
    accumulate(records)
        .into_iter()
        .map(|(key, acc)| (key, acc.sum / acc.count as f64))
        .collect()
}

pub fn monthly_rows(records: &[TransactionRecord]) -> Vec<MonthlyRow> {
    accumulate(records)
        .into_iter()
        .map(|(key, acc)| MonthlyRow {
            year_month: YearMonth::from_key(key)
                .map(|ym| ym.to_string())
                .unwrap_or_else(|_| key.to_string()),
            transactions: acc.count,
            avg_unit_price: format_number(acc.sum / acc.count as f64, 2),
        })
        .collect()
}

pub fn generate_summary(records: &[TransactionRecord], monthly: &BTreeMap<u32, f64>) -> SummaryStats {
    let dated: Vec<f64> = records
        .iter()
        .filter(|r| r.trade_date.is_some())
        .map(|r| r.price_unit as f64)
        .collect();
    SummaryStats {
        total_records: records.len(),
        dated_records: dated.len(),
        months: monthly.len(),
        first_month: monthly.keys().next().copied(),
        last_month: monthly.keys().next_back().copied(),
        avg_unit_price: average(&dated),
    }
}
