// Row normalization: one raw CSV row of any extract kind in, one canonical
// `TransactionRecord` out.
//
// Main, presale and rental extracts have labelled columns and are read
// through serde. Land, parking and building detail files are read by column
// position, which is stable across regions for the first few columns.
use crate::age::AgeTable;
use crate::error::{LvrError, Result};
use crate::reference;
use crate::types::{CivilDate, RawMainRow, RawRentalRow, TradeSign, TransactionRecord};
use crate::util::{is_blank, parse_f64_safe, parse_i64_safe};
use csv::StringRecord;
use tracing::warn;

/// Kind of extract, decided by the file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// `*_a.csv`: resales.
    Main,
    /// `*_b.csv`: presales, same layout as `Main`.
    Presale,
    /// `*_c.csv`: rentals.
    Rental,
    /// `*_land.csv`
    Land,
    /// `*_park.csv`
    Park,
    /// `*_build.csv`
    Build,
}

impl RowKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.to_ascii_lowercase();
        let stem = stem.strip_suffix(".csv")?;
        if stem.ends_with("_build") {
            Some(Self::Build)
        } else if stem.ends_with("_land") {
            Some(Self::Land)
        } else if stem.ends_with("_park") {
            Some(Self::Park)
        } else if stem.ends_with("_a") {
            Some(Self::Main)
        } else if stem.ends_with("_b") {
            Some(Self::Presale)
        } else if stem.ends_with("_c") {
            Some(Self::Rental)
        } else {
            None
        }
    }

    /// Detail files hang off a main file named like them minus the suffix.
    pub fn is_detail(self) -> bool {
        matches!(self, Self::Land | Self::Park | Self::Build)
    }

    pub fn needs_age(self) -> bool {
        matches!(self, Self::Main | Self::Presale)
    }

    pub fn default_trade_sign(self) -> TradeSign {
        match self {
            Self::Main | Self::Presale => TradeSign::Property,
            Self::Rental => TradeSign::Rental,
            Self::Land => TradeSign::Land,
            Self::Park => TradeSign::Parking,
            Self::Build => TradeSign::Building,
        }
    }
}

/// What the file name tells us about every row in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMeta {
    pub file_name: String,
    pub city_code: String,
    pub city_name: String,
    pub kind: RowKind,
}

impl FileMeta {
    /// `a_lvr_land_a.csv` is Taipei (`A`), main extract.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let kind = RowKind::from_file_name(file_name)?;
        let city_code = file_name.chars().next()?.to_ascii_uppercase().to_string();
        let city_name = match reference::city_name(&city_code) {
            Some(name) => name.to_string(),
            None => {
                warn!(file = file_name, city_code = %city_code, "file prefix is not a known city code");
                String::new()
            }
        };
        Some(Self {
            file_name: file_name.to_string(),
            city_code,
            city_name,
            kind,
        })
    }

    /// Name of the main file a detail file belongs to: `x_a_land.csv` -> `x_a.csv`.
    pub fn main_file_name(&self) -> String {
        paired_main_name(&self.file_name)
    }
}

pub fn paired_main_name(file_name: &str) -> String {
    let lower = file_name.to_ascii_lowercase();
    for suffix in ["_build.csv", "_land.csv", "_park.csv"] {
        if lower.ends_with(suffix) {
            return format!("{}.csv", &file_name[..file_name.len() - suffix.len()]);
        }
    }
    file_name.to_string()
}

/// Tagged union of the raw row shapes.
#[derive(Debug)]
pub enum RawRow {
    Main(RawMainRow),
    Rental(RawRentalRow),
    Land {
        code: String,
        address: String,
        area: String,
    },
    Park {
        code: String,
        category: String,
        price_total: String,
        area: String,
    },
    Build {
        code: String,
        age: String,
        area: String,
    },
}

impl RawRow {
    pub fn read(kind: RowKind, headers: &StringRecord, record: &StringRecord) -> csv::Result<Self> {
        let at = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        Ok(match kind {
            RowKind::Main | RowKind::Presale => Self::Main(record.deserialize(Some(headers))?),
            RowKind::Rental => Self::Rental(record.deserialize(Some(headers))?),
            RowKind::Land => Self::Land {
                code: at(0),
                address: at(1),
                area: at(2),
            },
            RowKind::Park => Self::Park {
                code: at(0),
                category: at(1),
                price_total: at(2),
                area: at(3),
            },
            RowKind::Build => Self::Build {
                code: at(0),
                age: at(1),
                area: at(2),
            },
        })
    }

    /// Fewest cells a positional row needs.
    fn min_cells(kind: RowKind) -> usize {
        match kind {
            RowKind::Park => 4,
            RowKind::Land | RowKind::Build => 3,
            _ => 1,
        }
    }
}

struct RowCtx<'a> {
    meta: &'a FileMeta,
    line: u64,
}

impl RowCtx<'_> {
    fn malformed(&self, reason: impl Into<String>) -> LvrError {
        LvrError::MalformedRow {
            file: self.meta.file_name.clone(),
            line: self.line,
            reason: reason.into(),
        }
    }

    fn amount(&self, field: &'static str, value: Option<&str>) -> i64 {
        if is_blank(value) {
            return 0;
        }
        parse_i64_safe(value).unwrap_or_else(|| {
            warn!(file = %self.meta.file_name, line = self.line, field, value = value.unwrap_or(""), "malformed amount defaulted to 0");
            0
        })
    }

    fn area(&self, field: &'static str, value: Option<&str>) -> f64 {
        if is_blank(value) {
            return 0.0;
        }
        parse_f64_safe(value).unwrap_or_else(|| {
            warn!(file = %self.meta.file_name, line = self.line, field, value = value.unwrap_or(""), "malformed area defaulted to 0");
            0.0
        })
    }

    fn date(&self, value: Option<&str>) -> Result<CivilDate> {
        let raw = value.unwrap_or("").trim();
        CivilDate::parse(raw).ok_or_else(|| self.malformed(format!("bad trade date '{raw}'")))
    }

    fn record(&self, trade_sign: TradeSign) -> TransactionRecord {
        TransactionRecord {
            city_code: self.meta.city_code.clone(),
            city_name: self.meta.city_name.clone(),
            town_code: String::new(),
            town_name: String::new(),
            trade_sign,
            address: String::new(),
            trade_date: None,
            price_total: 0,
            price_unit: 0,
            total_area: 0.0,
            code: String::new(),
            age: 0,
        }
    }

    fn locate_town(&self, rec: &mut TransactionRecord) {
        if let Some(town) = reference::town_in_address(&rec.city_code, &rec.address) {
            rec.town_code = town.code.to_string();
        }
    }
}

/// Normalize one row. Bad numbers fall back to zero; a row that cannot
/// yield a meaningful record (no trade date on a dated kind, too few
/// positional cells) is an error the caller logs and skips.
pub fn normalize_row(
    meta: &FileMeta,
    headers: &StringRecord,
    record: &StringRecord,
    line: u64,
    ages: Option<&AgeTable>,
) -> Result<TransactionRecord> {
    let ctx = RowCtx { meta, line };
    if record.len() < RawRow::min_cells(meta.kind) {
        return Err(ctx.malformed(format!("expected at least {} cells, got {}", RawRow::min_cells(meta.kind), record.len())));
    }
    let raw = RawRow::read(meta.kind, headers, record).map_err(|e| ctx.malformed(e.to_string()))?;
    normalize(&ctx, raw, ages)
}

fn normalize(ctx: &RowCtx<'_>, raw: RawRow, ages: Option<&AgeTable>) -> Result<TransactionRecord> {
    match raw {
        RawRow::Main(row) => {
            let trade_type = row.trade_type.as_deref().unwrap_or("").trim();
            let trade_sign = TradeSign::classify(trade_type).unwrap_or_else(|e| {
                warn!(file = %ctx.meta.file_name, line = ctx.line, error = %e, "defaulting trade sign to property");
                ctx.meta.kind.default_trade_sign()
            });
            let mut rec = ctx.record(trade_sign);
            rec.trade_date = Some(ctx.date(row.trade_date.as_deref())?);
            rec.town_name = row.town_name.unwrap_or_default().trim().to_string();
            rec.address = row.address.unwrap_or_default().trim().to_string();
            rec.price_total = ctx.amount("總價元", row.price_total.as_deref());
            rec.price_unit = ctx.amount("單價元平方公尺", row.price_unit.as_deref());
            rec.total_area = ctx.area("建物移轉總面積平方公尺", row.total_area.as_deref());
            rec.code = row.code.unwrap_or_default().trim().to_string();
            rec.age = ages.map_or(0, |t| t.resolve(&rec.code));
            ctx.locate_town(&mut rec);
            Ok(rec)
        }
        RawRow::Rental(row) => {
            let mut rec = ctx.record(TradeSign::Rental);
            rec.trade_date = Some(ctx.date(row.trade_date.as_deref())?);
            rec.town_name = row.town_name.unwrap_or_default().trim().to_string();
            rec.address = row.address.unwrap_or_default().trim().to_string();
            rec.price_total = ctx.amount("總額元", row.price_total.as_deref());
            rec.price_unit = ctx.amount("單價元平方公尺", row.price_unit.as_deref());
            rec.total_area = ctx.area("建物總面積平方公尺", row.total_area.as_deref());
            rec.code = row.code.unwrap_or_default().trim().to_string();
            ctx.locate_town(&mut rec);
            Ok(rec)
        }
        RawRow::Land { code, address, area } => {
            let mut rec = ctx.record(TradeSign::Land);
            rec.total_area = ctx.area("土地移轉面積", Some(&area));
            rec.code = code;
            rec.address = address;
            if let Some(town) = reference::town_in_address(&rec.city_code, &rec.address) {
                rec.town_code = town.code.to_string();
                rec.town_name = town.title.to_string();
            }
            Ok(rec)
        }
        RawRow::Park {
            code,
            category: _,
            price_total,
            area,
        } => {
            let mut rec = ctx.record(TradeSign::Parking);
            rec.price_total = ctx.amount("車位價格", Some(&price_total));
            rec.total_area = ctx.area("車位面積", Some(&area));
            rec.code = code;
            Ok(rec)
        }
        RawRow::Build { code, age, area } => {
            let mut rec = ctx.record(TradeSign::Building);
            rec.total_area = ctx.area("建物移轉面積", Some(&area));
            rec.age = match age.parse::<i64>().ok().and_then(|v| u32::try_from(v).ok()) {
                Some(v) => v,
                None => {
                    warn!(file = %ctx.meta.file_name, line = ctx.line, age = %age, "unusable building age defaulted to 0");
                    0
                }
            };
            rec.code = code;
            Ok(rec)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_HEADER: &[&str] = &[
        "鄉鎮市區",
        "交易標的",
        "土地位置建物門牌",
        "交易年月日",
        "建物移轉總面積平方公尺",
        "總價元",
        "單價元平方公尺",
        "編號",
    ];

    fn meta(name: &str) -> FileMeta {
        FileMeta::from_file_name(name).unwrap()
    }

    fn row(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn file_names_classify_by_suffix() {
        assert_eq!(RowKind::from_file_name("a_lvr_land_a.csv"), Some(RowKind::Main));
        assert_eq!(RowKind::from_file_name("a_lvr_land_b.csv"), Some(RowKind::Presale));
        assert_eq!(RowKind::from_file_name("a_lvr_land_c.csv"), Some(RowKind::Rental));
        assert_eq!(RowKind::from_file_name("a_lvr_land_a_build.csv"), Some(RowKind::Build));
        assert_eq!(RowKind::from_file_name("a_lvr_land_a_land.csv"), Some(RowKind::Land));
        assert_eq!(RowKind::from_file_name("A_LVR_LAND_A_PARK.CSV"), Some(RowKind::Park));
        assert_eq!(RowKind::from_file_name("manifest.csv"), None);
        assert_eq!(RowKind::from_file_name("a_lvr_land_a.txt"), None);
        assert_eq!(paired_main_name("a_lvr_land_a_build.csv"), "a_lvr_land_a.csv");
        assert_eq!(paired_main_name("a_lvr_land_a.csv"), "a_lvr_land_a.csv");
    }

    #[test]
    fn metadata_comes_from_the_prefix_letter() {
        let m = meta("a_lvr_land_a.csv");
        assert_eq!(m.city_code, "A");
        assert_eq!(m.city_name, "臺北市");
        assert_eq!(m.kind, RowKind::Main);
        assert_eq!(meta("y_lvr_land_a.csv").city_name, "");
    }

    #[test]
    fn main_row_normalizes_with_age_and_town() {
        let headers = row(MAIN_HEADER);
        let rec = row(&[
            "大安區",
            "房地(土地+建物)+車位",
            "臺北市大安區和平東路二段1號",
            "1130925",
            "120.5",
            "25,000,000",
            "207,469",
            "A0001",
        ]);
        let mut ages = AgeTable::new();
        ages.insert("A0001", 15);
        let out = normalize_row(&meta("a_lvr_land_a.csv"), &headers, &rec, 3, Some(&ages)).unwrap();
        assert_eq!(out.trade_sign, TradeSign::PropertyParking);
        assert_eq!(out.trade_date.map(|d| d.compact()), Some(1130925));
        assert_eq!(out.price_total, 25_000_000);
        assert_eq!(out.price_unit, 207_469);
        assert_eq!(out.total_area, 120.5);
        assert_eq!(out.town_code, "A02");
        assert_eq!(out.town_name, "大安區");
        assert_eq!(out.age, 15);
    }

    #[test]
    fn unparsable_numbers_become_zero() {
        let headers = row(MAIN_HEADER);
        let rec = row(&["大安區", "建物", "", "1120101", "n/a", "?", "", "A0009"]);
        let out = normalize_row(&meta("a_lvr_land_a.csv"), &headers, &rec, 3, None).unwrap();
        assert_eq!(out.trade_sign, TradeSign::Building);
        assert_eq!(out.price_total, 0);
        assert_eq!(out.price_unit, 0);
        assert_eq!(out.total_area, 0.0);
        assert_eq!(out.town_code, "");
        assert_eq!(out.age, 0);
    }

    #[test]
    fn unknown_trade_type_defaults_to_property() {
        let headers = row(MAIN_HEADER);
        let rec = row(&["大安區", "其他", "", "1120101", "1", "1", "1", "A1"]);
        let out = normalize_row(&meta("a_lvr_land_a.csv"), &headers, &rec, 3, None).unwrap();
        assert_eq!(out.trade_sign, TradeSign::Property);
    }

    #[test]
    fn bad_trade_date_drops_the_row() {
        let headers = row(MAIN_HEADER);
        let rec = row(&["大安區", "建物", "", "garbage", "1", "1", "1", "A1"]);
        let err = normalize_row(&meta("a_lvr_land_a.csv"), &headers, &rec, 7, None).unwrap_err();
        assert!(matches!(err, LvrError::MalformedRow { line: 7, .. }));
    }

    #[test]
    fn rental_rows_use_their_own_labels() {
        let headers = row(&[
            "鄉鎮市區",
            "交易標的",
            "土地位置建物門牌",
            "租賃年月日",
            "建物總面積平方公尺",
            "總額元",
            "單價元平方公尺",
            "編號",
        ]);
        let rec = row(&["中山區", "房地(土地+建物)", "臺北市中山區南京東路", "1130801", "33.1", "32,000", "967", "RA1"]);
        let mut ages = AgeTable::new();
        ages.insert("RA1", 30);
        let out = normalize_row(&meta("a_lvr_land_c.csv"), &headers, &rec, 3, Some(&ages)).unwrap();
        assert_eq!(out.trade_sign, TradeSign::Rental);
        assert_eq!(out.age, 0);
        assert_eq!(out.price_total, 32_000);
        assert_eq!(out.town_code, "A10");
    }

    #[test]
    fn positional_detail_rows() {
        let none = StringRecord::new();
        let land = normalize_row(
            &meta("a_lvr_land_a_land.csv"),
            &none,
            &row(&["A0001", "大安區學府段", "1,234.5", "住"]),
            3,
            None,
        )
        .unwrap();
        assert_eq!(land.trade_sign, TradeSign::Land);
        assert_eq!(land.total_area, 1234.5);
        assert_eq!(land.town_code, "A02");
        assert_eq!(land.town_name, "大安區");
        assert!(land.trade_date.is_none());
        assert_eq!(land.price_unit, 0);

        let park = normalize_row(
            &meta("a_lvr_land_a_park.csv"),
            &none,
            &row(&["A0001", "坡道平面", "1,800,000", "x"]),
            3,
            None,
        )
        .unwrap();
        assert_eq!(park.trade_sign, TradeSign::Parking);
        assert_eq!(park.price_total, 1_800_000);
        assert_eq!(park.total_area, 0.0);
        assert_eq!(park.address, "");

        let build = normalize_row(
            &meta("a_lvr_land_a_build.csv"),
            &none,
            &row(&["A0001", "12", "88.2"]),
            3,
            None,
        )
        .unwrap();
        assert_eq!(build.trade_sign, TradeSign::Building);
        assert_eq!(build.age, 12);

        let huge = normalize_row(
            &meta("a_lvr_land_a_build.csv"),
            &none,
            &row(&["A0002", "99999999999", "10"]),
            5,
            None,
        )
        .unwrap();
        assert_eq!(huge.age, 0);

        let short = normalize_row(&meta("a_lvr_land_a_park.csv"), &none, &row(&["A0001"]), 4, None);
        assert!(short.is_err());
    }
}
