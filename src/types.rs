use crate::error::{LvrError, Result};
use crate::util::days_in_month;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

/// What changed hands in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TradeSign {
    Property = 1,
    Building = 2,
    Land = 3,
    Parking = 4,
    PropertyParking = 5,
    Rental = 6,
}

impl TradeSign {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Property),
            2 => Some(Self::Building),
            3 => Some(Self::Land),
            4 => Some(Self::Parking),
            5 => Some(Self::PropertyParking),
            6 => Some(Self::Rental),
            _ => None,
        }
    }

    /// Classify the free-text 交易標的 column. First matching rule wins:
    ///
    /// 1. land without building
    /// 2. building without land
    /// 3. parking without property
    /// 4. property with parking
    /// 5. property, or land together with building
    pub fn classify(text: &str) -> Result<Self> {
        let land = text.contains("土地");
        let building = text.contains("建物");
        let parking = text.contains("車位");
        let property = text.contains("房地");

        if land && !building {
            Ok(Self::Land)
        } else if building && !land {
            Ok(Self::Building)
        } else if parking && !property {
            Ok(Self::Parking)
        } else if property && parking {
            Ok(Self::PropertyParking)
        } else if property || (land && building) {
            Ok(Self::Property)
        } else {
            Err(LvrError::UnrecognizedTradeType(text.to_string()))
        }
    }
}

impl Serialize for TradeSign {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for TradeSign {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown trade sign {code}")))
    }
}

/// A year and month on the civil (ROC) calendar, e.g. 111/01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LvrError::InvalidCondition(format!(
                "month {month} is outside 1..=12"
            )));
        }
        if year < 0 {
            return Err(LvrError::InvalidCondition(format!("civil year {year} is negative")));
        }
        Ok(Self { year, month })
    }

    /// Parse the compact `YYYMM` form used by the search form (`"11101"`).
    pub fn parse_compact(s: &str) -> Result<Self> {
        let s = s.trim();
        let key: u32 = s
            .parse()
            .map_err(|_| LvrError::InvalidCondition(format!("'{s}' is not a YYYMM month")))?;
        Self::from_key(key)
    }

    /// Inverse of [`YearMonth::key`]: `11101` is civil year 111, month 1.
    pub fn from_key(key: u32) -> Result<Self> {
        Self::new((key / 100) as i32, key % 100)
    }

    pub fn key(self) -> u32 {
        self.year as u32 * 100 + self.month
    }

    /// Whole months from `base` to `self`; negative when `self` is earlier.
    pub fn offset_from(self, base: YearMonth) -> i64 {
        (self.year as i64 - base.year as i64) * 12 + (self.month as i64 - base.month as i64)
    }

    pub fn first_day(self) -> CivilDate {
        CivilDate {
            year: self.year,
            month: self.month,
            day: 1,
        }
    }

    pub fn last_day(self) -> CivilDate {
        // `new` already restricted month to 1..=12, so the lookup cannot miss.
        let day = days_in_month(self.year, self.month).unwrap_or(28);
        CivilDate {
            year: self.year,
            month: self.month,
            day,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}/{:02}", self.year, self.month)
    }
}

/// A calendar day on the civil calendar, stored compactly as `YYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CivilDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CivilDate {
    pub fn from_compact(value: i64) -> Option<Self> {
        if value <= 0 {
            return None;
        }
        let year = i32::try_from(value / 10_000).ok()?;
        let month = ((value / 100) % 100) as u32;
        let day = (value % 100) as u32;
        let last = days_in_month(year, month)?;
        if day == 0 || day > last {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Accepts `1130925` as well as the slashed `113/09/25`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.contains('/') {
            let mut parts = s.split('/');
            let year: i64 = parts.next()?.parse().ok()?;
            let month: i64 = parts.next()?.parse().ok()?;
            let day: i64 = parts.next()?.parse().ok()?;
            if parts.next().is_some() || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                return None;
            }
            let compact = year.checked_mul(10_000)?.checked_add(month * 100 + day)?;
            return Self::from_compact(compact);
        }
        Self::from_compact(s.parse().ok()?)
    }

    pub fn compact(self) -> i64 {
        self.year as i64 * 10_000 + self.month as i64 * 100 + self.day as i64
    }

    pub fn year_month(self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

impl Serialize for CivilDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.compact())
    }
}

impl<'de> Deserialize<'de> for CivilDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Self::from_compact(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid civil date {value}")))
    }
}

/// Canonical transaction record shared by every file kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub city_code: String,
    pub city_name: String,
    pub town_code: String,
    pub town_name: String,
    pub trade_sign: TradeSign,
    pub address: String,
    /// `None` for land and parking sub-records, which carry no date.
    pub trade_date: Option<CivilDate>,
    pub price_total: i64,
    /// Currency per square meter; 0 when the source has none.
    pub price_unit: i64,
    pub total_area: f64,
    pub code: String,
    pub age: u32,
}

/// Row of the a/b main extracts (sales and presales).
#[derive(Debug, Deserialize)]
pub struct RawMainRow {
    #[serde(rename = "鄉鎮市區")]
    pub town_name: Option<String>,
    #[serde(rename = "交易標的")]
    pub trade_type: Option<String>,
    #[serde(rename = "土地位置建物門牌")]
    pub address: Option<String>,
    #[serde(rename = "交易年月日")]
    pub trade_date: Option<String>,
    #[serde(rename = "建物移轉總面積平方公尺")]
    pub total_area: Option<String>,
    #[serde(rename = "總價元")]
    pub price_total: Option<String>,
    #[serde(rename = "單價元平方公尺")]
    pub price_unit: Option<String>,
    #[serde(rename = "編號")]
    pub code: Option<String>,
}

/// Row of the c extracts (rentals). Same meaning, different labels.
#[derive(Debug, Deserialize)]
pub struct RawRentalRow {
    #[serde(rename = "鄉鎮市區")]
    pub town_name: Option<String>,
    #[serde(rename = "交易標的")]
    pub trade_type: Option<String>,
    #[serde(rename = "土地位置建物門牌")]
    pub address: Option<String>,
    #[serde(rename = "租賃年月日")]
    pub trade_date: Option<String>,
    #[serde(rename = "建物總面積平方公尺")]
    pub total_area: Option<String>,
    #[serde(rename = "總額元")]
    pub price_total: Option<String>,
    #[serde(rename = "單價元平方公尺")]
    pub price_unit: Option<String>,
    #[serde(rename = "編號")]
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyRow {
    #[serde(rename = "YearMonth")]
    #[tabled(rename = "YearMonth")]
    pub year_month: String,
    #[serde(rename = "Transactions")]
    #[tabled(rename = "Transactions")]
    pub transactions: usize,
    #[serde(rename = "AvgUnitPrice")]
    #[tabled(rename = "AvgUnitPrice")]
    pub avg_unit_price: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub dated_records: usize,
    pub months: usize,
    pub first_month: Option<u32>,
    pub last_month: Option<u32>,
    pub avg_unit_price: f64,
}
