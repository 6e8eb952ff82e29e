// SQLite-backed storage sink for normalized records.
//
// Each operation opens its own connection and drops it before returning,
// whether the operation succeeded or not. Writes run inside one transaction:
// a failure part way through rolls the whole batch back.
use crate::error::{LvrError, Result};
use crate::query::{Predicate, SqlParam};
use crate::types::{CivilDate, TradeSign, TransactionRecord};
use rusqlite::types::ToSqlOutput;
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const RECORD_COLUMNS: &[&str] = &[
    "city_code",
    "city_name",
    "town_code",
    "town_name",
    "trade_sign",
    "address",
    "trade_date",
    "price_total",
    "price_unit",
    "total_area",
    "code",
    "age",
];

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::Text(s) => ToSqlOutput::from(s.as_str()),
            SqlParam::Integer(v) => ToSqlOutput::from(*v),
            SqlParam::Real(v) => ToSqlOutput::from(*v),
            SqlParam::Date(d) => ToSqlOutput::from(d.compact()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    table: String,
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Store {
    /// Open (creating if needed) the database at `path` and make sure the
    /// record table exists.
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        if !is_identifier(table) {
            return Err(LvrError::Config(format!("'{table}' is not a valid table name")));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self {
            path: path.to_path_buf(),
            table: table.to_string(),
        };
        let conn = store.connect()?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {t} (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                city_code   TEXT    NOT NULL,
                city_name   TEXT    NOT NULL,
                town_code   TEXT    NOT NULL,
                town_name   TEXT    NOT NULL,
                trade_sign  INTEGER NOT NULL,
                address     TEXT    NOT NULL,
                trade_date  INTEGER,
                price_total INTEGER NOT NULL,
                price_unit  INTEGER NOT NULL,
                total_area  REAL    NOT NULL,
                code        TEXT    NOT NULL,
                age         INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{t}_city_date ON {t} (city_code, trade_date);
            CREATE INDEX IF NOT EXISTS idx_{t}_code ON {t} (code, trade_sign);
            "#,
            t = store.table
        ))?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Full statement for `predicate`, oldest trade first.
    pub fn select_sql(&self, predicate: &Predicate) -> String {
        let mut sql = format!("SELECT {} FROM {}", RECORD_COLUMNS.join(", "), self.table);
        if !predicate.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.clause);
        }
        sql.push_str(" ORDER BY trade_date, id");
        sql
    }

    /// Insert all records in one transaction; nothing is kept on failure.
    pub fn insert_records(&self, records: &[TransactionRecord]) -> Result<usize> {
        self.try_insert(records).map_err(|e| {
            warn!(table = %self.table, error = %e, "insert rolled back");
            e
        })
    }

    fn try_insert(&self, records: &[TransactionRecord]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let placeholders = vec!["?"; RECORD_COLUMNS.len()].join(", ");
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                RECORD_COLUMNS.join(", "),
                placeholders
            ))?;
            for r in records {
                stmt.execute(params![
                    r.city_code,
                    r.city_name,
                    r.town_code,
                    r.town_name,
                    r.trade_sign.code() as i64,
                    r.address,
                    r.trade_date.map(CivilDate::compact),
                    r.price_total,
                    r.price_unit,
                    r.total_area,
                    r.code,
                    r.age,
                ])?;
            }
        }
        tx.commit()?;
        info!(table = %self.table, rows = records.len(), "records stored");
        Ok(records.len())
    }

    /// Records matching `predicate`. A failure is logged and returned so the
    /// caller can retry or carry on with an empty result.
    pub fn query(&self, predicate: &Predicate) -> Result<Vec<TransactionRecord>> {
        self.try_query(predicate).map_err(|e| {
            warn!(table = %self.table, error = %e, "query failed");
            e
        })
    }

    fn try_query(&self, predicate: &Predicate) -> Result<Vec<TransactionRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&self.select_sql(predicate))?;
        let rows = stmt
            .query_map(params_from_iter(predicate.params.iter()), record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
            row.get(0)
        })?;
        Ok(n as usize)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
    let sign: i64 = row.get("trade_sign")?;
    let trade_sign = u8::try_from(sign)
        .ok()
        .and_then(TradeSign::from_code)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, sign))?;
    let trade_date: Option<i64> = row.get("trade_date")?;
    Ok(TransactionRecord {
        city_code: row.get("city_code")?,
        city_name: row.get("city_name")?,
        town_code: row.get("town_code")?,
        town_name: row.get("town_name")?,
        trade_sign,
        address: row.get("address")?,
        trade_date: trade_date.and_then(CivilDate::from_compact),
        price_total: row.get("price_total")?,
        price_unit: row.get("price_unit")?,
        total_area: row.get("total_area")?,
        code: row.get("code")?,
        age: row.get("age")?,
    })
}
