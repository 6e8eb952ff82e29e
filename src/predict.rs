// Straight-line trend over monthly mean unit prices.
//
// Months are turned into offsets from the earliest month in the series, a
// degree-one least-squares line is fitted in closed form, and the line is
// read off at the target month. The result is not clamped: sparse or noisy
// input can project a negative price.
use crate::error::{LvrError, Result};
use crate::reference::{AreaUnit, CURRENCY_SCALE, PING_IN_SQM};
use crate::types::YearMonth;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Ordinary least squares:
    /// `m = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`, `b = (Σy − mΣx) / n`.
    pub fn fit(points: &[(f64, f64)]) -> Result<Self> {
        if points.len() < 2 {
            return Err(LvrError::InsufficientData(points.len()));
        }
        let n = points.len() as f64;
        let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
        for &(x, y) in points {
            sx += x;
            sy += y;
            sxy += x * y;
            sxx += x * x;
        }
        let denom = n * sxx - sx * sx;
        if denom.abs() <= f64::EPSILON * (n * sxx).max(1.0) {
            return Err(LvrError::DegenerateFit);
        }
        let slope = (n * sxy - sx * sy) / denom;
        let intercept = (sy - slope * sx) / n;
        Ok(Self { slope, intercept })
    }

    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// A fitted line plus the month its offsets count from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendModel {
    pub base: YearMonth,
    pub line: LinearFit,
    pub months: usize,
}

impl TrendModel {
    pub fn fit(monthly: &BTreeMap<u32, f64>) -> Result<Self> {
        if monthly.len() < 2 {
            return Err(LvrError::InsufficientData(monthly.len()));
        }
        let months: Vec<(YearMonth, f64)> = monthly
            .iter()
            .map(|(&key, &price)| YearMonth::from_key(key).map(|ym| (ym, price)))
            .collect::<Result<_>>()?;
        let base = months.iter().map(|(ym, _)| *ym).min().ok_or(LvrError::InsufficientData(0))?;
        let points: Vec<(f64, f64)> = months
            .iter()
            .map(|(ym, price)| (ym.offset_from(base) as f64, *price))
            .collect();
        let line = LinearFit::fit(&points)?;
        debug!(base = %base, slope = line.slope, intercept = line.intercept, "trend fitted");
        Ok(Self {
            base,
            line,
            months: points.len(),
        })
    }

    pub fn offset_of(&self, target: YearMonth) -> i64 {
        target.offset_from(self.base)
    }

    /// Projected mean unit price (currency per square meter) for `target`.
    pub fn predict(&self, target: YearMonth) -> f64 {
        self.line.at(self.offset_of(target) as f64)
    }
}

/// Project the unit price for `target` from a `YYYMM -> mean unit price` series.
pub fn predict(monthly: &BTreeMap<u32, f64>, target: YearMonth) -> Result<f64> {
    Ok(TrendModel::fit(monthly)?.predict(target))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionInput {
    pub target: YearMonth,
    pub area: f64,
    pub area_unit: AreaUnit,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct Estimate {
    #[tabled(rename = "Target")]
    pub target: String,
    #[tabled(rename = "MonthsUsed")]
    pub months_used: usize,
    #[tabled(rename = "UnitPricePerSqm")]
    pub unit_price_per_sqm: f64,
    /// 10,000 currency per ping.
    #[tabled(rename = "UnitPrice(10k/ping)")]
    pub unit_price: f64,
    /// 10,000 currency.
    #[tabled(rename = "TotalPrice(10k)")]
    pub total_price: f64,
}

/// Unit price and total price for a property of the given size.
pub fn estimate(monthly: &BTreeMap<u32, f64>, input: &PredictionInput) -> Result<Estimate> {
    let model = TrendModel::fit(monthly)?;
    let per_sqm = model.predict(input.target);
    let unit_price = per_sqm * PING_IN_SQM / CURRENCY_SCALE;
    let total_price = unit_price * input.area_unit.to_ping(input.area);
    Ok(Estimate {
        target: input.target.to_string(),
        months_used: model.months,
        unit_price_per_sqm: per_sqm,
        unit_price,
        total_price,
    })
}
