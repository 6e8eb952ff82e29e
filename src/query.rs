// Filter conditions -> parametrized WHERE predicate.
//
// Values never reach the predicate text; every one is bound through a `?`
// placeholder, in the order the placeholders appear.
use crate::error::Result;
use crate::reference::{AgeBracket, AreaUnit, PriceScale};
use crate::types::{CivilDate, TradeSign, YearMonth};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Real(f64),
    /// Bound as its compact `YYYMMDD` integer.
    Date(CivilDate),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Date(d) => write!(f, "{d}"),
        }
    }
}

/// What to select. Empty strings, empty lists and `None` impose nothing.
/// A range constrains only when both of its ends are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterConditions {
    pub city_code: Option<String>,
    pub town_code: Option<String>,
    pub trade_sign: Vec<TradeSign>,
    pub address: Option<String>,
    /// Compact `YYYMM` months, both inclusive.
    pub trade_date: (Option<String>, Option<String>),
    /// Currency per square meter.
    pub price_unit: (Option<f64>, Option<f64>),
    /// Square meters.
    pub total_area: (Option<f64>, Option<f64>),
    pub age: Option<AgeBracket>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

impl Predicate {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

#[derive(Default)]
struct ClauseBuilder {
    parts: Vec<String>,
    params: Vec<SqlParam>,
}

impl ClauseBuilder {
    fn equal(&mut self, column: &str, value: Option<&str>) {
        if let Some(v) = non_empty(value) {
            self.parts.push(format!("{column} = ?"));
            self.params.push(SqlParam::Text(v.to_string()));
        }
    }

    fn any_of(&mut self, column: &str, values: Vec<SqlParam>) {
        if values.is_empty() {
            return;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.parts.push(format!("{column} IN ({placeholders})"));
        self.params.extend(values);
    }

    fn contains(&mut self, column: &str, value: Option<&str>) {
        if let Some(v) = non_empty(value) {
            self.parts.push(format!("{column} LIKE ? ESCAPE '\\'"));
            self.params.push(SqlParam::Text(format!("%{}%", escape_like(v))));
        }
    }

    fn between(&mut self, column: &str, low: SqlParam, high: SqlParam) {
        self.parts.push(format!("{column} BETWEEN ? AND ?"));
        self.params.push(low);
        self.params.push(high);
    }

    fn finish(self) -> Predicate {
        Predicate {
            clause: self.parts.join(" AND "),
            params: self.params,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build the predicate for `conditions`.
///
/// Fails only when a trade-date endpoint is not a valid `YYYMM` month.
pub fn build(conditions: &FilterConditions) -> Result<Predicate> {
    let mut b = ClauseBuilder::default();
    b.equal("city_code", conditions.city_code.as_deref());
    b.equal("town_code", conditions.town_code.as_deref());
    b.any_of(
        "trade_sign",
        conditions
            .trade_sign
            .iter()
            .map(|s| SqlParam::Integer(s.code() as i64))
            .collect(),
    );
    b.contains("address", conditions.address.as_deref());

    let (start, end) = &conditions.trade_date;
    if let (Some(start), Some(end)) = (non_empty(start.as_deref()), non_empty(end.as_deref())) {
        let start = YearMonth::parse_compact(start)?;
        let end = YearMonth::parse_compact(end)?;
        b.between(
            "trade_date",
            SqlParam::Date(start.first_day()),
            SqlParam::Date(end.last_day()),
        );
    }
    if let (Some(low), Some(high)) = conditions.price_unit {
        b.between("price_unit", SqlParam::Real(low), SqlParam::Real(high));
    }
    if let (Some(low), Some(high)) = conditions.total_area {
        b.between("total_area", SqlParam::Real(low), SqlParam::Real(high));
    }
    if let Some(bracket) = conditions.age {
        let (low, high) = bracket.bounds();
        b.between("age", SqlParam::Integer(low as i64), SqlParam::Integer(high as i64));
    }
    Ok(b.finish())
}

/// The search form as a user fills it in, before unit conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchForm {
    pub city: String,
    pub town: String,
    pub trade_signs: Vec<TradeSign>,
    pub address: String,
    pub start: Option<YearMonth>,
    pub end: Option<YearMonth>,
    pub price_scale: PriceScale,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub area_unit: AreaUnit,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub age: Option<AgeBracket>,
}

impl SearchForm {
    /// Prices become whole currency per square meter, areas square meters.
    pub fn to_conditions(&self) -> FilterConditions {
        let price = |v: Option<f64>| v.map(|p| self.price_scale.to_currency(p));
        let area = |v: Option<f64>| v.map(|a| self.area_unit.to_sqm(a));
        FilterConditions {
            city_code: Some(self.city.clone()),
            town_code: Some(self.town.clone()),
            trade_sign: self.trade_signs.clone(),
            address: Some(self.address.clone()),
            trade_date: (
                self.start.map(|m| m.key().to_string()),
                self.end.map(|m| m.key().to_string()),
            ),
            price_unit: (price(self.min_price), price(self.max_price)),
            total_area: (area(self.min_area), area(self.max_area)),
            age: self.age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LvrError;

    #[test]
    fn single_equality() {
        let c = FilterConditions {
            city_code: Some("A".into()),
            ..Default::default()
        };
        let p = build(&c).unwrap();
        assert_eq!(p.clause, "city_code = ?");
        assert_eq!(p.params, vec![SqlParam::Text("A".into())]);
    }

    #[test]
    fn nothing_set_means_empty_predicate() {
        let p = build(&FilterConditions::default()).unwrap();
        assert!(p.is_empty());
        assert!(p.params.is_empty());
    }

    #[test]
    fn empty_values_are_omitted() {
        let c = FilterConditions {
            city_code: Some(String::new()),
            town_code: Some("  ".into()),
            address: Some(String::new()),
            trade_date: (Some("11101".into()), Some(String::new())),
            price_unit: (Some(1.0), None),
            total_area: (None, Some(2.0)),
            age: Some(AgeBracket::From5To10),
            ..Default::default()
        };
        let p = build(&c).unwrap();
        assert_eq!(p.clause, "age BETWEEN ? AND ?");
        assert_eq!(p.params, vec![SqlParam::Integer(5), SqlParam::Integer(10)]);
    }

    #[test]
    fn trade_dates_expand_to_whole_months() {
        let c = FilterConditions {
            trade_date: (Some("11101".into()), Some("11303".into())),
            ..Default::default()
        };
        let p = build(&c).unwrap();
        assert_eq!(p.clause, "trade_date BETWEEN ? AND ?");
        let rendered: Vec<String> = p.params.iter().map(|v| v.to_string()).collect();
        assert_eq!(rendered, vec!["111/01/01", "113/03/31"]);
        match (&p.params[0], &p.params[1]) {
            (SqlParam::Date(a), SqlParam::Date(b)) => {
                assert_eq!(a.compact(), 1110101);
                assert_eq!(b.compact(), 1130331);
            }
            other => panic!("unexpected params {other:?}"),
        }
    }

    #[test]
    fn full_condition_set_in_fixed_order() {
        let c = FilterConditions {
            city_code: Some("A".into()),
            town_code: Some("A02".into()),
            trade_sign: vec![TradeSign::Property, TradeSign::Parking],
            address: Some("大安路".into()),
            trade_date: (Some("10901".into()), Some("11310".into())),
            price_unit: (Some(100_000.0), Some(300_000.0)),
            total_area: (Some(20.0), Some(40.0)),
            age: Some(AgeBracket::UpTo5),
        };
        let p = build(&c).unwrap();
        assert_eq!(
            p.clause,
            "city_code = ? AND town_code = ? AND trade_sign IN (?, ?) AND address LIKE ? ESCAPE '\\' \
             AND trade_date BETWEEN ? AND ? AND price_unit BETWEEN ? AND ? \
             AND total_area BETWEEN ? AND ? AND age BETWEEN ? AND ?"
        );
        assert_eq!(p.params.len(), 13);
        assert_eq!(p.params[2], SqlParam::Integer(1));
        assert_eq!(p.params[3], SqlParam::Integer(4));
        assert_eq!(p.params[4], SqlParam::Text("%大安路%".into()));
        assert_eq!(p.params[6].to_string(), "113/10/31");
        assert!(!p.clause.contains("大安路"));
    }

    #[test]
    fn like_wildcards_in_user_text_are_literal() {
        let c = FilterConditions {
            address: Some("50%_off\\".into()),
            ..Default::default()
        };
        let p = build(&c).unwrap();
        assert_eq!(p.params, vec![SqlParam::Text("%50\\%\\_off\\\\%".into())]);
    }

    #[test]
    fn malformed_month_is_rejected() {
        let c = FilterConditions {
            trade_date: (Some("11113".into()), Some("11201".into())),
            ..Default::default()
        };
        assert!(matches!(build(&c), Err(LvrError::InvalidCondition(_))));
    }

    #[test]
    fn search_form_converts_units() {
        let form = SearchForm {
            city: "A".into(),
            trade_signs: vec![TradeSign::Property],
            start: Some(YearMonth::new(111, 1).unwrap()),
            end: Some(YearMonth::new(113, 3).unwrap()),
            price_scale: PriceScale::TenThousand,
            min_price: Some(30.0),
            max_price: Some(60.0),
            area_unit: AreaUnit::Ping,
            min_area: Some(10.0),
            max_area: None,
            age: AgeBracket::from_code(3),
            ..Default::default()
        };
        let c = form.to_conditions();
        assert_eq!(c.trade_date, (Some("11101".into()), Some("11303".into())));
        assert_eq!(c.price_unit, (Some(300_000.0), Some(600_000.0)));
        assert!((c.total_area.0.unwrap() - 33.05785).abs() < 1e-9);
        assert_eq!(c.total_area.1, None);
        let p = build(&c).unwrap();
        assert_eq!(
            p.clause,
            "city_code = ? AND trade_sign IN (?) AND trade_date BETWEEN ? AND ? \
             AND price_unit BETWEEN ? AND ? AND age BETWEEN ? AND ?"
        );
    }
}
