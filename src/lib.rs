//! Ingestion, querying and trend projection over actual-price-registration
//! open-data extracts.
pub mod age;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod portal_csv;
pub mod predict;
pub mod query;
pub mod reference;
pub mod reports;
pub mod store;
pub mod types;
pub mod util;

pub use error::{LvrError, Result};
pub use types::{CivilDate, TradeSign, TransactionRecord, YearMonth};
