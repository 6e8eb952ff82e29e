// Command-line entry point.
//
// - `ingest` reads extract directories into the SQLite store.
// - `query` selects stored records and prints the monthly averages.
// - `predict` fits a trend over the selected months and projects a price.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lvr_trend::config::Config;
use lvr_trend::predict::{self, PredictionInput};
use lvr_trend::query::{self, SearchForm};
use lvr_trend::reference::{self, AgeBracket, AreaUnit, PriceScale};
use lvr_trend::store::Store;
use lvr_trend::types::{TradeSign, TransactionRecord, YearMonth};
use lvr_trend::{loader, logging, output, reports, util};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lvr_trend")]
#[command(about = "Actual-price-registration ingestion, search and unit price projection")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./lvr.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest extract directories into the store
    Ingest {
        /// Directories to ingest; each one's subdirectories are separate batches.
        /// Defaults to the configured data root.
        dirs: Vec<PathBuf>,
        /// Also export the ingested records as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Select stored records and show their monthly average unit price
    Query {
        #[command(flatten)]
        filters: FilterArgs,
        /// Export the monthly averages as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Project the unit price and total price for a target month
    Predict {
        #[command(flatten)]
        filters: FilterArgs,
        /// Target civil year, e.g. 114
        #[arg(long)]
        year: i32,
        /// Target month, 1-12
        #[arg(long)]
        month: u32,
        /// Size of the property to price
        #[arg(long)]
        area: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AreaUnitArg {
    Ping,
    Sqm,
}

impl From<AreaUnitArg> for AreaUnit {
    fn from(arg: AreaUnitArg) -> Self {
        match arg {
            AreaUnitArg::Ping => AreaUnit::Ping,
            AreaUnitArg::Sqm => AreaUnit::SquareMeter,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PriceScaleArg {
    /// Prices in units of 10,000
    TenThousand,
    One,
}

impl From<PriceScaleArg> for PriceScale {
    fn from(arg: PriceScaleArg) -> Self {
        match arg {
            PriceScaleArg::TenThousand => PriceScale::TenThousand,
            PriceScaleArg::One => PriceScale::One,
        }
    }
}

#[derive(Args)]
struct FilterArgs {
    /// City code, e.g. A
    #[arg(long)]
    city: Option<String>,
    /// Town code, e.g. A02
    #[arg(long)]
    town: Option<String>,
    /// Trade sign code 1-6; repeat for several
    #[arg(long = "trade-sign", value_parser = clap::value_parser!(u8).range(1..=6))]
    trade_signs: Vec<u8>,
    /// Address substring
    #[arg(long)]
    address: Option<String>,
    /// First month, YYYMM
    #[arg(long)]
    from: Option<String>,
    /// Last month, YYYMM
    #[arg(long)]
    to: Option<String>,
    #[arg(long)]
    price_min: Option<f64>,
    #[arg(long)]
    price_max: Option<f64>,
    #[arg(long, value_enum, default_value = "ten-thousand")]
    price_scale: PriceScaleArg,
    #[arg(long)]
    area_min: Option<f64>,
    #[arg(long)]
    area_max: Option<f64>,
    /// Unit of --area-min/--area-max and of --area
    #[arg(long, value_enum, default_value = "ping")]
    area_unit: AreaUnitArg,
    /// Age bracket code 1-6
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
    age: Option<u8>,
}

impl FilterArgs {
    fn to_form(&self) -> Result<SearchForm> {
        let month = |s: &Option<String>| -> Result<Option<YearMonth>> {
            s.as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| YearMonth::parse_compact(v.trim()))
                .transpose()
                .with_context(|| format!("bad month {:?}", s))
        };
        Ok(SearchForm {
            city: self.city.clone().unwrap_or_default(),
            town: self.town.clone().unwrap_or_default(),
            trade_signs: self
                .trade_signs
                .iter()
                .filter_map(|c| TradeSign::from_code(*c))
                .collect(),
            address: self.address.clone().unwrap_or_default(),
            start: month(&self.from)?,
            end: month(&self.to)?,
            price_scale: self.price_scale.into(),
            min_price: self.price_min,
            max_price: self.price_max,
            area_unit: self.area_unit.into(),
            min_area: self.area_min,
            max_area: self.area_max,
            age: self.age.and_then(AgeBracket::from_code),
        })
    }

    fn describe(&self) -> String {
        let city = self.city.as_deref().unwrap_or("");
        let mut parts = Vec::new();
        if !city.is_empty() {
            parts.push(reference::city_name(city).unwrap_or(city).to_string());
        }
        if let Some(town) = self.town.as_deref().filter(|t| !t.is_empty()) {
            let title = reference::towns(city)
                .iter()
                .find(|t| t.code == town)
                .map(|t| t.title)
                .unwrap_or(town);
            parts.push(title.to_string());
        }
        if let Some(bracket) = self.age.and_then(AgeBracket::from_code) {
            parts.push(bracket.label().to_string());
        }
        if parts.is_empty() {
            "all records".to_string()
        } else {
            parts.join(" ")
        }
    }
}

fn open_store(config: &Config) -> Result<Store> {
    Store::open(&config.storage.database, &config.storage.table).with_context(|| {
        format!(
            "opening store {} ({})",
            config.storage.database.display(),
            config.storage.table
        )
    })
}

/// Records matching the filters. A store failure has already been logged and
/// is treated as an empty selection.
fn select(config: &Config, filters: &FilterArgs) -> Result<Vec<TransactionRecord>> {
    let conditions = filters.to_form()?.to_conditions();
    let predicate = query::build(&conditions)?;
    let store = open_store(config)?;
    info!(sql = %store.select_sql(&predicate), params = predicate.params.len(), "selecting");
    Ok(store.query(&predicate).unwrap_or_default())
}

fn handle_ingest(config: &Config, dirs: &[PathBuf], json: Option<&Path>) -> Result<()> {
    let roots: Vec<PathBuf> = if dirs.is_empty() {
        vec![config.ingest.data_root.clone()]
    } else {
        dirs.to_vec()
    };

    let mut all = Vec::new();
    let mut report = loader::LoadReport::default();
    for root in &roots {
        match loader::ingest_root(root) {
            Ok((records, root_report)) => {
                all.extend(records);
                report.merge(&root_report);
            }
            Err(e) => warn!(root = %root.display(), error = %e, "data root skipped"),
        }
    }

    println!(
        "Processing extracts... ({} directories, {} files read, {} rows)",
        util::format_int(report.directories),
        util::format_int(report.files_read),
        util::format_int(report.total_rows)
    );
    println!(
        "Note: {} rows skipped due to parse/validation errors, {} files skipped.",
        util::format_int(report.parse_errors),
        util::format_int(report.files_skipped)
    );
    if report.ages_resolved > 0 || report.towns_backfilled > 0 {
        println!(
            "Info: {} building ages resolved, {} town codes backfilled.",
            util::format_int(report.ages_resolved),
            util::format_int(report.towns_backfilled)
        );
    }

    let store = open_store(config)?;
    let stored = store
        .insert_records(&all)
        .context("storing ingested records")?;
    println!(
        "Stored {} records in {}.\n",
        util::format_int(stored),
        store.table()
    );

    if let Some(path) = json {
        output::write_json(path, &all).with_context(|| format!("writing {}", path.display()))?;
        println!("(Records exported to {})\n", path.display());
    }
    Ok(())
}

fn handle_query(config: &Config, filters: &FilterArgs, csv: Option<&Path>) -> Result<()> {
    let records = select(config, filters)?;
    let monthly = reports::monthly_average(&records);
    let rows = reports::monthly_rows(&records);
    let summary = reports::generate_summary(&records, &monthly);

    println!("Monthly Average Unit Price ({})", filters.describe());
    println!(
        "({} records, {} dated, {} months)\n",
        util::format_int(summary.total_records),
        util::format_int(summary.dated_records),
        util::format_int(summary.months)
    );
    output::preview_table_rows(&rows, 12);

    let path = csv
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output.dir.join("monthly_average.csv"));
    output::write_csv(&path, &rows).with_context(|| format!("writing {}", path.display()))?;
    println!("(Full table exported to {})\n", path.display());
    Ok(())
}

fn handle_predict(
    config: &Config,
    filters: &FilterArgs,
    year: i32,
    month: u32,
    area: f64,
) -> Result<()> {
    let target = YearMonth::new(year, month)?;
    let records = select(config, filters)?;
    let monthly = reports::monthly_average(&records);
    let input = PredictionInput {
        target,
        area,
        area_unit: filters.area_unit.into(),
    };
    let estimate = predict::estimate(&monthly, &input)
        .with_context(|| format!("projecting {} for {}", target, filters.describe()))?;

    println!("Projected Price ({}, {})\n", filters.describe(), target);
    output::preview_table_rows(std::slice::from_ref(&estimate), 1);
    println!(
        "Estimated unit price {} (10k/ping), total {} (10k) for {} ping.\n",
        util::format_number(estimate.unit_price, 2),
        util::format_number(estimate.total_price, 2),
        util::format_number(input.area_unit.to_ping(area), 2)
    );

    let path = config.output.dir.join("estimate.json");
    output::write_json(&path, &estimate).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let _guard = logging::init_logging(&config.logging.filter, config.logging.log_dir.as_deref());

    match &cli.command {
        Commands::Ingest { dirs, json } => handle_ingest(&config, dirs, json.as_deref()),
        Commands::Query { filters, csv } => handle_query(&config, filters, csv.as_deref()),
        Commands::Predict {
            filters,
            year,
            month,
            area,
        } => handle_predict(&config, filters, *year, *month, *area),
    }
}
