use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use rusty_sieve::state::{OutputOptions, Session};
use rusty_sieve::{Condition, FilterInput, Format, SortDirection, SortOrder};

/// Filter, sort and re-export a JSON or CSV table.
#[derive(Debug, Parser)]
#[command(name = "rusty-sieve", version, about)]
struct Cli {
    /// Input file (.json or .csv).
    input: PathBuf,

    /// Filter as COLUMN:CONDITION:VALUE, e.g. `age:more-than:18`. Repeatable;
    /// all filters must match.
    #[arg(short, long = "filter", value_name = "COLUMN:CONDITION:VALUE", value_parser = parse_filter)]
    filters: Vec<FilterArg>,

    /// Sort the result by this column.
    #[arg(short, long, value_name = "COLUMN")]
    sort: Option<String>,

    /// Sort in descending order.
    #[arg(short, long, requires = "sort")]
    descending: bool,

    /// Only keep these columns, comma separated.
    #[arg(short, long, value_delimiter = ',', value_name = "COLUMNS")]
    columns: Option<Vec<String>>,

    /// Output file (.json or .csv). Without it the result goes to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format used when writing to stdout.
    #[arg(long, value_enum, default_value_t = StdoutFormat::Json, conflicts_with = "output")]
    format: StdoutFormat,

    /// Print every column with its type, range and filter instead of the rows.
    #[arg(long)]
    describe: bool,

    /// With --describe, print the description as JSON.
    #[arg(long, requires = "describe")]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StdoutFormat {
    Json,
    Csv,
}

impl From<StdoutFormat> for Format {
    fn from(f: StdoutFormat) -> Self {
        match f {
            StdoutFormat::Json => Format::Json,
            StdoutFormat::Csv => Format::Csv,
        }
    }
}

#[derive(Debug, Clone)]
struct FilterArg {
    column: String,
    condition: Condition,
    value: String,
}

impl fmt::Display for FilterArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.column, self.condition, self.value)
    }
}

/// `COLUMN:CONDITION[:VALUE]`; the value may itself contain colons.
fn parse_filter(s: &str) -> Result<FilterArg, String> {
    let mut parts = s.splitn(3, ':');
    let column = parts.next().unwrap_or_default();
    let condition = parts
        .next()
        .ok_or_else(|| format!("expected COLUMN:CONDITION:VALUE, got {s:?}"))?;
    if column.is_empty() {
        return Err(format!("missing column name in {s:?}"));
    }

    Ok(FilterArg {
        column: column.to_string(),
        condition: condition.parse().map_err(|e| format!("{e}"))?,
        value: parts.next().unwrap_or_default().to_string(),
    })
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut session = Session::new();
    session
        .load_file(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))?;

    for filter in &cli.filters {
        let visible = session
            .update_filter(
                &filter.column,
                filter.condition,
                FilterInput::Text(filter.value.clone()),
            )
            .with_context(|| format!("applying filter `{filter}`"))?;
        log::info!("filter `{filter}` leaves {visible} rows");
    }

    if cli.describe {
        return describe(&session, cli.json);
    }

    let options = OutputOptions {
        sort: cli.sort.as_ref().map(|column| {
            let direction = if cli.descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            SortOrder::new(column.as_str(), direction)
        }),
        columns: cli.columns.clone(),
    };

    match &cli.output {
        Some(path) => {
            let written = session
                .save(path, &options)
                .with_context(|| format!("exporting to {}", path.display()))?;
            eprintln!(
                "Results: {written} of {} rows written to {}",
                session.total_count(),
                path.display()
            );
        }
        None => {
            let bytes = session
                .export(cli.format.into(), &options)
                .context("exporting to stdout")?;
            let mut out = std::io::stdout().lock();
            out.write_all(&bytes)?;
            if cli.format == StdoutFormat::Json {
                writeln!(out)?;
            }
            eprintln!(
                "Results: {} of {} rows",
                session.visible_count(),
                session.total_count()
            );
        }
    }
    Ok(())
}

/// The column listing a filter UI would be built from.
fn describe(session: &Session, as_json: bool) -> Result<()> {
    let filters = session.filters().context("no dataset loaded")?;
    let mut out = std::io::stdout().lock();

    if as_json {
        serde_json::to_writer_pretty(&mut out, filters.specs())?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{:<24} {:<7} {:<24} filter", "column", "type", "range")?;
    for spec in filters.specs() {
        let range = spec
            .range
            .map(|r| format!("{} .. {}", r.min, r.max))
            .unwrap_or_else(|| "-".to_string());
        let filter = if spec.is_active() {
            format!("{} {:?}", spec.condition, spec.value.to_string())
        } else {
            "any".to_string()
        };
        writeln!(
            out,
            "{:<24} {:<7} {:<24} {}",
            spec.column,
            spec.column_type.to_string(),
            range,
            filter
        )?;
    }
    writeln!(
        out,
        "Results: {} of {} rows",
        session.visible_count(),
        session.total_count()
    )?;
    Ok(())
}
