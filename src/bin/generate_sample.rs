use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Map, Value as JsonValue};

use rusty_sieve::data::export::save_file;
use rusty_sieve::{Record, Value};

/// Write a deterministic synthetic people table as JSON (rows and columns
/// layouts) and CSV.
#[derive(Debug, Parser)]
#[command(name = "generate_sample", about)]
struct Args {
    /// Directory to write into.
    #[arg(default_value = ".")]
    out_dir: PathBuf,

    /// Number of rows.
    #[arg(short = 'n', long, default_value_t = 200)]
    rows: usize,

    /// PRNG seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// splitmix64 stream; enough for reproducible sample data.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn between(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next() % (hi - lo + 1) as u64) as i64
    }

    fn choose<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next() % items.len() as u64) as usize]
    }
}

const NAMES: [&str; 8] = ["alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi"];
const CITIES: [&str; 6] = ["Oslo", "Linz", "Lisbon", "Bern", "Lyon", "Porto"];

fn generate(rng: &mut Rng, n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let score = (rng.unit() * 1000.0).round() / 10.0;
            [
                ("id", Value::Integer(i as i64)),
                ("name", Value::from(rng.choose(&NAMES))),
                ("age", Value::Integer(rng.between(16, 80))),
                ("city", Value::from(rng.choose(&CITIES))),
                ("score", Value::Float(score)),
            ]
            .into_iter()
            .collect::<Record>()
        })
        .collect()
}

/// The same rows in the `{ "column": [values...] }` layout.
fn columns_layout(rows: &[Record]) -> Result<JsonValue> {
    let mut columns: Map<String, JsonValue> = Map::new();
    for row in rows {
        for (name, value) in row.iter() {
            let cell = serde_json::to_value(value).context("encoding cell")?;
            columns
                .entry(name.to_string())
                .or_insert_with(|| json!([]))
                .as_array_mut()
                .context("column entry is not an array")?
                .push(cell);
        }
    }
    Ok(JsonValue::Object(columns))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = Rng(args.seed);
    let rows = generate(&mut rng, args.rows);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    for name in ["sample_people.json", "sample_people.csv"] {
        let path = args.out_dir.join(name);
        save_file(&path, &rows).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {} rows to {}", rows.len(), path.display());
    }

    let path = args.out_dir.join("sample_people_columns.json");
    let text = serde_json::to_string_pretty(&columns_layout(&rows)?)?;
    std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} rows to {}", rows.len(), path.display());

    Ok(())
}
