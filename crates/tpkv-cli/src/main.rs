use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tpkv_core::query::{MinCostSupplierRow, PricingSummaryRow, ShippingPriorityRow};
use tpkv_core::{EngineParams, MemoryStore, Query, QueryOutput};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tpkv", version, about = "TPC-H Q1-Q3 over a key/value store", long_about = None)]
struct Cli {
    /// Store directory (holds wal.log)
    #[arg(short, long, env = "TPKV_DATA")]
    data_dir: Option<PathBuf>,

    /// fsync the log when the store is flushed (also TPKV_WAL_SYNC=1)
    #[arg(long)]
    wal_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load region.tbl ... lineitem.tbl, then build the indexes
    Load {
        /// Directory holding the dbgen .tbl files
        #[arg(long, env = "TPKV_TBL_DIR")]
        tbl_dir: Option<PathBuf>,
        /// Skip the index build
        #[arg(long)]
        no_index: bool,
    },
    /// Rebuild the secondary indexes from the loaded records
    Index,
    /// Check record counts and index presence
    Validate,
    /// Run one query, or all three with timings
    Query {
        #[arg(value_enum)]
        which: Which,
        /// Print at most this many rows per query
        #[arg(long)]
        limit: Option<usize>,
        /// Emit rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rewrite the log from the current keyspace
    Compact,
}

#[derive(Clone, Copy, ValueEnum)]
enum Which {
    Q1,
    Q2,
    Q3,
    All,
}

impl Which {
    fn queries(self) -> Vec<Query> {
        match self {
            Which::Q1 => vec![Query::Q1],
            Which::Q2 => vec![Query::Q2],
            Which::Q3 => vec![Query::Q3],
            Which::All => Query::ALL.to_vec(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut params = EngineParams::from_env();
    if let Some(dir) = cli.data_dir {
        params.data_dir = dir;
    }
    if cli.wal_sync {
        params.wal_sync = true;
    }
    let store = MemoryStore::open_with_sync(&params.data_dir, params.wal_sync)?;
    let stats = store.stats()?;
    tracing::info!(
        data_dir = %params.data_dir.display(),
        keys = stats.keys,
        wal_bytes = stats.wal_bytes,
        "store ready"
    );

    match cli.command {
        Commands::Load { tbl_dir, no_index } => {
            let tbl_dir = tbl_dir.unwrap_or(params.tbl_dir);
            let start = Instant::now();
            let report = tpkv_core::load_dir(&store, &tbl_dir)?;
            for (table, rows) in &report.tables {
                println!("{table:<10} {rows:>10}");
            }
            println!("loaded {} rows in {:.2?}", report.total(), start.elapsed());
            if !no_index {
                build_indexes(&store)?;
            }
            store.flush()?;
        }
        Commands::Index => {
            build_indexes(&store)?;
            store.flush()?;
        }
        Commands::Validate => {
            let report = tpkv_core::validate(&store)?;
            for (table, count) in &report.counts {
                println!("{table:<10} {count:>10}");
            }
            if !report.is_ok() {
                for problem in &report.problems {
                    eprintln!("problem: {problem}");
                }
                bail!("validation failed with {} problem(s)", report.problems.len());
            }
            println!("ok");
        }
        Commands::Query { which, limit, json } => {
            let mut timings: Vec<(Query, Duration, usize)> = Vec::new();
            for query in which.queries() {
                let start = Instant::now();
                let mut output = query.run(&store)?;
                let elapsed = start.elapsed();
                timings.push((query, elapsed, output.len()));
                if let Some(n) = limit {
                    output.truncate(n);
                }
                if json {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!("== {} ({}) ==", query.name(), query.title());
                    print_rows(&output);
                }
            }
            if matches!(which, Which::All) {
                println!("{:<4} {:>8} {:>12}", "", "rows", "elapsed");
                for (query, elapsed, rows) in &timings {
                    println!("{:<4} {:>8} {:>12.2?}", query.name(), rows, elapsed);
                }
                let total: Duration = timings.iter().map(|(_, d, _)| *d).sum();
                println!("{:<4} {:>8} {:>12.2?}", "all", "", total);
            }
        }
        Commands::Compact => {
            let before = store.stats()?.wal_bytes;
            store.compact()?;
            let after = store.stats()?.wal_bytes;
            println!("wal {before} -> {after} bytes");
        }
    }
    Ok(())
}

fn build_indexes(store: &MemoryStore) -> Result<()> {
    let start = Instant::now();
    let report = tpkv_core::build_indexes(store)?;
    for (name, members) in &report.written {
        println!("{name:<22} {members:>10}");
    }
    println!("indexes built in {:.2?}", start.elapsed());
    Ok(())
}

fn print_rows(output: &QueryOutput) {
    match output {
        QueryOutput::Q1(rows) => rows.iter().for_each(print_q1),
        QueryOutput::Q2(rows) => rows.iter().for_each(print_q2),
        QueryOutput::Q3(rows) => rows.iter().for_each(print_q3),
    }
    if output.is_empty() {
        println!("(no rows)");
    }
}

fn print_q1(r: &PricingSummaryRow) {
    println!(
        "{} {} qty={:.2} base={:.2} disc={:.2} charge={:.2} avg_qty={:.2} avg_price={:.2} avg_disc={:.4} count={}",
        r.l_returnflag,
        r.l_linestatus,
        r.sum_qty,
        r.sum_base_price,
        r.sum_disc_price,
        r.sum_charge,
        r.avg_qty,
        r.avg_price,
        r.avg_disc,
        r.count_order
    );
}

fn print_q2(r: &MinCostSupplierRow) {
    println!(
        "{:.2} | {} | {} | {} | {} | {} | {} | {}",
        r.s_acctbal, r.s_name, r.n_name, r.p_partkey, r.p_mfgr, r.s_address, r.s_phone, r.s_comment
    );
}

fn print_q3(r: &ShippingPriorityRow) {
    println!(
        "{} | {:.2} | {} | {}",
        r.l_orderkey, r.revenue, r.o_orderdate, r.o_shippriority
    );
}
