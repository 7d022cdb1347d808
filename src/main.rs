use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use pagedb::common::{DatabaseConfig, DEFAULT_DATA_DIR};
use pagedb::execution::{CompareOp, Executor, Expr, Projection, Statement};

/// PageDB demo session
#[derive(Parser, Debug)]
#[command(name = "pagedb", version, about = "Runs a scripted PageDB session")]
struct Args {
    /// Directory holding one subdirectory per database
    #[arg(short, long, default_value = DEFAULT_DATA_DIR, env = "PAGEDB_DATA_DIR")]
    data_dir: PathBuf,

    /// Log filter, e.g. `info` or `pagedb=debug`. Overrides `RUST_LOG`.
    #[arg(short, long, env = "PAGEDB_LOG")]
    log_level: Option<String>,
}

const DEFAULT_LOG_FILTER: &str = "info";

/// Picks the log filter: an explicit flag wins, then `RUST_LOG`, then `info`.
fn log_directive(cli: Option<&str>, rust_log: Option<&str>) -> String {
    cli.or(rust_log)
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER)
        .to_string()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn demo_script() -> Vec<Statement> {
    vec![
        Statement::CreateDatabase {
            name: "demo".into(),
        },
        Statement::UseDatabase {
            name: "demo".into(),
        },
        Statement::CreateTable {
            name: "users".into(),
            columns: strings(&["id", "name", "city"]),
        },
        Statement::ListTables,
        Statement::Insert {
            table: "users".into(),
            columns: strings(&["id", "name", "city"]),
            values: vec![
                strings(&["1", "alice", "Paris"]),
                strings(&["2", "bob", "Oslo, Norway"]),
                strings(&["3", "carol", "Paris"]),
            ],
        },
        Statement::Select {
            table: "users".into(),
            columns: Projection::All,
            where_expr: None,
        },
        Statement::Select {
            table: "users".into(),
            columns: Projection::Columns(strings(&["name"])),
            where_expr: Some(Expr::and(
                Expr::condition("city", CompareOp::Eq, "'Paris'"),
                Expr::condition("id", CompareOp::Gt, "1"),
            )),
        },
        Statement::Drop {
            table: Some("users".into()),
            database: None,
            columns: None,
        },
        Statement::ListTables,
        Statement::ShowDatabases,
    ]
}

fn main() -> Result<()> {
    let args = Args::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_directive(
            args.log_level.as_deref(),
            rust_log.as_deref(),
        )))
        .init();

    println!("PageDB - an embedded page-based store in Rust");
    println!("=============================================\n");

    let config = DatabaseConfig::default().with_data_dir(&args.data_dir);
    let mut executor = Executor::new(config)
        .with_context(|| format!("failed to prepare data directory {:?}", args.data_dir))?;

    for statement in demo_script() {
        println!("> {:?}", statement);
        match executor.execute(&statement) {
            Ok(result) => println!("{result}\n"),
            Err(e) => {
                error!(error = %e, "statement failed");
                println!("Error: {e}\n");
            }
        }
    }

    Ok(())
}
