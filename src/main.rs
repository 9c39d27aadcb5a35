use anyhow::{Context, Result};
use litepeek::pager::Pager;
use litepeek::QueryOutput;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let db_path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("usage: litepeek <db-path> <command>");
            std::process::exit(1);
        }
    };
    let command = match args.next() {
        Some(c) => c,
        None => {
            eprintln!("usage: litepeek <db-path> <command>");
            std::process::exit(1);
        }
    };

    let pager = Pager::open(&db_path).with_context(|| format!("opening {}", db_path))?;

    match litepeek::run(&pager, &command) {
        Ok(output) => {
            print_output(output);
            Ok(())
        }
        Err(litepeek::executor::Error::Parse(_)) => {
            println!("Unknown command {}", command);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, command, "query failed");
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_output(output: QueryOutput) {
    match output {
        QueryOutput::DbInfo { page_size, table_count } => {
            println!("database page size: {}", page_size);
            println!("number of tables: {}", table_count);
        }
        QueryOutput::Tables(names) => {
            println!("{}", names.join(" "));
        }
        QueryOutput::Count(n) => {
            println!("{}", n);
        }
        QueryOutput::Rows(rows) => {
            for row in rows {
                let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                println!("{}", cells.join("|"));
            }
        }
    }
}
