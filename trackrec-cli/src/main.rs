mod cli;
mod report;

use std::io::{self, BufRead, Write};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trackrec::{Recommender, RecommenderConfig, ingest};

use cli::Cli;

/// Exit code when every query named an unknown track.
const EXIT_NOT_FOUND: i32 = 2;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = RecommenderConfig::builder()
        .top_n(cli.top_n)
        .stop_words(cli.stop_words)
        .sublinear_tf(cli.sublinear_tf)
        .numeric_format(cli.numeric_format)
        .index_strategy(cli.index_strategy)
        .include_seed(!cli.exclude_seed)
        .build()
        .context("invalid configuration")?;

    let catalog = ingest::load_catalog(&cli.catalog)
        .with_context(|| format!("failed to load catalog from {}", cli.catalog.display()))?;

    let mut builder = Recommender::builder().config(config);
    if let Some(now) = cli.now {
        builder = builder.reference_time(now);
    }
    let recommender = builder.build(&catalog).context("failed to build recommender")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut tally = Tally::default();

    if cli.queries.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line.context("failed to read query from stdin")?;
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            tally.record(answer(&recommender, query, cli.json, &mut out)?);
        }
    } else {
        for query in &cli.queries {
            tally.record(answer(&recommender, query, cli.json, &mut out)?);
        }
    }
    out.flush().context("failed to flush stdout")?;

    info!(queries = tally.asked, found = tally.found, "done");
    Ok(if tally.asked > 0 && tally.found == 0 { EXIT_NOT_FOUND } else { 0 })
}

#[derive(Default)]
struct Tally {
    asked: usize,
    found: usize,
}

impl Tally {
    fn record(&mut self, found: bool) {
        self.asked += 1;
        if found {
            self.found += 1;
        }
    }
}

/// Answer one query; returns whether the track was found.
fn answer(
    recommender: &Recommender,
    query: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<bool> {
    let set = recommender
        .recommend_default(query)
        .with_context(|| format!("query '{query}' failed"))?;
    if json {
        report::write_json(out, &set)?;
    } else {
        report::write_text(out, &set)?;
    }
    Ok(!set.is_not_found())
}
