use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inspector_facet::{
    compose,
    config::{Cli, Config, FacetSource},
    inspect, load_crawldata,
    loupe::fetch_facets,
    replay,
    report::{self, OutputFormat},
    Catalog, MatchReport,
};

fn init_tracing() {
    // stdout is reserved for the report
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_writer(io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Config::from_cli(Cli::parse())?;

    let catalog = match &config.project {
        Some(dir) => Catalog::load_dir(dir)
            .with_context(|| format!("Could not load ABIs from {}", dir.display()))?,
        None => {
            info!("📚 No project given, every facet will report empty matches");
            Catalog::new()
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &config.source {
        FacetSource::Crawldata(path) => {
            let records = load_crawldata(path)?;
            if config.timeline {
                let timeline = compose(&records, &catalog)
                    .context("Could not reconstruct the diamond's history from crawl data")?;
                info!("🕰️  Built {} timeline snapshots", timeline.len());
                match config.format {
                    OutputFormat::Json => report::write_json(&mut out, &timeline)?,
                    OutputFormat::Human => report::write_timeline_human(&mut out, &timeline)?,
                }
            } else {
                let facets = replay(&records).context(
                    "Could not reconstruct information about currently attached methods on Diamond",
                )?;
                emit(&mut out, config.format, &inspect(&facets, &catalog))?;
            }
        }
        FacetSource::Loupe { rpc_url, diamond } => {
            let facets = fetch_facets(rpc_url.clone(), *diamond).await?;
            emit(&mut out, config.format, &inspect(&facets, &catalog))?;
        }
    }

    out.flush()?;
    Ok(())
}

fn emit<W: Write>(out: &mut W, format: OutputFormat, result: &MatchReport) -> io::Result<()> {
    match format {
        OutputFormat::Json => report::write_json(out, result),
        OutputFormat::Human => report::write_human(out, result),
    }
}
