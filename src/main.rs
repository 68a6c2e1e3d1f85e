use clap::Parser;
use tracing_subscriber::EnvFilter;

use nowpensions_scraper::{run, Options, Result};

fn main() -> Result<()> {
    let options = Options::parse();
    if options.validate().is_err() {
        println!("{}", Options::usage());
        return Ok(());
    }

    let level = if options.verbose {
        "nowpensions_scraper=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let report = run(&options)?;
    println!("{}", report.details);
    if let Some(title) = report.published_to {
        println!("{title}");
    }

    Ok(())
}
