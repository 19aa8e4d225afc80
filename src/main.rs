use redfin_scraper_lib::{logger, output};
use redfin_scraper_lib::{number_records, BrowserSource, Cli, Engine, HttpSource, RedfinScraper, ScrapedHome, ScraperConfig};

use std::error::Error;
use clap::Parser;
use log::info;

fn scrape(config: &ScraperConfig, engine: Engine, limit: usize) -> redfin_scraper_lib::Result<Vec<ScrapedHome>> {
    match engine {
        Engine::Browser => RedfinScraper::new(BrowserSource::launch(config)?, config).scrape(limit),
        Engine::Http => RedfinScraper::new(HttpSource::new(config)?, config).scrape(limit),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logger::init(cli.log_level);

    let config = cli.scraper_config();
    config.validate()?;
    let homes = scrape(&config, cli.engine, cli.limit)?;
    let records = number_records(homes);
    info!("Scraped {} property records", records.len());

    output::write_records(&cli.output, &records, cli.format)?;

    if !cli.no_print {
        println!("{}", output::render_json(&records)?);
    }
    println!("\nSaved {} records to {}", records.len(), cli.output.display());
    Ok(())
}
