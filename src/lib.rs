pub mod config;
pub mod error;
pub mod model;
pub mod extractor;
pub mod page_source;
pub mod listing_parser;
pub mod detail_parser;
pub mod browser_source;
pub mod http_source;
pub mod crawler;
pub mod output;
pub mod logger;

// Exporting types for convenience
pub use config::{Cli, Engine, OutputFormat, ScraperConfig};
pub use error::{Result, ScrapeError};
pub use model::{number_records, HomeCard, NumberedRecord, PropertyDetails, ScrapedHome};
pub use page_source::{DetailPage, ListingPage, PageSource};
pub use browser_source::BrowserSource;
pub use http_source::HttpSource;
pub use crawler::RedfinScraper;
pub use extractor::Extractor;
