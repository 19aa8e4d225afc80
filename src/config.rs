use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use crate::error::Result;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.7";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// Headless Chromium (renders JavaScript, scrolls for more cards)
    Browser,
    /// Plain HTTP requests (only the server-rendered markup)
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub list_url: String,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub locale: String,
    pub timezone: String,
    pub viewport: (u32, u32),
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
    pub scroll_attempts: u32,
    pub scroll_delta: u32,
    pub scroll_pause: Duration,
    pub show_more_pause: Duration,
    pub engagement_retry_pause: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        ScraperConfig {
            base_url: "https://www.redfin.com".to_string(),
            list_url: "https://www.redfin.com/".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            locale: "en-US".to_string(),
            timezone: "America/Chicago".to_string(),
            viewport: (1440, 900),
            headless: true,
            chrome_path: None,
            navigation_timeout: Duration::from_secs(60),
            selector_timeout: Duration::from_secs(15),
            scroll_attempts: 10,
            scroll_delta: 1600,
            scroll_pause: Duration::from_millis(1000),
            show_more_pause: Duration::from_millis(250),
            engagement_retry_pause: Duration::from_millis(800),
        }
    }
}

impl ScraperConfig {
    /// Fails early on URLs that would only break later during navigation.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)?;
        Url::parse(&self.list_url)?;
        Ok(())
    }
}

/// Scrape Redfin homepage listings and their detail pages.
#[derive(Debug, Parser)]
#[command(name = "redfin-scraper", version, about)]
pub struct Cli {
    /// Maximum number of home cards to scrape
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Where to save the results
    #[arg(long, short, default_value = "redfin_results.json")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[arg(long, value_enum, default_value_t = Engine::Browser)]
    pub engine: Engine,

    /// Page that lists the home cards
    #[arg(long)]
    pub list_url: Option<String>,

    /// Prefix for relative detail and agent links
    #[arg(long)]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chrome/Chromium executable (auto-detected when omitted)
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,

    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// Do not echo the JSON results to stdout
    #[arg(long)]
    pub no_print: bool,
}

impl Cli {
    pub fn scraper_config(&self) -> ScraperConfig {
        let mut config = ScraperConfig::default();
        if let Some(base) = &self.base_url {
            config.base_url = base.trim_end_matches('/').to_string();
        }
        if let Some(list) = &self.list_url {
            config.list_url = list.clone();
        }
        config.headless = !self.headed;
        config.chrome_path = self.chrome_path.clone();
        config
    }
}
