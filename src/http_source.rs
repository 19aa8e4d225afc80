use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::Html;
use log::{info, warn};
use crate::config::ScraperConfig;
use crate::error::Result;
use crate::extractor::document_text;
use crate::page_source::{check_detail_status, DetailPage, ListingPage, PageSource};

/// Fetches pages without a browser. Only server-rendered markup is seen,
/// so lazily loaded cards never appear.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_str(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&config.accept_language)?);

        let client = Client::builder()
            .timeout(config.navigation_timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(HttpSource { client })
    }

    fn get(&self, url: &str) -> Result<(u16, String)> {
        let resp = self.client.get(url).send()?;
        let status = resp.status().as_u16();
        let text = resp.text()?;
        Ok((status, text))
    }
}

impl PageSource for HttpSource {
    fn open_listing(&mut self, url: &str, want: usize) -> Result<ListingPage> {
        let (status, html) = self.get(url)?;
        if status >= 400 {
            warn!("Listing page returned HTTP {}: {}", status, url);
        }
        info!("Fetched {} over HTTP ({} bytes); scrolling is unavailable, wanted {} cards", url, html.len(), want);
        Ok(ListingPage {
            url: url.to_string(),
            html,
        })
    }

    fn open_detail(&mut self, url: &str) -> Result<DetailPage> {
        let (status, html) = self.get(url)?;
        let status = check_detail_status(url, Some(status))?;
        let body_text = document_text(&Html::parse_document(&html));
        Ok(DetailPage {
            url: url.to_string(),
            status,
            html,
            body_text,
        })
    }
}
