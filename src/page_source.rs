//! The seam between page loading and parsing.
//!
//! Parsers only ever see markup and text, so the same parsing code runs on
//! pages rendered by a headless browser, fetched over plain HTTP, or loaded
//! from fixtures in tests.

use crate::error::{Result, ScrapeError};

/// The homepage after it has been given the chance to render `want` cards.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub url: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct DetailPage {
    pub url: String,
    pub status: u16,
    pub html: String,
    /// Visible page text, one block per line.
    pub body_text: String,
}

pub trait PageSource {
    fn open_listing(&mut self, url: &str, want: usize) -> Result<ListingPage>;

    fn open_detail(&mut self, url: &str) -> Result<DetailPage>;

    /// Releases the underlying browser or connection pool.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Rejects missing and error responses for a detail page.
pub fn check_detail_status(url: &str, status: Option<u16>) -> Result<u16> {
    match status {
        None => Err(ScrapeError::NoResponse(url.to_string())),
        Some(code) if code >= 400 => Err(ScrapeError::DetailStatus {
            status: code,
            url: url.to_string(),
        }),
        Some(code) => Ok(code),
    }
}
