use log::{info, warn};
use crate::config::ScraperConfig;
use crate::detail_parser::DetailParser;
use crate::error::Result;
use crate::listing_parser::ListingParser;
use crate::model::ScrapedHome;
use crate::page_source::PageSource;

/// Walks the homepage grid, then every card's detail page, in order.
pub struct RedfinScraper<S: PageSource> {
    source: S,
    list_url: String,
    listing: ListingParser,
    detail: DetailParser,
}

impl<S: PageSource> RedfinScraper<S> {
    pub fn new(source: S, config: &ScraperConfig) -> Self {
        RedfinScraper {
            source,
            list_url: config.list_url.clone(),
            listing: ListingParser::new(&config.base_url),
            detail: DetailParser::new(&config.base_url),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Scrapes up to `limit` homes. The first failure aborts the run; the
    /// source is shut down either way.
    pub fn scrape(&mut self, limit: usize) -> Result<Vec<ScrapedHome>> {
        let result = self.scrape_all(limit);

        match self.source.shutdown() {
            Err(e) if result.is_ok() => Err(e),
            Err(e) => {
                warn!("Shutdown after failed scrape also failed: {}", e);
                result
            }
            Ok(()) => result,
        }
    }

    fn scrape_all(&mut self, limit: usize) -> Result<Vec<ScrapedHome>> {
        info!("Collecting up to {} home cards from {}", limit, self.list_url);
        let listing = self.source.open_listing(&self.list_url, limit)?;
        let cards = self.listing.parse_cards(&listing.html, limit)?;
        info!("Found {} home cards", cards.len());

        let total = cards.len();
        let mut results = Vec::with_capacity(total);
        for (idx, card) in cards.into_iter().enumerate() {
            info!("Scraping detail page {}/{}: {}", idx + 1, total, card.detail_url);
            let page = self.source.open_detail(&card.detail_url)?;
            let detail = self.detail.parse(&page);
            results.push(ScrapedHome { card, detail });
        }
        Ok(results)
    }
}
