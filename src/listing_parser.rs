use scraper::{ElementRef, Html, Selector};
use log::info;
use crate::error::{Result, ScrapeError};
use crate::extractor::{absolute_url, clean_stat, element_text};
use crate::model::HomeCard;

pub const HOME_CARD_SELECTOR: &str = "div[data-rf-test-name='basicNode-homeCard']";

pub struct ListingParser {
    base_url: String,
    card: Selector,
    price: Selector,
    beds: Selector,
    baths: Selector,
    sqft: Selector,
    address: Selector,
    photo: Selector,
}

impl ListingParser {
    pub fn new(base_url: &str) -> Self {
        let sel = |css: &str| Selector::parse(css).expect("valid home card selector");
        ListingParser {
            base_url: base_url.to_string(),
            card: sel(HOME_CARD_SELECTOR),
            price: sel(".bp-Homecard__Price--value"),
            beds: sel(".bp-Homecard__Stats--beds"),
            baths: sel(".bp-Homecard__Stats--baths"),
            sqft: sel(".bp-Homecard__Stats--sqft"),
            address: sel("a.bp-Homecard__Address"),
            photo: sel(".bp-Homecard__Photo img"),
        }
    }

    pub fn count_cards(&self, html: &str) -> usize {
        Html::parse_document(html).select(&self.card).count()
    }

    /// Parses the first `limit` cards, failing when the page rendered none.
    pub fn parse_cards(&self, html: &str, limit: usize) -> Result<Vec<HomeCard>> {
        let document = Html::parse_document(html);
        let cards: Vec<ElementRef> = document.select(&self.card).collect();

        if cards.is_empty() {
            return Err(ScrapeError::NoHomeCards(format!("{} bytes of markup", html.len())));
        }

        let take = limit.min(cards.len());
        info!("Homepage rendered {} cards; using {}", cards.len(), take);

        cards.into_iter().take(take).map(|card| self.parse_card(card)).collect()
    }

    fn parse_card(&self, card: ElementRef<'_>) -> Result<HomeCard> {
        let first = |selector: &Selector| card.select(selector).next();
        let stat = |selector: &Selector| {
            first(selector).and_then(|el| clean_stat(Some(&element_text(el, " "))))
        };

        let address_link = first(&self.address);
        let address = address_link.map(|el| el.text().collect::<String>().trim().to_string());

        let detail_path = address_link
            .and_then(|el| el.value().attr("href"))
            .filter(|href| !href.is_empty())
            .ok_or(ScrapeError::MissingDetailUrl)?;

        let title = card
            .value()
            .attr("title")
            .filter(|t| !t.is_empty())
            .map(|t| t.trim().to_string())
            .or_else(|| address.clone());

        Ok(HomeCard {
            title,
            price: stat(&self.price),
            beds: stat(&self.beds),
            baths: stat(&self.baths),
            sqft: stat(&self.sqft),
            address,
            detail_url: absolute_url(&self.base_url, detail_path),
            image_url: first(&self.photo).and_then(|img| img.value().attr("src")).map(str::to_string),
        })
    }
}
