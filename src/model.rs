use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

/// One listing tile from the homepage grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeCard {
    pub title: Option<String>,
    pub price: Option<String>,
    pub beds: Option<String>,
    pub baths: Option<String>,
    pub sqft: Option<String>,
    pub address: Option<String>,
    pub detail_url: String,
    pub image_url: Option<String>,
}

/// Everything read off a property detail page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyDetails {
    pub status_badge: Option<String>,
    pub price: Option<String>,
    pub monthly_payment: Option<String>,
    pub beds: Option<String>,
    pub baths: Option<String>,
    pub sqft: Option<String>,
    pub address: Option<String>,
    pub on_redfin: Option<String>,
    pub views: Option<String>,
    pub favorites: Option<String>,
    pub description: Option<String>,
    /// Key detail rows in page order.
    pub key_details: IndexMap<String, String>,
    pub agent_name: Option<String>,
    pub agent_broker: Option<String>,
    pub agent_profile_url: Option<String>,
    pub listing_updated: Option<String>,
    pub redfin_checked: Option<String>,
    pub mls_source: Option<String>,
    pub mls_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedHome {
    pub card: HomeCard,
    pub detail: PropertyDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberedRecord {
    pub id: usize,
    pub card: HomeCard,
    pub detail: PropertyDetails,
}

/// Assigns 1-based ids in scrape order.
pub fn number_records(homes: Vec<ScrapedHome>) -> Vec<NumberedRecord> {
    homes
        .into_iter()
        .enumerate()
        .map(|(i, home)| NumberedRecord {
            id: i + 1,
            card: home.card,
            detail: home.detail,
        })
        .collect()
}
