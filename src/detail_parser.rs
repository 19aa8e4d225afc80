use scraper::{ElementRef, Html, Selector};
use log::debug;
use indexmap::IndexMap;
use crate::extractor::{absolute_url, clean_stat, element_text, Extractor};
use crate::model::PropertyDetails;
use crate::page_source::DetailPage;

pub const PRICE_SECTION_SELECTOR: &str = "[data-rf-test-id='abp-price']";

struct Selectors {
    price: Selector,
    monthly: Selector,
    beds: Selector,
    baths: Selector,
    sqft: Selector,
    address: Selector,
    house_info: Selector,
    remarks: Selector,
    key_row: Selector,
    key_label: Selector,
    key_value: Selector,
    agent: Selector,
    agent_name: Selector,
    agent_broker: Selector,
    listing_info: Selector,
    updated: Selector,
    checked: Selector,
    source: Selector,
    mls_id: Selector,
    any: Selector,
}

impl Selectors {
    fn new() -> Self {
        let sel = |css: &str| Selector::parse(css).expect("valid detail selector");
        Selectors {
            price: sel("[data-rf-test-id='abp-price'] .statsValue.price"),
            monthly: sel("[data-rf-test-id='abp-monthly-payment-entry-point-estimate']"),
            beds: sel("[data-rf-test-id='abp-beds']"),
            baths: sel("[data-rf-test-id='abp-baths']"),
            sqft: sel("[data-rf-test-id='abp-sqFt']"),
            address: sel("[data-rf-test-id='abp-homeinfo-homeaddress']"),
            house_info: sel("[data-rf-test-id='house-info']"),
            remarks: sel("#marketing-remarks-scroll"),
            key_row: sel(".KeyDetailsTable .keyDetails-row"),
            key_label: sel(".valueType"),
            key_value: sel(".valueText"),
            agent: sel("[data-rf-test-id='agentInfoItem-redfinAgentDisplay']"),
            agent_name: sel(".agent-basic-details--heading a"),
            agent_broker: sel(".agent-basic-details--broker span"),
            listing_info: sel(".listingInfoSection"),
            updated: sel(".data-quality time"),
            checked: sel(".data-quality a"),
            source: sel(".ListingSource--dataSourceName"),
            mls_id: sel(".ListingSource--mlsId"),
            any: sel("*"),
        }
    }
}

#[derive(Default)]
struct AgentInfo {
    name: Option<String>,
    broker: Option<String>,
    profile_url: Option<String>,
}

#[derive(Default)]
struct ListingInfo {
    updated: Option<String>,
    checked: Option<String>,
    source: Option<String>,
    mls_id: Option<String>,
}

pub struct DetailParser {
    base_url: String,
    selectors: Selectors,
    extractor: Extractor,
}

impl DetailParser {
    pub fn new(base_url: &str) -> Self {
        DetailParser {
            base_url: base_url.to_string(),
            selectors: Selectors::new(),
            extractor: Extractor::new(),
        }
    }

    pub fn parse(&self, page: &DetailPage) -> PropertyDetails {
        let document = Html::parse_document(&page.html);
        let s = &self.selectors;
        let stat = |selector: &Selector| {
            document
                .select(selector)
                .next()
                .and_then(|el| clean_stat(Some(&element_text(el, " "))))
        };

        let mut details = PropertyDetails {
            status_badge: self.status_badge(&document, &page.body_text),
            price: stat(&s.price),
            monthly_payment: stat(&s.monthly),
            beds: stat(&s.beds),
            baths: stat(&s.baths),
            sqft: stat(&s.sqft),
            address: stat(&s.address),
            ..PropertyDetails::default()
        };

        match self.extractor.extract_engagement(&page.body_text) {
            Some(engagement) => {
                details.on_redfin = engagement.on_redfin;
                details.views = engagement.views;
                details.favorites = engagement.favorites;
            }
            None => log_missing_engagement(&page.url, &page.body_text),
        }

        // Sections below only count when they sit inside the house-info block.
        let Some(house_info) = document.select(&s.house_info).next() else {
            debug!("No house-info section on {}", page.url);
            return details;
        };

        details.description = house_info
            .select(&s.remarks)
            .next()
            .map(|node| element_text(node, " "));
        details.key_details = self.key_details(house_info);

        let agent = self.agent_info(house_info);
        details.agent_name = agent.name;
        details.agent_broker = agent.broker;
        details.agent_profile_url = agent.profile_url;

        let listing = self.listing_info(house_info);
        details.listing_updated = listing.updated;
        details.redfin_checked = listing.checked;
        details.mls_source = listing.source;
        details.mls_id = listing.mls_id;

        details
    }

    fn status_badge(&self, document: &Html, body_text: &str) -> Option<String> {
        let candidates: Vec<String> = document
            .select(&self.selectors.any)
            .filter(|el| {
                el.value()
                    .attr("class")
                    .map_or(false, |class| class.to_lowercase().contains("status"))
            })
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        self.extractor
            .pick_status(candidates.iter().map(String::as_str))
            .or_else(|| self.extractor.status_from_body(body_text))
    }

    fn key_details(&self, house_info: ElementRef<'_>) -> IndexMap<String, String> {
        let s = &self.selectors;
        let mut details = IndexMap::new();
        for row in house_info.select(&s.key_row) {
            let (Some(label), Some(value)) = (row.select(&s.key_label).next(), row.select(&s.key_value).next()) else {
                continue;
            };
            let label_text = element_text(label, "");
            if label_text.eq_ignore_ascii_case("on redfin") {
                continue;
            }
            details.insert(label_text, element_text(value, " "));
        }
        details
    }

    fn agent_info(&self, house_info: ElementRef<'_>) -> AgentInfo {
        let s = &self.selectors;
        let Some(section) = house_info.select(&s.agent).next() else {
            return AgentInfo::default();
        };

        let mut agent = AgentInfo::default();
        if let Some(name_node) = section.select(&s.agent_name).next() {
            agent.name = Some(element_text(name_node, ""));
            // An empty href is kept as an empty string, not resolved against the base.
            agent.profile_url = name_node.value().attr("href").map(|href| {
                if href.is_empty() {
                    String::new()
                } else {
                    absolute_url(&self.base_url, href)
                }
            });
        }
        agent.broker = section
            .select(&s.agent_broker)
            .next()
            .map(|node| element_text(node, " "));
        agent
    }

    fn listing_info(&self, house_info: ElementRef<'_>) -> ListingInfo {
        let s = &self.selectors;
        let Some(section) = house_info.select(&s.listing_info).next() else {
            return ListingInfo::default();
        };

        let labelled = |selector: &Selector, label: &str, strip_hash: bool| {
            section.select(selector).next().map(|node| {
                let text = element_text(node, "");
                let text = if strip_hash { text.trim_start_matches('#') } else { text.as_str() };
                format!("{}: {}", label, clean_stat(Some(text)).unwrap_or_default())
            })
        };

        ListingInfo {
            updated: labelled(&s.updated, "Listing updated", false),
            checked: labelled(&s.checked, "Redfin checked", false),
            source: labelled(&s.source, "Source", false),
            mls_id: labelled(&s.mls_id, "MLS ID", true),
        }
    }
}

fn log_missing_engagement(url: &str, body_text: &str) {
    let lowered = body_text.to_lowercase();
    let Some(index) = lowered.find("on redfin") else {
        debug!("Engagement text absent for {}", url);
        return;
    };
    // Lowercasing can shift byte offsets, so cut on char counts of the unlowered text.
    let char_index = lowered[..index].chars().count();
    let snippet: String = body_text
        .chars()
        .skip(char_index.saturating_sub(40))
        .take(char_index.min(40) + 80)
        .collect();
    debug!("Engagement snippet without match for {}: {:?}", url, snippet);
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_HTML: &str = r##"
<html><body>
  <div class="ListingStatusBannerSection">
    <span class="status-icon"></span>
    <span class="bp-DefinitionFlyout__status">  Active
    </span>
  </div>
  <div data-rf-test-id="abp-price">
    <div class="statsValue price">$1,250,000</div>
  </div>
  <span data-rf-test-id="abp-monthly-payment-entry-point-estimate">Est. $8,102/mo</span>
  <div data-rf-test-id="abp-beds"><div class="statsValue">4</div><div class="statsLabel">beds</div></div>
  <div data-rf-test-id="abp-baths"><div class="statsValue">3.5</div><div class="statsLabel">baths</div></div>
  <div data-rf-test-id="abp-sqFt"><span class="statsValue">2,900</span> <span>sq ft</span></div>
  <div data-rf-test-id="abp-homeinfo-homeaddress"><h1>42 Elm St,<br>Austin, TX 78704</h1></div>
  <div data-rf-test-id="house-info">
    <div id="marketing-remarks-scroll"><p>Light-filled home</p> <p>near the park.</p></div>
    <div class="KeyDetailsTable">
      <div class="keyDetails-row"><span class="valueType">On Redfin</span><span class="valueText">3 days</span></div>
      <div class="keyDetails-row"><span class="valueType">Year Built</span><span class="valueText">1998</span></div>
      <div class="keyDetails-row"><span class="valueType">HOA <b>Dues</b></span><span class="valueText"><span>$85</span><span>/mo</span></span></div>
      <div class="keyDetails-row"><span class="valueType">Orphan</span></div>
    </div>
    <div data-rf-test-id="agentInfoItem-redfinAgentDisplay">
      <div class="agent-basic-details--heading"><a href="/real-estate-agents/jane-doe">Jane Doe</a></div>
      <div class="agent-basic-details--broker"><span>Redfin <em>Corp</em></span></div>
    </div>
    <div class="listingInfoSection">
      <div class="data-quality">Listing updated: <time>Oct 18, 2026 at 9:15pm</time> • <a href="#">3 minutes
        ago</a></div>
      <div class="ListingSource--dataSourceName">Unlock MLS</div>
      <div class="ListingSource--mlsId">#5551234</div>
    </div>
  </div>
</body></html>"##;

    fn page(html: &str, body_text: &str) -> DetailPage {
        DetailPage {
            url: "https://www.redfin.com/TX/Austin/42-Elm-St/home/9".to_string(),
            status: 200,
            html: html.to_string(),
            body_text: body_text.to_string(),
        }
    }

    #[test]
    fn test_parses_stats_and_sections() {
        let parser = DetailParser::new("https://www.redfin.com");
        let body = "Active\n$1,250,000\n3 days on Redfin • 1,402 views • 77 favorites";
        let details = parser.parse(&page(DETAIL_HTML, body));

        assert_eq!(details.status_badge.as_deref(), Some("Active"));
        assert_eq!(details.price.as_deref(), Some("$1,250,000"));
        assert_eq!(details.monthly_payment.as_deref(), Some("Est. $8,102/mo"));
        assert_eq!(details.beds.as_deref(), Some("4 beds"));
        assert_eq!(details.baths.as_deref(), Some("3.5 baths"));
        assert_eq!(details.sqft.as_deref(), Some("2,900 sq ft"));
        assert_eq!(details.address.as_deref(), Some("42 Elm St, Austin, TX 78704"));
        assert_eq!(details.on_redfin.as_deref(), Some("3 days on Redfin"));
        assert_eq!(details.views.as_deref(), Some("1,402 views"));
        assert_eq!(details.favorites.as_deref(), Some("77 favorites"));
        assert_eq!(details.description.as_deref(), Some("Light-filled home near the park."));
    }

    #[test]
    fn test_key_details_skip_on_redfin_and_orphans() {
        let parser = DetailParser::new("https://www.redfin.com");
        let details = parser.parse(&page(DETAIL_HTML, ""));

        assert_eq!(details.key_details.len(), 2);
        assert_eq!(details.key_details.get("Year Built").map(String::as_str), Some("1998"));
        assert_eq!(details.key_details.get("HOADues").map(String::as_str), Some("$85 /mo"));
        assert!(!details.key_details.contains_key("On Redfin"));
    }

    #[test]
    fn test_agent_and_listing_info() {
        let parser = DetailParser::new("https://www.redfin.com");
        let details = parser.parse(&page(DETAIL_HTML, ""));

        assert_eq!(details.agent_name.as_deref(), Some("Jane Doe"));
        assert_eq!(
            details.agent_profile_url.as_deref(),
            Some("https://www.redfin.com/real-estate-agents/jane-doe")
        );
        assert_eq!(details.agent_broker.as_deref(), Some("Redfin Corp"));
        assert_eq!(details.listing_updated.as_deref(), Some("Listing updated: Oct 18, 2026 at 9:15pm"));
        assert_eq!(details.redfin_checked.as_deref(), Some("Redfin checked: 3 minutes ago"));
        assert_eq!(details.mls_source.as_deref(), Some("Source: Unlock MLS"));
        assert_eq!(details.mls_id.as_deref(), Some("MLS ID: 5551234"));
    }

    #[test]
    fn test_missing_sections_leave_fields_empty() {
        let parser = DetailParser::new("https://www.redfin.com");
        let html = "<html><body><div data-rf-test-id=\"abp-price\"><div class=\"statsValue price\">$9</div></div>\
                    <div id=\"marketing-remarks-scroll\">outside house info</div></body></html>";
        let details = parser.parse(&page(html, "Nothing to see. On Redfin since forever."));

        assert_eq!(details.price.as_deref(), Some("$9"));
        assert_eq!(details.description, None);
        assert!(details.key_details.is_empty());
        assert_eq!(details.agent_name, None);
        assert_eq!(details.mls_id, None);
        assert_eq!(details.on_redfin, None);
        assert_eq!(details.status_badge, None);
    }

    #[test]
    fn test_key_details_keep_page_order() {
        let parser = DetailParser::new("https://www.redfin.com");
        let details = parser.parse(&page(DETAIL_HTML, ""));
        let labels: Vec<&str> = details.key_details.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["Year Built", "HOADues"]);
    }

    #[test]
    fn test_empty_agent_href_stays_empty() {
        let parser = DetailParser::new("https://www.redfin.com");
        let html = r#"<html><body><div data-rf-test-id="house-info">
            <div data-rf-test-id="agentInfoItem-redfinAgentDisplay">
              <div class="agent-basic-details--heading"><a href="">Sam Lee</a></div>
            </div></div></body></html>"#;
        let details = parser.parse(&page(html, ""));
        assert_eq!(details.agent_name.as_deref(), Some("Sam Lee"));
        assert_eq!(details.agent_profile_url.as_deref(), Some(""));
    }

    #[test]
    fn test_inline_script_state_is_not_a_status_badge() {
        let parser = DetailParser::new("https://www.redfin.com");
        let html = r#"<html><body><script>window.__reactServerState = {"listing":{"isActive":true,"views":3}};</script>
            <h1>42 Elm St</h1><p>Tour this home</p></body></html>"#;
        let body_text = crate::extractor::document_text(&Html::parse_document(html));
        let details = parser.parse(&page(html, &body_text));
        assert_eq!(details.status_badge, None);
    }

    #[test]
    fn test_status_badge_falls_back_to_body_text() {
        let parser = DetailParser::new("https://www.redfin.com");
        let html = "<html><body><div class=\"StatusBar\">Tour this home</div></body></html>";
        let details = parser.parse(&page(html, "Overview\n  Pending   sale \nPhotos"));
        assert_eq!(details.status_badge.as_deref(), Some("Pending sale"));
    }
}
