use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{SetLocaleOverrideParams, SetTimezoneOverrideParams};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{AddScriptToEvaluateOnNewDocumentParams, NavigateParams};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use crate::config::ScraperConfig;
use crate::detail_parser::PRICE_SECTION_SELECTOR;
use crate::error::{Result, ScrapeError};
use crate::extractor::Extractor;
use crate::listing_parser::HOME_CARD_SELECTOR;
use crate::page_source::{check_detail_status, DetailPage, ListingPage, PageSource};

/// Injected before any page script runs, to look less like an automated browser.
const STEALTH_SCRIPTS: [&str; 4] = [
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined});",
    "window.chrome = {runtime: {}};",
    "Object.defineProperty(navigator, 'languages', {get: () => ['en-US', 'en']});",
    "Object.defineProperty(navigator, 'platform', {get: () => 'MacIntel'});",
];

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const BODY_TEXT_JS: &str = "document.body ? document.body.innerText : ''";

// Clicks the first "Show more" button only when it is enabled. Matching ignores case and extra whitespace.
const SHOW_MORE_JS: &str = "Array.from(document.querySelectorAll('button'))\
    .filter(b => (b.innerText || '').replace(/\\s+/g, ' ').trim().toLowerCase().includes('show more'))\
    .slice(0, 1)\
    .filter(b => !b.disabled)\
    .map(b => (b.click(), true))\
    .length > 0";

/// Drives a headless Chromium through CDP. The async browser lives on a
/// private runtime so callers keep the blocking `PageSource` interface.
pub struct BrowserSource {
    runtime: Runtime,
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    config: ScraperConfig,
    extractor: Extractor,
}

impl BrowserSource {
    pub fn launch(config: &ScraperConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let (width, height) = config.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                ..Viewport::default()
            })
            .request_timeout(config.navigation_timeout)
            .arg(format!("--lang={}", config.locale));
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(ScrapeError::Launch)?;

        let (browser, mut handler) = runtime.block_on(Browser::launch(browser_config))?;
        let handler = runtime.spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        info!("Launched {} Chromium", if config.headless { "headless" } else { "headed" });

        Ok(BrowserSource {
            runtime,
            browser: Some(browser),
            handler: Some(handler),
            config: config.clone(),
            extractor: Extractor::new(),
        })
    }

    fn browser(&self) -> Result<&Browser> {
        self.browser
            .as_ref()
            .ok_or_else(|| ScrapeError::Launch("browser has already been shut down".to_string()))
    }
}

impl PageSource for BrowserSource {
    fn open_listing(&mut self, url: &str, want: usize) -> Result<ListingPage> {
        let browser = self.browser()?;
        let html = self.runtime.block_on(async {
            let page = new_tab(browser, &self.config).await?;
            let result = render_listing(&page, &self.config, url, want).await;
            close_tab(page).await;
            result
        })?;
        Ok(ListingPage {
            url: url.to_string(),
            html,
        })
    }

    fn open_detail(&mut self, url: &str) -> Result<DetailPage> {
        let browser = self.browser()?;
        self.runtime.block_on(async {
            let page = new_tab(browser, &self.config).await?;
            let result = render_detail(&page, &self.config, &self.extractor, url).await;
            close_tab(page).await;
            result
        })
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let handler = self.handler.take();
        self.runtime.block_on(async move {
            browser.close().await?;
            if let Err(e) = browser.wait().await {
                debug!("Waiting for browser exit failed: {}", e);
            }
            if let Some(handler) = handler {
                handler.abort();
            }
            Ok::<(), ScrapeError>(())
        })?;
        info!("Browser closed");
        Ok(())
    }
}

async fn new_tab(browser: &Browser, config: &ScraperConfig) -> Result<Page> {
    let page = browser.new_page("about:blank").await?;

    let mut user_agent = SetUserAgentOverrideParams::new(config.user_agent.clone());
    user_agent.accept_language = Some(config.accept_language.clone());
    user_agent.platform = Some("MacIntel".to_string());
    page.set_user_agent(user_agent).await?;

    page.execute(SetTimezoneOverrideParams::new(config.timezone.clone())).await?;
    page.execute(SetLocaleOverrideParams {
        locale: Some(config.locale.clone()),
    })
    .await?;

    for script in STEALTH_SCRIPTS {
        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await?;
    }
    Ok(page)
}

async fn close_tab(page: Page) {
    if let Err(e) = page.close().await {
        debug!("Closing tab failed: {}", e);
    }
}

async fn render_listing(page: &Page, config: &ScraperConfig, url: &str, want: usize) -> Result<String> {
    navigate(page, url, config.navigation_timeout).await?;

    if !wait_for_selector(page, HOME_CARD_SELECTOR, config.selector_timeout).await {
        warn!("Timed out waiting for home cards to appear on the homepage.");
    }

    // Cards are lazy-loaded, so keep scrolling until enough exist or we give up.
    let count_js = format!("document.querySelectorAll({}).length", js_string(HOME_CARD_SELECTOR));
    let scroll_js = format!("window.scrollBy(0, {})", config.scroll_delta);
    let mut attempts = 0;
    while attempts < config.scroll_attempts && evaluate::<usize>(page, &count_js).await? < want {
        run(page, &scroll_js).await?;
        sleep(config.scroll_pause).await;
        attempts += 1;
    }
    debug!("Scrolled {} times on {}", attempts, url);

    Ok(page.content().await?)
}

async fn render_detail(
    page: &Page,
    config: &ScraperConfig,
    extractor: &Extractor,
    url: &str,
) -> Result<DetailPage> {
    let response = navigate(page, url, config.navigation_timeout).await?;
    let status = check_detail_status(url, response)?;

    if !wait_for_selector(page, PRICE_SECTION_SELECTOR, config.selector_timeout).await {
        warn!("Price section did not load in time for {}", url);
    }

    let mut body_text = evaluate::<String>(page, BODY_TEXT_JS).await.unwrap_or_default();

    match evaluate::<bool>(page, SHOW_MORE_JS).await {
        Ok(true) => sleep(config.show_more_pause).await,
        Ok(false) => {}
        Err(e) => debug!("Show more toggle not clicked on {}: {}", url, e),
    }

    // Engagement counters sometimes render a moment after the rest of the page.
    if !extractor.has_engagement(&body_text) {
        sleep(config.engagement_retry_pause).await;
        if let Ok(text) = evaluate::<String>(page, BODY_TEXT_JS).await {
            body_text = text;
        }
    }

    Ok(DetailPage {
        url: url.to_string(),
        status,
        html: page.content().await?,
        body_text,
    })
}

/// Loads `url` and returns the document's HTTP status, `None` when the browser saw no response.
async fn navigate(page: &Page, url: &str, limit: Duration) -> Result<Option<u16>> {
    let load = async {
        page.goto(NavigateParams::new(url)).await?;
        let request = page.wait_for_navigation_response().await?;
        let raw = request
            .as_ref()
            .and_then(|request| request.response.as_ref())
            .map(|response| response.status);
        Ok::<_, ScrapeError>(response_status(raw))
    };
    match timeout(limit, load).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::Timeout {
            action: "navigating",
            seconds: limit.as_secs(),
            url: url.to_string(),
        }),
    }
}

fn response_status(raw: Option<i64>) -> Option<u16> {
    raw.and_then(|code| u16::try_from(code).ok()).filter(|code| *code > 0)
}

/// Polls until `selector` matches; `false` when `limit` passes first.
async fn wait_for_selector(page: &Page, selector: &str, limit: Duration) -> bool {
    let probe = format!("document.querySelector({}) !== null", js_string(selector));
    let deadline = Instant::now() + limit;
    loop {
        match evaluate::<bool>(page, &probe).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => debug!("Selector probe for {} failed: {}", selector, e),
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn evaluate<T: DeserializeOwned>(page: &Page, expression: &str) -> Result<T> {
    let result = page.evaluate_expression(EvaluateParams::new(expression)).await?;
    Ok(result.into_value()?)
}

async fn run(page: &Page, expression: &str) -> Result<()> {
    page.evaluate_expression(EvaluateParams::new(expression)).await?;
    Ok(())
}

/// Quotes `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_quotes_selectors() {
        assert_eq!(
            js_string(HOME_CARD_SELECTOR),
            "\"div[data-rf-test-name='basicNode-homeCard']\""
        );
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_navigation_response_status() {
        assert_eq!(response_status(Some(200)), Some(200));
        assert_eq!(response_status(None), None);
        assert_eq!(response_status(Some(0)), None);
        assert_eq!(response_status(Some(-1)), None);

        assert_eq!(check_detail_status("u", response_status(Some(304))).unwrap(), 304);
        assert!(matches!(
            check_detail_status("u", response_status(Some(503))),
            Err(ScrapeError::DetailStatus { status: 503, .. })
        ));
        assert!(matches!(
            check_detail_status("u", response_status(None)),
            Err(ScrapeError::NoResponse(_))
        ));
    }

    #[test]
    fn test_show_more_match_ignores_case_and_spacing() {
        assert!(SHOW_MORE_JS.contains(".toLowerCase().includes('show more')"));
        assert!(SHOW_MORE_JS.contains("replace(/\\s+/g, ' ')"));
        assert!(SHOW_MORE_JS.contains("!b.disabled"));
    }

    #[test]
    fn test_stealth_scripts_cover_fingerprint_surfaces() {
        let joined = STEALTH_SCRIPTS.concat();
        for surface in ["webdriver", "window.chrome", "languages", "platform"] {
            assert!(joined.contains(surface), "missing {}", surface);
        }
    }
}
