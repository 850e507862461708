use crate::{
    config::EditorialConfig,
    error::{EditorialError, Result},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::info;
use url::Url;

/// Resolve a possibly relative link against the page host it was found on.
pub fn absolute_url(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base).map_err(|e| EditorialError::Config(format!("{}: {}", base, e)))?;
    base.join(href.trim())
        .map(String::from)
        .map_err(|e| EditorialError::fetch(href, e))
}

/// One fetched page. Lives only for the request that fetched it.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub html: String,
    pub fetched_at: DateTime<Utc>,
}

impl RawPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Turns a URL into the HTML a browser would show for it.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RawPage>;
}

#[async_trait]
impl<R: Renderer + ?Sized> Renderer for Box<R> {
    async fn render(&self, url: &str) -> Result<RawPage> {
        (**self).render(url).await
    }
}

/// Plain HTTP fetch. Enough for pages that are not rendered client-side.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(config: &EditorialConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| EditorialError::Config(format!("http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<RawPage> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| EditorialError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EditorialError::fetch(url, format!("status {}", status)));
        }

        let html = response.text().await.map_err(|e| EditorialError::fetch(url, e))?;
        info!("render: fetched {} ({} bytes)", url, html.len());
        Ok(RawPage::new(url, html))
    }
}

#[cfg(feature = "browser")]
pub use browser::BrowserRenderer;

#[cfg(feature = "browser")]
mod browser {
    use super::{RawPage, Renderer};
    use crate::{
        config::EditorialConfig,
        error::{EditorialError, Result},
    };
    use async_trait::async_trait;
    use chromiumoxide::{
        browser::{Browser, BrowserConfig},
        Page,
    };
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::time::{sleep, timeout, Instant};
    use tracing::{info, warn};

    const MARKER: &str = "h1";
    const POLL: Duration = Duration::from_millis(250);

    /// Headless Chromium, launched per page and torn down before returning.
    #[derive(Debug, Clone)]
    pub struct BrowserRenderer {
        user_agent: String,
        marker_timeout: Duration,
        settle: Duration,
        page_timeout: Duration,
    }

    impl BrowserRenderer {
        pub fn new(config: &EditorialConfig) -> Self {
            Self {
                user_agent: config.user_agent.clone(),
                marker_timeout: config.marker_timeout(),
                settle: config.settle(),
                page_timeout: config.request_timeout(),
            }
        }

        async fn launch(&self) -> Result<(Browser, tokio::task::JoinHandle<()>)> {
            let config = BrowserConfig::builder()
                .arg("--headless")
                .arg("--no-sandbox")
                .arg("--disable-dev-shm-usage")
                .arg("--disable-gpu")
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--window-size=1920,1080")
                .arg(format!("--user-agent={}", self.user_agent))
                .build()
                .map_err(EditorialError::Config)?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| EditorialError::fetch("browser", e))?;
            let events = tokio::spawn(async move { while handler.next().await.is_some() {} });
            Ok((browser, events))
        }

        async fn load(&self, browser: &Browser, url: &str) -> Result<String> {
            let page = timeout(self.page_timeout, browser.new_page(url))
                .await
                .map_err(|_| EditorialError::fetch(url, "timed out opening page"))?
                .map_err(|e| EditorialError::fetch(url, e))?;

            self.wait_for_marker(&page, url).await;
            sleep(self.settle).await;

            page.content().await.map_err(|e| EditorialError::fetch(url, e))
        }

        /// Best effort: whatever is on the page is used once the deadline passes.
        async fn wait_for_marker(&self, page: &Page, url: &str) {
            let deadline = Instant::now() + self.marker_timeout;
            while Instant::now() < deadline {
                if page.find_element(MARKER).await.is_ok() {
                    return;
                }
                sleep(POLL).await;
            }
            warn!("render: no <{}> on {} after {:?}", MARKER, url, self.marker_timeout);
        }
    }

    #[async_trait]
    impl Renderer for BrowserRenderer {
        async fn render(&self, url: &str) -> Result<RawPage> {
            let (mut browser, events) = self.launch().await?;
            let loaded = self.load(&browser, url).await;

            // The browser is released whether or not the page loaded.
            if let Err(e) = browser.close().await {
                warn!("render: failed to close browser: {}", e);
            }
            let _ = browser.wait().await;
            events.abort();

            let html = loaded?;
            info!("render: rendered {} ({} bytes)", url, html.len());
            Ok(RawPage::new(url, html))
        }
    }
}
