//! Static HTTP browser driver.
//!
//! Fetches documents with `reqwest` and evaluates them without running any
//! JavaScript:
//! - `<script src>` entries are reported as outgoing requests
//! - `dataLayer.push({ event: ... })` literals in inline scripts are
//!   reported as event-queue pushes
//! - product links and add-to-cart controls are found by pattern
//!
//! Events wired to client-side handlers are reported when the page loads,
//! not when the handler would run. A JavaScript-executing driver plugs in
//! behind the same port when that distinction matters.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{
    BrowserDriver, BrowserError, BrowserSession, ClickTarget, EventBridge, LaunchOptions,
    PageInspection, WaitUntil,
};

static SCRIPT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").expect("valid pattern")
});

static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid pattern")
});

static PRODUCT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*\bhref\s*=\s*["']([^"']*/products?/[^"']*)["']"#)
        .expect("valid pattern")
});

static ADD_TO_CART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)name\s*=\s*["']add["']|class\s*=\s*["'][^"']*\badd-to-cart\b|data-add-to-cart|action\s*=\s*["'][^"']*/cart/add"#,
    )
    .expect("valid pattern")
});

static PUSHED_EVENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)dataLayer\.push\(\s*\{[^}]*?['"]?event['"]?\s*:\s*['"]([A-Za-z0-9_.]+)['"]"#)
        .expect("valid pattern")
});

/// A fetched document reduced to what the audit needs.
#[derive(Debug, Clone, Default)]
struct StaticPage {
    url: Option<Url>,
    script_sources: Vec<String>,
    inline_scripts: Vec<String>,
    product_links: Vec<String>,
    has_add_to_cart: bool,
}

impl StaticPage {
    fn parse(url: Url, html: &str) -> Self {
        let mut page = Self {
            url: Some(url),
            ..Self::default()
        };
        for script in SCRIPT_TAG.captures_iter(html) {
            let attrs = script.get(1).map_or("", |m| m.as_str());
            if let Some(src) = SRC_ATTR.captures(attrs).and_then(|c| c.get(1)) {
                page.script_sources.push(src.as_str().to_string());
            }
            let body = script.get(2).map_or("", |m| m.as_str()).trim();
            if !body.is_empty() {
                page.inline_scripts.push(body.to_string());
            }
        }
        page.product_links = PRODUCT_LINK
            .captures_iter(html)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();
        page.has_add_to_cart = ADD_TO_CART.is_match(html);
        page
    }

    fn scripts(&self) -> impl Iterator<Item = &String> {
        self.script_sources.iter().chain(self.inline_scripts.iter())
    }

    fn pushed_events(&self) -> Vec<String> {
        self.inline_scripts
            .iter()
            .flat_map(|s| PUSHED_EVENT.captures_iter(s))
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    fn inspection(&self) -> PageInspection {
        let tag_manager_present = self
            .scripts()
            .any(|s| s.contains("googletagmanager.com/gtm.js") || s.contains("GTM-"));
        let gtag_present = self
            .scripts()
            .any(|s| s.contains("googletagmanager.com/gtag/js") || s.contains("gtag("));
        PageInspection {
            tag_manager_present,
            data_layer_present: self.scripts().any(|s| s.contains("dataLayer")),
            gtag_present,
            script_sources: self.script_sources.clone(),
            inline_scripts: self.inline_scripts.clone(),
        }
    }
}

/// Driver that fetches pages over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpBrowserDriver {
    pool_idle_timeout: Duration,
}

impl HttpBrowserDriver {
    pub fn new() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(30),
        }
    }

    fn client(&self, options: &LaunchOptions) -> Result<Client> {
        Client::builder()
            .user_agent(options.user_agent.clone())
            .pool_idle_timeout(self.pool_idle_timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}

impl Default for HttpBrowserDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserDriver for HttpBrowserDriver {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn launch(
        &self,
        options: LaunchOptions,
        bridge: EventBridge,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let client = self
            .client(&options)
            .map_err(|e| BrowserError::Launch(format!("{e:#}")))?;
        Ok(Box::new(HttpSession {
            client,
            bridge,
            page: StaticPage::default(),
        }))
    }
}

struct HttpSession {
    client: Client,
    bridge: EventBridge,
    page: StaticPage,
}

impl HttpSession {
    fn resolve(&self, link: &str) -> Result<Url, BrowserError> {
        let resolved = match &self.page.url {
            Some(base) => base.join(link),
            None => Url::parse(link),
        };
        resolved.map_err(|e| BrowserError::Navigation {
            url: link.to_string(),
            message: e.to_string(),
        })
    }

    async fn load(&mut self, url: Url, timeout: Duration) -> Result<(), BrowserError> {
        let nav_error = |message: String| BrowserError::Navigation {
            url: url.to_string(),
            message,
        };

        self.bridge.request(url.as_str(), "GET");
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrowserError::Timeout {
                        url: url.to_string(),
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    }
                } else {
                    nav_error(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(nav_error(format!("HTTP {status}")));
        }
        let final_url = response.url().clone();
        let html = response.text().await.map_err(|e| nav_error(e.to_string()))?;

        let page = StaticPage::parse(final_url.clone(), &html);
        debug!(
            url = %url,
            scripts = page.script_sources.len(),
            inline_scripts = page.inline_scripts.len(),
            product_links = page.product_links.len(),
            "page fetched"
        );

        for src in &page.script_sources {
            if let Ok(resolved) = final_url.join(src) {
                self.bridge.request(resolved.as_str(), "GET");
            }
        }
        for event in page.pushed_events() {
            self.bridge.push(json!({ "event": event }));
        }
        self.page = page;
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn goto(
        &mut self,
        url: &str,
        _wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let target = self.resolve(url)?;
        self.load(target, timeout).await
    }

    async fn click(&mut self, target: ClickTarget, timeout: Duration) -> Result<bool, BrowserError> {
        match target {
            ClickTarget::ProductLink => {
                let Some(link) = self.page.product_links.first().cloned() else {
                    return Ok(false);
                };
                let url = self.resolve(&link)?;
                self.load(url, timeout).await.map(|()| true)
            }
            ClickTarget::AddToCart => Ok(self.page.has_add_to_cart),
        }
    }

    async fn inspect(&mut self) -> Result<PageInspection, BrowserError> {
        if self.page.url.is_none() {
            return Err(BrowserError::Evaluation("no document loaded".to_string()));
        }
        Ok(self.page.inspection())
    }

    async fn settle(&mut self, _duration: Duration) {
        // Static documents have no in-flight activity to wait for.
    }

    fn current_url(&self) -> Option<String> {
        self.page.url.as_ref().map(Url::to_string)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        Ok(())
    }
}
