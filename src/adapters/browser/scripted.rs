//! Scripted browser driver for tests and dry runs.
//!
//! Pages are declared up front, keyed by path. Visiting a page replays its
//! requests and event-queue pushes over the session's bridge, the same way a
//! real driver forwards what the live page does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::domain::ports::{
    BrowserDriver, BrowserError, BrowserSession, ClickTarget, EventBridge, LaunchOptions,
    PageInspection, WaitUntil,
};

/// What a scripted page contains and emits.
#[derive(Debug, Clone, Default)]
pub struct PageScript {
    tag_manager: bool,
    gtag: bool,
    script_sources: Vec<String>,
    inline_scripts: Vec<String>,
    requests: Vec<String>,
    pushes: Vec<String>,
    product_link: Option<String>,
    /// `Some(None)` is a control that pushes nothing when clicked.
    add_to_cart: Option<Option<String>>,
}

impl PageScript {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tag_manager(mut self) -> Self {
        self.tag_manager = true;
        self
    }

    #[must_use]
    pub fn with_gtag(mut self) -> Self {
        self.gtag = true;
        self
    }

    #[must_use]
    pub fn with_script_src(mut self, src: impl Into<String>) -> Self {
        self.script_sources.push(src.into());
        self
    }

    #[must_use]
    pub fn with_inline_script(mut self, body: impl Into<String>) -> Self {
        self.inline_scripts.push(body.into());
        self
    }

    /// Outgoing request fired when the page loads.
    #[must_use]
    pub fn with_request(mut self, url: impl Into<String>) -> Self {
        self.requests.push(url.into());
        self
    }

    /// Event pushed onto the page's event queue when it loads.
    #[must_use]
    pub fn with_push(mut self, event: impl Into<String>) -> Self {
        self.pushes.push(event.into());
        self
    }

    #[must_use]
    pub fn with_product_link(mut self, path: impl Into<String>) -> Self {
        self.product_link = Some(path.into());
        self
    }

    /// Add-to-cart control that pushes `event` when clicked.
    #[must_use]
    pub fn with_add_to_cart(mut self, event: impl Into<String>) -> Self {
        self.add_to_cart = Some(Some(event.into()));
        self
    }

    /// Add-to-cart control wired to no tracking at all.
    #[must_use]
    pub fn with_silent_add_to_cart(mut self) -> Self {
        self.add_to_cart = Some(None);
        self
    }

    fn inspection(&self) -> PageInspection {
        PageInspection {
            tag_manager_present: self.tag_manager,
            data_layer_present: self.tag_manager || !self.pushes.is_empty(),
            gtag_present: self.gtag,
            script_sources: self.script_sources.clone(),
            inline_scripts: self.inline_scripts.clone(),
        }
    }
}

#[derive(Debug, Clone)]
enum PageEntry {
    Loads(PageScript),
    Fails(String),
    Hangs,
    Cancels(CancellationToken),
}

/// Launch and close counts, shared with every session of a driver.
#[derive(Debug, Clone, Default)]
pub struct DriverProbe {
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl DriverProbe {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Sessions launched but not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.launches().saturating_sub(self.closes())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedBrowserDriver {
    pages: Arc<HashMap<String, PageEntry>>,
    launch_error: Option<String>,
    probe: DriverProbe,
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

impl ScriptedBrowserDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver whose browser never starts.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            launch_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Storefront with a tag manager and GA4 where `add_to_cart` and
    /// `begin_checkout` never fire.
    pub fn demo_storefront() -> Self {
        Self::new()
            .page(
                "/",
                PageScript::new()
                    .with_tag_manager()
                    .with_script_src("https://www.googletagmanager.com/gtm.js?id=GTM-DEMO001")
                    .with_inline_script("gtag('config', 'G-DEMO12345');")
                    .with_request("https://www.googletagmanager.com/gtm.js?id=GTM-DEMO001")
                    .with_request("https://www.google-analytics.com/g/collect?v=2&en=page_view")
                    .with_product_link("/products/demo-item"),
            )
            .page(
                "/products/demo-item",
                PageScript::new()
                    .with_tag_manager()
                    .with_push("view_item")
                    .with_request("https://www.facebook.com/tr?id=1&ev=ViewContent")
                    .with_silent_add_to_cart(),
            )
            .page(
                "/cart",
                PageScript::new().with_tag_manager().with_push("view_cart"),
            )
            .page(
                "/checkout",
                PageScript::new()
                    .with_tag_manager()
                    .with_inline_script("dataLayer.push({event: 'purchase', transaction_id: id});"),
            )
    }

    #[must_use]
    pub fn page(self, path: &str, script: PageScript) -> Self {
        self.with_entry(path, PageEntry::Loads(script))
    }

    /// Navigating to `path` fails with `message`.
    #[must_use]
    pub fn failing_page(self, path: &str, message: impl Into<String>) -> Self {
        self.with_entry(path, PageEntry::Fails(message.into()))
    }

    /// Navigating to `path` never completes.
    #[must_use]
    pub fn hanging_page(self, path: &str) -> Self {
        self.with_entry(path, PageEntry::Hangs)
    }

    /// Navigating to `path` cancels `token` and then hangs.
    #[must_use]
    pub fn cancel_on_visit(self, path: &str, token: CancellationToken) -> Self {
        self.with_entry(path, PageEntry::Cancels(token))
    }

    fn with_entry(mut self, path: &str, entry: PageEntry) -> Self {
        let mut pages = (*self.pages).clone();
        pages.insert(normalize_path(path), entry);
        self.pages = Arc::new(pages);
        self
    }

    pub fn probe(&self) -> DriverProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl BrowserDriver for ScriptedBrowserDriver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn launch(
        &self,
        _options: LaunchOptions,
        bridge: EventBridge,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.probe.launches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.launch_error {
            return Err(BrowserError::Launch(message.clone()));
        }
        Ok(Box::new(ScriptedSession {
            pages: Arc::clone(&self.pages),
            bridge,
            probe: self.probe.clone(),
            current: None,
        }))
    }
}

struct ScriptedSession {
    pages: Arc<HashMap<String, PageEntry>>,
    bridge: EventBridge,
    probe: DriverProbe,
    current: Option<(reqwest::Url, PageScript)>,
}

impl ScriptedSession {
    async fn visit(&mut self, url: reqwest::Url) -> Result<(), BrowserError> {
        let entry = self.pages.get(&normalize_path(url.path())).cloned();
        match entry {
            Some(PageEntry::Loads(script)) => {
                self.bridge.request(url.as_str(), "GET");
                for request in &script.requests {
                    self.bridge.request(request.as_str(), "GET");
                }
                for event in &script.pushes {
                    self.bridge.push(json!({ "event": event }));
                }
                self.current = Some((url, script));
                Ok(())
            }
            Some(PageEntry::Fails(message)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                message,
            }),
            Some(PageEntry::Hangs) => std::future::pending().await,
            Some(PageEntry::Cancels(token)) => {
                token.cancel();
                std::future::pending().await
            }
            None => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            }),
        }
    }

    fn resolve(&self, link: &str) -> Result<reqwest::Url, BrowserError> {
        let parsed = match &self.current {
            Some((base, _)) => base.join(link),
            None => reqwest::Url::parse(link),
        };
        parsed.map_err(|e| BrowserError::Navigation {
            url: link.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn goto(
        &mut self,
        url: &str,
        _wait_until: WaitUntil,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        let target = self.resolve(url)?;
        self.visit(target).await
    }

    async fn click(
        &mut self,
        target: ClickTarget,
        _timeout: Duration,
    ) -> Result<bool, BrowserError> {
        let Some((_, page)) = &self.current else {
            return Ok(false);
        };
        match target {
            ClickTarget::ProductLink => {
                let Some(link) = page.product_link.clone() else {
                    return Ok(false);
                };
                let url = self.resolve(&link)?;
                self.visit(url).await.map(|()| true)
            }
            ClickTarget::AddToCart => match &page.add_to_cart {
                None => Ok(false),
                Some(event) => {
                    if let Some(event) = event {
                        self.bridge.push(json!({ "event": event }));
                    }
                    Ok(true)
                }
            },
        }
    }

    async fn inspect(&mut self) -> Result<PageInspection, BrowserError> {
        match &self.current {
            Some((_, page)) => Ok(page.inspection()),
            None => Err(BrowserError::Evaluation("no document loaded".to_string())),
        }
    }

    async fn settle(&mut self, _duration: Duration) {
        tokio::task::yield_now().await;
    }

    fn current_url(&self) -> Option<String> {
        self.current.as_ref().map(|(url, _)| url.to_string())
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
