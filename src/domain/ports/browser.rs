//! Browser port - interface for headless-browser drivers.
//!
//! The audit engine never talks to a browser directly. A driver opens an
//! isolated [`BrowserSession`] and forwards everything the page does that
//! the host cares about (outgoing requests, event-queue pushes) over an
//! [`EventBridge`] channel. The host reads the other end; nothing is patched
//! into the page from the engine's side.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised by browser drivers.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {timeout_ms}ms waiting for {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Page evaluation failed: {0}")]
    Evaluation(String),
}

/// Load state a navigation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    NetworkIdle,
    DomContentLoaded,
}

/// Elements the synthetic journey interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// First link to a product page.
    ProductLink,
    /// Add-to-cart button or form submit.
    AddToCart,
}

impl ClickTarget {
    /// CSS selectors for drivers that run a real DOM.
    pub const fn selectors(&self) -> &'static [&'static str] {
        match self {
            Self::ProductLink => &[r#"a[href*="/products/"]"#, r#"a[href*="/product/"]"#],
            Self::AddToCart => &[
                r#"input[name="add"]"#,
                ".add-to-cart",
                "[data-add-to-cart]",
                r#"form[action*="/cart/add"] input[type="submit"]"#,
            ],
        }
    }
}

/// An outgoing request observed by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRequest {
    pub url: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
}

/// One push onto the page's event queue (its `dataLayer`).
#[derive(Debug, Clone, PartialEq)]
pub struct PushedEvent {
    /// Value of the pushed object's `event` key, if any.
    pub event: Option<String>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Request(ObservedRequest),
    Push(PushedEvent),
}

/// Sending half of the page-to-host channel handed to a driver on launch.
#[derive(Debug, Clone)]
pub struct EventBridge {
    tx: mpsc::UnboundedSender<PageEvent>,
}

impl EventBridge {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn request(&self, url: impl Into<String>, method: impl Into<String>) {
        let _ = self.tx.send(PageEvent::Request(ObservedRequest {
            url: url.into(),
            method: method.into(),
            timestamp: Utc::now(),
        }));
    }

    pub fn push(&self, payload: serde_json::Value) {
        let event = payload
            .get("event")
            .and_then(|e| e.as_str())
            .map(str::to_string);
        let _ = self.tx.send(PageEvent::Push(PushedEvent {
            event,
            payload,
            timestamp: Utc::now(),
        }));
    }
}

/// Static facts about the current document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInspection {
    pub tag_manager_present: bool,
    pub data_layer_present: bool,
    pub gtag_present: bool,
    pub script_sources: Vec<String>,
    pub inline_scripts: Vec<String>,
}

impl PageInspection {
    /// External script sources followed by inline script bodies.
    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        self.script_sources
            .iter()
            .chain(self.inline_scripts.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub user_agent: String,
}

/// Factory for isolated browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open a fresh, isolated session whose page events go to `bridge`.
    async fn launch(
        &self,
        options: LaunchOptions,
        bridge: EventBridge,
    ) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// A live browser context. Callers must [`close`](BrowserSession::close) it
/// on every exit path.
#[async_trait]
pub trait BrowserSession: Send {
    async fn goto(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Click the first element matching `target`. `Ok(false)` when none exists.
    async fn click(&mut self, target: ClickTarget, timeout: Duration)
        -> Result<bool, BrowserError>;

    async fn inspect(&mut self) -> Result<PageInspection, BrowserError>;

    /// Let in-flight page activity settle.
    async fn settle(&mut self, duration: Duration);

    fn current_url(&self) -> Option<String>;

    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}
