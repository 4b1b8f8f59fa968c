//! Signal audit engine.
//!
//! Runs one synthetic shopping journey against a target store through a
//! [`BrowserDriver`] and scores which revenue signals fired. Every page-side
//! event-queue push and every outgoing request reaches the engine over the
//! session's [`EventBridge`]; the engine only reads the receiving half.
//!
//! Journey stages, in order:
//! 1. homepage load and tracking-infrastructure inspection
//! 2. first product link (`view_item`)
//! 3. add-to-cart submit (`add_to_cart`)
//! 4. `/cart` navigation (`view_cart`)
//! 5. `/checkout` navigation (`begin_checkout`)
//! 6. static purchase-infrastructure check (`purchase`)
//!
//! A failing stage leaves its signal `false`, records a failure entry and
//! lets the remaining stages run. Only cancellation and a failed launch
//! abort the whole audit.

use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::{validate_target_url, DomainError};
use crate::domain::models::{
    AuditConfig, AuditResult, ClientRevenueData, EcommerceJourney, EcommerceSignal,
    InfrastructureGap, NetworkCapture, RevenueLeakage, ScoringConfig, SignalFailure, SignalType,
    TrackingPlatform,
};
use crate::domain::ports::{
    BrowserDriver, BrowserError, BrowserSession, ClickTarget, EventBridge, LaunchOptions,
    PageEvent, PageInspection, PushedEvent, WaitUntil,
};
use crate::services::revenue_impact::{ad_platform_impact, estimate_leakage};

/// URL fragments of revenue-critical tracking endpoints.
pub const TRACKING_ENDPOINTS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "facebook.com/tr",
    "analytics.tiktok.com",
    "snapchat.com/px",
    "pinterest.com/ct",
];

/// Inline-script markers that indicate purchase tracking exists.
const PURCHASE_MARKERS: &[&str] = &["purchase", "transaction_id", "order_number"];

static LEGACY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"UA-\d{4,}-\d+|google-analytics\.com/analytics\.js").expect("valid pattern")
});

static ANALYTICS_PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bG-[A-Z0-9]{6,}\b").expect("valid pattern"));

/// Note attached to the leakage of an audit that never completed.
pub const AUDIT_INCOMPLETE_NOTE: &str = "Audit did not complete - impact not calculated";

/// Errors that abort a whole audit.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    InvalidTarget(#[from] DomainError),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("Audit cancelled")]
    Cancelled,
}

/// Host-side view of everything a session reported over its bridge.
struct JourneyRecorder {
    rx: UnboundedReceiver<PageEvent>,
    tracked_ids: Vec<String>,
    pushes: Vec<PushedEvent>,
    captures: Vec<NetworkCapture>,
    journey: EcommerceJourney,
    failures: Vec<SignalFailure>,
}

impl JourneyRecorder {
    fn new(rx: UnboundedReceiver<PageEvent>, tracked_ids: &[String]) -> Self {
        Self {
            rx,
            tracked_ids: tracked_ids.to_vec(),
            pushes: Vec::new(),
            captures: Vec::new(),
            journey: EcommerceJourney::default(),
            failures: Vec::new(),
        }
    }

    fn is_tracked(&self, url: &str) -> bool {
        TRACKING_ENDPOINTS.iter().any(|e| url.contains(e))
            || self.tracked_ids.iter().any(|id| url.contains(id.as_str()))
    }

    /// Pull every event the page has sent so far.
    fn drain(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                PageEvent::Request(request) => {
                    if self.is_tracked(&request.url) {
                        debug!(url = %request.url, "captured tracking request");
                        self.captures.push(NetworkCapture {
                            platform: TrackingPlatform::categorize(&request.url),
                            signal_type: SignalType::extract(&request.url),
                            url: request.url,
                            method: request.method,
                            timestamp: request.timestamp,
                        });
                    }
                }
                PageEvent::Push(push) => {
                    debug!(event = ?push.event, "captured event-queue push");
                    self.pushes.push(push);
                }
            }
        }
    }

    fn signal_fired(&mut self, signal: EcommerceSignal) -> bool {
        self.drain();
        self.pushes
            .iter()
            .any(|p| p.event.as_deref() == Some(signal.event_name()))
    }

    /// Record whether `signal` fired; a silent signal appends `missing`.
    fn observe(&mut self, signal: EcommerceSignal, missing: SignalFailure) {
        let fired = self.signal_fired(signal);
        self.journey.set(signal, fired);
        if fired {
            debug!(signal = %signal, "signal fired");
        } else {
            debug!(signal = %signal, "signal missing");
            self.failures.push(missing.for_signal(signal));
        }
    }

    fn fail(&mut self, failure: SignalFailure) {
        warn!(
            title = %failure.title,
            severity = failure.severity.as_str(),
            monthly_loss = failure.monthly_loss,
            "signal failure recorded"
        );
        self.failures.push(failure);
    }
}

/// Drives the synthetic journey and scores signal health.
pub struct SignalAuditEngine {
    driver: Arc<dyn BrowserDriver>,
    config: AuditConfig,
    scoring: ScoringConfig,
}

impl SignalAuditEngine {
    pub fn new(driver: Arc<dyn BrowserDriver>, config: AuditConfig, scoring: ScoringConfig) -> Self {
        Self {
            driver,
            config,
            scoring,
        }
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Run the audit, surfacing whole-audit failures as errors.
    ///
    /// The browser session is closed on every path once it was opened.
    #[instrument(skip(self, client, cancel), fields(driver = self.driver.name()))]
    pub async fn perform_audit(
        &self,
        url: &str,
        client: &ClientRevenueData,
        cancel: &CancellationToken,
    ) -> Result<AuditResult, AuditError> {
        let started_at = Utc::now();
        validate_target_url(url)?;
        if cancel.is_cancelled() {
            return Err(AuditError::Cancelled);
        }

        info!(url, "starting signal audit");

        let (bridge, rx) = EventBridge::channel();
        let options = LaunchOptions {
            headless: self.config.headless,
            user_agent: self.config.user_agent.clone(),
        };
        let mut session = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AuditError::Cancelled),
            launched = self.driver.launch(options, bridge) => launched?,
        };

        let mut recorder = JourneyRecorder::new(rx, &self.config.tracked_ids);
        let outcome = self
            .run_journey(session.as_mut(), url, &mut recorder, cancel)
            .await;

        if let Err(e) = session.close().await {
            warn!(url, error = %e, "failed to close browser session");
        }
        outcome?;

        recorder.drain();
        let result = self.score(url, client, recorder, started_at);
        info!(
            url,
            signal_health = result.signal_health,
            monthly_loss = result.revenue_leakage.monthly_loss,
            failures = result.signal_failures.len(),
            captures = result.network_capture.len(),
            "signal audit complete"
        );
        Ok(result)
    }

    /// Best-effort audit: whole-audit failures become a degraded result.
    pub async fn audit(
        &self,
        url: &str,
        client: &ClientRevenueData,
        cancel: &CancellationToken,
    ) -> AuditResult {
        match self.perform_audit(url, client, cancel).await {
            Ok(result) => result,
            Err(e) => self.degraded(url, &e),
        }
    }

    /// Degraded result carrying a single `system_failure` entry.
    pub fn degraded(&self, url: &str, err: &AuditError) -> AuditResult {
        error!(url, error = %err, "audit engine failure");
        AuditResult::degraded(
            url,
            err.to_string(),
            RevenueLeakage::zero(0.0, AUDIT_INCOMPLETE_NOTE),
            Utc::now(),
        )
    }

    async fn run_journey(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        recorder: &mut JourneyRecorder,
        cancel: &CancellationToken,
    ) -> Result<(), AuditError> {
        let base = url.trim_end_matches('/');
        self.homepage_stage(session, url, recorder, cancel).await?;
        self.product_view_stage(session, recorder, cancel).await?;
        self.add_to_cart_stage(session, recorder, cancel).await?;
        self.cart_stage(session, &format!("{base}/cart"), recorder, cancel)
            .await?;
        self.checkout_stage(session, &format!("{base}/checkout"), recorder, cancel)
            .await?;
        self.purchase_stage(session, recorder, cancel).await
    }

    async fn homepage_stage(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        recorder: &mut JourneyRecorder,
        cancel: &CancellationToken,
    ) -> Result<(), AuditError> {
        debug!(url, "stage: homepage");
        let losses = &self.scoring.loss_estimates;
        let timeout = Duration::from_millis(self.config.navigation_timeout_ms);

        let loaded = guarded(
            cancel,
            timeout,
            url,
            session.goto(url, WaitUntil::NetworkIdle, timeout),
        )
        .await;
        if let Some(e) = stage_error(loaded)? {
            recorder.fail(SignalFailure::revenue_signal(
                "Product Discovery Failed",
                e.to_string(),
                losses.product_discovery,
            ));
            return Ok(());
        }
        settle(session, self.config.homepage_settle_ms, cancel).await?;

        let inspected = guarded(cancel, timeout, url, session.inspect()).await;
        match inspected {
            Ok(page) => self.check_infrastructure(&page, recorder),
            Err(AuditError::Browser(e)) => {
                warn!(url, error = %e, "tracking infrastructure inspection failed");
            }
            Err(other) => return Err(other),
        }
        recorder.drain();
        Ok(())
    }

    fn check_infrastructure(&self, page: &PageInspection, recorder: &mut JourneyRecorder) {
        let losses = &self.scoring.loss_estimates;
        debug!(
            tag_manager = page.tag_manager_present,
            gtag = page.gtag_present,
            data_layer = page.data_layer_present,
            "tracking infrastructure"
        );

        if !page.tag_manager_present && !page.gtag_present {
            let mut failure = SignalFailure::infrastructure(
                InfrastructureGap::NoTracking,
                "Revenue Tracking Infrastructure Missing",
                "No Google tracking detected",
                losses.tracking_missing,
            );
            failure.revenue_impact =
                Some("Complete signal loss - 100% revenue blind spot".to_string());
            recorder.fail(failure);
            return;
        }

        if page.scripts().any(|s| LEGACY_TAG.is_match(s)) {
            recorder.fail(SignalFailure::infrastructure(
                InfrastructureGap::LegacyAnalyticsTag,
                "Deprecated Universal Analytics Tag",
                "Universal Analytics stopped processing data; events are not reaching GA4",
                losses.legacy_analytics,
            ));
        }

        if page.gtag_present && !page.tag_manager_present {
            recorder.fail(SignalFailure::infrastructure(
                InfrastructureGap::MissingTagManager,
                "No GTM Container Detected",
                "gtag is installed without a tag manager container; e-commerce events cannot be managed centrally",
                losses.missing_tag_manager,
            ));
        }

        let analytics_seen = page.scripts().any(|s| ANALYTICS_PROPERTY.is_match(s))
            || recorder
                .captures
                .iter()
                .any(|c| c.platform == TrackingPlatform::GoogleAnalytics);
        if page.tag_manager_present && !page.gtag_present && !analytics_seen {
            recorder.fail(SignalFailure::infrastructure(
                InfrastructureGap::MissingAnalyticsProperty,
                "No GA4 Property Detected",
                "Tag manager loads but no GA4 measurement ID or collect request was observed",
                losses.missing_analytics_property,
            ));
        }
    }

    async fn product_view_stage(
        &self,
        session: &mut dyn BrowserSession,
        recorder: &mut JourneyRecorder,
        cancel: &CancellationToken,
    ) -> Result<(), AuditError> {
        debug!("stage: product view");
        let losses = &self.scoring.loss_estimates;
        let timeout = Duration::from_millis(self.config.stage_timeout_ms);
        let here = session.current_url().unwrap_or_default();

        let clicked = guarded(
            cancel,
            timeout,
            &here,
            session.click(ClickTarget::ProductLink, timeout),
        )
        .await;
        match clicked {
            Ok(true) => {
                settle(session, self.config.settle_ms, cancel).await?;
                recorder.observe(
                    EcommerceSignal::ViewItem,
                    SignalFailure::revenue_signal(
                        "Product View Signal Missing",
                        "view_item event not firing - Meta/Google lose product interest data",
                        losses.view_item,
                    ),
                );
            }
            Ok(false) => recorder.fail(SignalFailure::revenue_signal(
                "Product Pages Inaccessible",
                "Cannot test product view signals",
                losses.product_pages_inaccessible,
            )),
            Err(AuditError::Browser(e)) => recorder.fail(
                SignalFailure::revenue_signal(
                    "Product View Signal Test Failed",
                    e.to_string(),
                    losses.view_item,
                )
                .for_signal(EcommerceSignal::ViewItem),
            ),
            Err(other) => return Err(other),
        }
        Ok(())
    }

    async fn add_to_cart_stage(
        &self,
        session: &mut dyn BrowserSession,
        recorder: &mut JourneyRecorder,
        cancel: &CancellationToken,
    ) -> Result<(), AuditError> {
        debug!("stage: add to cart");
        let losses = &self.scoring.loss_estimates;
        let timeout = Duration::from_millis(self.config.stage_timeout_ms);
        let here = session.current_url().unwrap_or_default();

        let clicked = guarded(
            cancel,
            timeout,
            &here,
            session.click(ClickTarget::AddToCart, timeout),
        )
        .await;
        match clicked {
            Ok(true) => {
                settle(session, self.config.homepage_settle_ms, cancel).await?;
                recorder.observe(
                    EcommerceSignal::AddToCart,
                    SignalFailure::revenue_signal(
                        "Add to Cart Signal Missing",
                        "add_to_cart event not firing - Algorithm cannot optimize for cart additions",
                        losses.add_to_cart,
                    ),
                );
            }
            Ok(false) => recorder.fail(
                SignalFailure::revenue_signal(
                    "Add to Cart Control Not Found",
                    "No add-to-cart button or form on the product page",
                    losses.add_to_cart_control_missing,
                )
                .for_signal(EcommerceSignal::AddToCart),
            ),
            Err(AuditError::Browser(e)) => recorder.fail(
                SignalFailure::revenue_signal(
                    "Add to Cart Signal Test Failed",
                    e.to_string(),
                    losses.add_to_cart,
                )
                .for_signal(EcommerceSignal::AddToCart),
            ),
            Err(other) => return Err(other),
        }
        Ok(())
    }

    async fn cart_stage(
        &self,
        session: &mut dyn BrowserSession,
        cart_url: &str,
        recorder: &mut JourneyRecorder,
        cancel: &CancellationToken,
    ) -> Result<(), AuditError> {
        debug!(url = cart_url, "stage: cart view");
        let loss = self.scoring.loss_estimates.view_cart;
        let missing = SignalFailure::revenue_signal(
            "Cart View Signal Missing",
            "view_cart event not firing - Lost cart abandonment optimization",
            loss,
        );
        self.navigation_stage(
            session,
            cart_url,
            EcommerceSignal::ViewCart,
            missing,
            "Cart View Signal Test Failed",
            loss,
            recorder,
            cancel,
        )
        .await
    }

    async fn checkout_stage(
        &self,
        session: &mut dyn BrowserSession,
        checkout_url: &str,
        recorder: &mut JourneyRecorder,
        cancel: &CancellationToken,
    ) -> Result<(), AuditError> {
        debug!(url = checkout_url, "stage: checkout initiation");
        let loss = self.scoring.loss_estimates.begin_checkout;
        let missing = SignalFailure::revenue_signal(
            "Checkout Initiation Signal Missing",
            "begin_checkout event not firing - Cannot optimize checkout flow",
            loss,
        );
        self.navigation_stage(
            session,
            checkout_url,
            EcommerceSignal::BeginCheckout,
            missing,
            "Checkout Initiation Signal Test Failed",
            loss,
            recorder,
            cancel,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn navigation_stage(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        signal: EcommerceSignal,
        missing: SignalFailure,
        failed_title: &str,
        loss: u64,
        recorder: &mut JourneyRecorder,
        cancel: &CancellationToken,
    ) -> Result<(), AuditError> {
        let timeout = Duration::from_millis(self.config.stage_timeout_ms);
        let loaded = guarded(
            cancel,
            timeout,
            url,
            session.goto(url, WaitUntil::DomContentLoaded, timeout),
        )
        .await;
        if let Some(e) = stage_error(loaded)? {
            recorder.fail(
                SignalFailure::revenue_signal(failed_title, e.to_string(), loss).for_signal(signal),
            );
            return Ok(());
        }
        settle(session, self.config.settle_ms, cancel).await?;
        recorder.observe(signal, missing);
        Ok(())
    }

    async fn purchase_stage(
        &self,
        session: &mut dyn BrowserSession,
        recorder: &mut JourneyRecorder,
        cancel: &CancellationToken,
    ) -> Result<(), AuditError> {
        debug!("stage: purchase infrastructure");
        let loss = self.scoring.loss_estimates.purchase;
        let timeout = Duration::from_millis(self.config.stage_timeout_ms);
        let here = session.current_url().unwrap_or_default();

        match guarded(cancel, timeout, &here, session.inspect()).await {
            Ok(page) => {
                let has_order_tracking = page
                    .inline_scripts
                    .iter()
                    .any(|s| PURCHASE_MARKERS.iter().any(|m| s.contains(m)));
                recorder.journey.purchase = has_order_tracking;
                if !has_order_tracking {
                    recorder.fail(
                        SignalFailure::revenue_signal(
                            "Purchase Signal Infrastructure Missing",
                            "No purchase tracking detected - Complete conversion blindness",
                            loss,
                        )
                        .for_signal(EcommerceSignal::Purchase),
                    );
                }
            }
            Err(AuditError::Browser(e)) => recorder.fail(
                SignalFailure::revenue_signal("Purchase Signal Test Failed", e.to_string(), loss)
                    .for_signal(EcommerceSignal::Purchase),
            ),
            Err(other) => return Err(other),
        }
        Ok(())
    }

    fn score(
        &self,
        url: &str,
        client: &ClientRevenueData,
        recorder: JourneyRecorder,
        started_at: DateTime<Utc>,
    ) -> AuditResult {
        let signal_health = recorder.journey.signal_health();
        let revenue_leakage = estimate_leakage(signal_health, client, &self.scoring);
        let impact = ad_platform_impact(signal_health, &recorder.captures);
        debug!(
            meta_capi_health = impact.meta_capi_health,
            google_ads_health = impact.google_ads_health,
            attribution_accuracy = impact.attribution_accuracy,
            "ad platform impact"
        );

        AuditResult {
            timestamp: started_at,
            target_url: url.to_string(),
            signal_health,
            revenue_leakage,
            signal_failures: recorder.failures,
            ecommerce_journey: recorder.journey,
            network_capture: recorder.captures,
            ad_platform_impact: Some(impact),
            from_cache: false,
            setup: None,
        }
    }
}

/// Run a driver call under a timeout, giving up early on cancellation.
async fn guarded<T>(
    cancel: &CancellationToken,
    limit: Duration,
    url: &str,
    op: impl Future<Output = Result<T, BrowserError>>,
) -> Result<T, AuditError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AuditError::Cancelled),
        outcome = tokio::time::timeout(limit, op) => match outcome {
            Ok(result) => result.map_err(AuditError::Browser),
            Err(_) => Err(AuditError::Browser(BrowserError::Timeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })),
        },
    }
}

/// Split a stage outcome into a recoverable browser error or a hard stop.
fn stage_error(outcome: Result<(), AuditError>) -> Result<Option<BrowserError>, AuditError> {
    match outcome {
        Ok(()) => Ok(None),
        Err(AuditError::Browser(e)) => Ok(Some(e)),
        Err(other) => Err(other),
    }
}

async fn settle(
    session: &mut dyn BrowserSession,
    millis: u64,
    cancel: &CancellationToken,
) -> Result<(), AuditError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AuditError::Cancelled),
        () = session.settle(Duration::from_millis(millis)) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::browser::{PageScript, ScriptedBrowserDriver};

    fn engine(driver: ScriptedBrowserDriver) -> SignalAuditEngine {
        SignalAuditEngine::new(
            Arc::new(driver),
            AuditConfig::default(),
            ScoringConfig::default(),
        )
    }

    fn tracked_homepage() -> PageScript {
        PageScript::new()
            .with_tag_manager()
            .with_inline_script("gtag('config', 'G-ABC1234XYZ');")
            .with_request("https://www.googletagmanager.com/gtm.js?id=GTM-TEST123")
            .with_product_link("/products/widget")
    }

    #[tokio::test]
    async fn test_full_journey_scores_100() {
        let driver = ScriptedBrowserDriver::new()
            .page("/", tracked_homepage())
            .page(
                "/products/widget",
                PageScript::new()
                    .with_tag_manager()
                    .with_push("view_item")
                    .with_add_to_cart("add_to_cart"),
            )
            .page("/cart", PageScript::new().with_tag_manager().with_push("view_cart"))
            .page(
                "/checkout",
                PageScript::new()
                    .with_tag_manager()
                    .with_push("begin_checkout")
                    .with_inline_script("dataLayer.push({event: 'purchase', transaction_id: t});"),
            );
        let probe = driver.probe();

        let result = engine(driver)
            .perform_audit(
                "https://shop.example.com",
                &ClientRevenueData::new(Some(50_000.0), None),
                &CancellationToken::new(),
            )
            .await
            .expect("audit runs");

        assert_eq!(result.ecommerce_journey, EcommerceJourney::complete());
        assert_eq!(result.signal_health, 100);
        assert!(result.signal_failures.is_empty(), "{:?}", result.signal_failures);
        assert_eq!(result.revenue_leakage.monthly_loss, 600);
        assert!(result
            .network_capture
            .iter()
            .any(|c| c.signal_type == SignalType::GtmLoad));
        assert_eq!(probe.launches(), 1);
        assert_eq!(probe.closes(), 1);
    }

    #[tokio::test]
    async fn test_stage_failures_do_not_abort_journey() {
        // No product link, cart page loads silently, checkout is unreachable.
        let driver = ScriptedBrowserDriver::new()
            .page("/", PageScript::new().with_tag_manager().with_inline_script("G-ABC1234XYZ"))
            .page("/cart", PageScript::new().with_push("view_cart"))
            .failing_page("/checkout", "403 Forbidden");

        let result = engine(driver)
            .perform_audit(
                "https://shop.example.com/",
                &ClientRevenueData::default(),
                &CancellationToken::new(),
            )
            .await
            .expect("audit runs");

        let journey = result.ecommerce_journey;
        assert!(!journey.product_view);
        assert!(!journey.add_to_cart);
        assert!(journey.view_cart);
        assert!(!journey.begin_checkout);
        assert!(!journey.purchase);
        assert_eq!(result.signal_health, 20);

        let titles: Vec<&str> = result.signal_failures.iter().map(|f| f.title.as_str()).collect();
        assert!(titles.contains(&"Product Pages Inaccessible"));
        assert!(titles.contains(&"Add to Cart Control Not Found"));
        assert!(titles.contains(&"Checkout Initiation Signal Test Failed"));
        assert!(titles.contains(&"Purchase Signal Infrastructure Missing"));
        assert_eq!(result.revenue_leakage.monthly_loss, 0);
    }

    #[tokio::test]
    async fn test_missing_infrastructure_is_critical() {
        let driver = ScriptedBrowserDriver::new().page("/", PageScript::new());
        let result = engine(driver)
            .perform_audit(
                "https://bare.example.com",
                &ClientRevenueData::default(),
                &CancellationToken::new(),
            )
            .await
            .expect("audit runs");

        let infra = result
            .signal_failures
            .iter()
            .find(|f| f.infrastructure == Some(InfrastructureGap::NoTracking))
            .expect("infrastructure failure");
        assert_eq!(infra.monthly_loss, 200_000);
        assert_eq!(infra.severity, crate::domain::models::Severity::Critical);
    }

    #[tokio::test]
    async fn test_legacy_and_missing_tag_manager_detected() {
        let driver = ScriptedBrowserDriver::new().page(
            "/",
            PageScript::new()
                .with_gtag()
                .with_script_src("https://www.google-analytics.com/analytics.js"),
        );
        let result = engine(driver)
            .perform_audit(
                "https://legacy.example.com",
                &ClientRevenueData::default(),
                &CancellationToken::new(),
            )
            .await
            .expect("audit runs");

        let gaps: Vec<_> = result
            .signal_failures
            .iter()
            .filter_map(|f| f.infrastructure)
            .collect();
        assert!(gaps.contains(&InfrastructureGap::LegacyAnalyticsTag));
        assert!(gaps.contains(&InfrastructureGap::MissingTagManager));
    }

    #[tokio::test]
    async fn test_launch_failure_yields_degraded_result() {
        let engine = engine(ScriptedBrowserDriver::unreachable("connection refused"));
        let result = engine
            .audit(
                "https://down.example.com",
                &ClientRevenueData::new(Some(10_000.0), None),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.signal_health, 0);
        assert_eq!(result.signal_failures.len(), 1);
        assert!(result.is_system_failure());
        assert_eq!(result.revenue_leakage.monthly_loss, 0);
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_launch() {
        let driver = ScriptedBrowserDriver::new();
        let probe = driver.probe();
        let err = engine(driver)
            .perform_audit("ftp://nope", &ClientRevenueData::default(), &CancellationToken::new())
            .await
            .expect_err("invalid url");
        assert!(matches!(err, AuditError::InvalidTarget(_)));
        assert_eq!(probe.launches(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_audit_still_closes_session() {
        let cancel = CancellationToken::new();
        let driver = ScriptedBrowserDriver::new()
            .page("/", tracked_homepage())
            .cancel_on_visit("/products/widget", cancel.clone());
        let probe = driver.probe();

        let err = engine(driver)
            .perform_audit("https://shop.example.com", &ClientRevenueData::default(), &cancel)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, AuditError::Cancelled));
        assert_eq!(probe.launches(), 1);
        assert_eq!(probe.closes(), 1);
    }
}
