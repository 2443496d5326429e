//! Deep-link dispatch.
//!
//! The dispatcher is mounted once near the application root. While mounted
//! it owns the live link subscription and hands every link to the resolution
//! pipeline before asking the navigator to open the resulting screen.
//!
//! ## States
//! - `Idle`: created, launch link not yet queried.
//! - `AwaitingInitialLink`: the process was launched from a link and the
//!   dispatcher is waiting for the navigation tree to mount.
//! - `Ready`: the launch link (if any) has been handled.
//!
//! Live links are handled as soon as they arrive in every state. Nothing that
//! goes wrong while handling a link escapes the dispatcher: unmatched links
//! are logged and dropped, navigation failures are logged and reported to
//! the user once, and the subscription stays alive.

use crate::config::DeeplinkConfig;
use crate::route::{resolve_for_scheme, ResolvedRoute};
use crate::source::{LinkSource, LinkSubscription, Navigator, Notifier};
use crate::{DeeplinkError, DeeplinkResult};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatcherState {
    Idle,
    AwaitingInitialLink,
    Ready,
}

/// What happened to one delivered link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Navigated(ResolvedRoute),
    /// No known screen matches the link.
    Unhandled,
    /// Navigation failed; the user has been told.
    Failed,
    /// The dispatcher was no longer mounted.
    Discarded,
}

/// Runs the pipeline for single links. Shared by the live loop and the
/// launch task.
struct LinkHandler {
    config: DeeplinkConfig,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    mounted: AtomicBool,
}

impl LinkHandler {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn handle_link(&self, raw: &str) -> LinkOutcome {
        if !self.is_mounted() {
            tracing::debug!("dispatcher unmounted, discarding deep link: {}", raw);
            return LinkOutcome::Discarded;
        }

        let resolution = resolve_for_scheme(raw, self.config.app_scheme());
        let Some(route) = resolution.route else {
            tracing::info!("ignoring deep link with no matching screen: {}", raw);
            return LinkOutcome::Unhandled;
        };

        match self.navigate(&route) {
            Ok(()) => {
                tracing::info!(
                    "opened {} deep link at {}",
                    resolution.intent,
                    route.target_path
                );
                LinkOutcome::Navigated(route)
            }
            Err(e) => {
                tracing::error!("deep link navigation error: {}", e);
                self.notify_failure();
                LinkOutcome::Failed
            }
        }
    }

    fn notify_failure(&self) {
        let shown = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.notifier
                .show_message(self.config.error_title(), self.config.error_message())
        }));
        if shown.is_err() {
            tracing::error!("notifier panicked while reporting a deep link failure");
        }
    }

    fn navigate(&self, route: &ResolvedRoute) -> DeeplinkResult<()> {
        match std::panic::catch_unwind(AssertUnwindSafe(|| self.navigator.navigate(route))) {
            Ok(result) => result,
            Err(_) => Err(DeeplinkError::NavigationPanicked {
                path: route.target_path.clone(),
            }),
        }
    }
}

/// An unmounted dispatcher.
pub struct Dispatcher<S: LinkSource> {
    config: DeeplinkConfig,
    source: Arc<S>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    ready_signal: Option<watch::Receiver<bool>>,
}

impl<S: LinkSource> Dispatcher<S> {
    pub fn new(
        config: DeeplinkConfig,
        source: Arc<S>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            source,
            navigator,
            notifier,
            ready_signal: None,
        }
    }

    /// Wait for the router to report `true` on `ready` before opening the
    /// launch link, instead of always waiting the full launch delay. The
    /// launch delay still bounds the wait.
    pub fn with_ready_signal(mut self, ready: watch::Receiver<bool>) -> Self {
        self.ready_signal = Some(ready);
        self
    }

    /// Subscribe to live links and start handling the launch link.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(self) -> MountedDispatcher {
        let handler = Arc::new(LinkHandler {
            config: self.config,
            navigator: self.navigator,
            notifier: self.notifier,
            mounted: AtomicBool::new(true),
        });
        let (state_tx, state_rx) = watch::channel(DispatcherState::Idle);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let subscription = self.source.subscribe();
        tracing::info!("++ deep link dispatcher mounted");

        let live = tokio::spawn(run_live_links(handler.clone(), subscription, shutdown_rx));
        let launch = tokio::spawn(run_launch_link(
            handler.clone(),
            self.source,
            state_tx,
            self.ready_signal,
        ));

        MountedDispatcher {
            handler,
            state: state_rx,
            shutdown: Some(shutdown_tx),
            live: Some(live),
            launch: Some(launch),
        }
    }
}

async fn run_live_links(
    handler: Arc<LinkHandler>,
    mut subscription: LinkSubscription,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            next = subscription.recv() => match next {
                Some(url) => {
                    handler.handle_link(&url);
                }
                None => {
                    tracing::info!("link source closed; live links no longer handled");
                    break;
                }
            },
        }
    }

    subscription.unsubscribe();
    tracing::debug!("deep link subscription released");
}

async fn run_launch_link<S: LinkSource>(
    handler: Arc<LinkHandler>,
    source: Arc<S>,
    state: watch::Sender<DispatcherState>,
    ready_signal: Option<watch::Receiver<bool>>,
) {
    let launch_url = source
        .initial_url()
        .await
        .filter(|url| !url.trim().is_empty());

    let Some(url) = launch_url else {
        tracing::debug!("app was not launched from a deep link");
        state.send_replace(DispatcherState::Ready);
        return;
    };

    tracing::info!("app launched from deep link: {}", url);
    state.send_replace(DispatcherState::AwaitingInitialLink);

    wait_for_navigation(handler.config.launch_delay(), ready_signal).await;

    if !handler.is_mounted() {
        tracing::info!("dispatcher unmounted before launch link could be opened");
        return;
    }

    handler.handle_link(&url);
    state.send_replace(DispatcherState::Ready);
}

/// Wait for the navigation tree to mount: until the ready signal reports
/// `true` when one is given, otherwise for the whole delay.
async fn wait_for_navigation(delay: Duration, ready_signal: Option<watch::Receiver<bool>>) {
    let Some(mut ready) = ready_signal else {
        tokio::time::sleep(delay).await;
        return;
    };

    let waited = tokio::time::timeout(delay, ready.wait_for(|ready| *ready))
        .await
        .map(|signal| signal.is_ok());

    match waited {
        Ok(true) => tracing::debug!("navigation tree reported ready"),
        Ok(false) => tracing::warn!("navigation ready signal dropped; opening launch link"),
        Err(_) => tracing::warn!(
            "navigation tree not ready after {} ms; opening launch link anyway",
            delay.as_millis()
        ),
    }
}

/// A mounted dispatcher. Unmount it (or drop it) when the UI tree is torn
/// down; either releases the link subscription.
pub struct MountedDispatcher {
    handler: Arc<LinkHandler>,
    state: watch::Receiver<DispatcherState>,
    shutdown: Option<oneshot::Sender<()>>,
    live: Option<JoinHandle<()>>,
    launch: Option<JoinHandle<()>>,
}

impl MountedDispatcher {
    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<DispatcherState> {
        self.state.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.handler.is_mounted()
    }

    /// Run a link through the pipeline directly, bypassing the link source.
    pub fn handle_link(&self, raw: &str) -> LinkOutcome {
        self.handler.handle_link(raw)
    }

    /// Wait until the link source closes and every link it queued has been
    /// handled. Returns immediately if the live task has already been joined.
    pub async fn wait_for_source_closed(&mut self) {
        if let Some(live) = self.live.take() {
            if let Err(e) = live.await {
                tracing::warn!("live link task ended abnormally: {}", e);
            }
        }
    }

    /// Stop handling links and wait for the background tasks to finish.
    pub async fn unmount(mut self) {
        self.release();

        if let Some(live) = self.live.take() {
            if let Err(e) = live.await {
                tracing::warn!("live link task ended abnormally: {}", e);
            }
        }
        if let Some(launch) = self.launch.take() {
            // Cancelled while waiting for the navigation tree is the expected case.
            let _ = launch.await;
        }

        tracing::info!("-- deep link dispatcher unmounted");
    }

    fn release(&mut self) {
        self.handler.mounted.store(false, Ordering::SeqCst);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(launch) = &self.launch {
            launch.abort();
        }
    }
}

impl Drop for MountedDispatcher {
    fn drop(&mut self) {
        self.release();
        if let Some(live) = &self.live {
            live.abort();
        }
    }
}
