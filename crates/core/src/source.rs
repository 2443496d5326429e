//! Collaborators of the dispatcher.
//!
//! The host runtime supplies links through a [`LinkSource`], performs
//! navigation through a [`Navigator`] and shows messages through a
//! [`Notifier`]. [`ChannelLinkSource`] is an in-process link source for hosts
//! that receive links over their own transport (stdin, IPC, tests).

use crate::route::ResolvedRoute;
use crate::DeeplinkResult;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Where deep links come from.
pub trait LinkSource: Send + Sync + 'static {
    /// The link that launched the process, if any.
    fn initial_url(&self) -> impl Future<Output = Option<String>> + Send;

    /// Start listening for links received while the process runs.
    fn subscribe(&self) -> LinkSubscription;
}

/// Opens screens. Fire-and-forget: the dispatcher only looks at failures.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: &ResolvedRoute) -> DeeplinkResult<()>;
}

/// Shows a blocking message to the user.
pub trait Notifier: Send + Sync + 'static {
    fn show_message(&self, title: &str, body: &str);
}

/// A live listener registration. Dropping it unsubscribes.
#[derive(Debug)]
pub struct LinkSubscription {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl LinkSubscription {
    /// Create a subscription and the sender a source uses to feed it.
    pub fn channel() -> (mpsc::UnboundedSender<String>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// Wait for the next link. `None` once the source has gone away.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Stop receiving links. Links already queued are discarded.
    pub fn unsubscribe(mut self) {
        self.receiver.close();
    }
}

/// Link source backed by in-process channels.
#[derive(Debug, Default)]
pub struct ChannelLinkSource {
    launch_url: Option<String>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<String>>>,
}

impl ChannelLinkSource {
    pub fn new(launch_url: Option<String>) -> Self {
        Self {
            launch_url: launch_url.filter(|url| !url.trim().is_empty()),
            listeners: Mutex::default(),
        }
    }

    /// Deliver a link to every live listener and return how many received it.
    pub fn deliver(&self, url: impl Into<String>) -> usize {
        let url = url.into();
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|listener| listener.send(url.clone()).is_ok());
        listeners.len()
    }

    /// Drop every listener. Subscribers still receive links already queued,
    /// then see the source as closed.
    pub fn close(&self) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of listeners that have not unsubscribed.
    pub fn listener_count(&self) -> usize {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|listener| !listener.is_closed());
        listeners.len()
    }
}

impl LinkSource for ChannelLinkSource {
    fn initial_url(&self) -> impl Future<Output = Option<String>> + Send {
        let url = self.launch_url.clone();
        async move { url }
    }

    fn subscribe(&self) -> LinkSubscription {
        let (sender, subscription) = LinkSubscription::channel();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_every_listener() {
        let source = ChannelLinkSource::new(None);
        let mut first = source.subscribe();
        let mut second = source.subscribe();

        assert_eq!(source.deliver("schoolmedical://vaccine-registration"), 2);
        assert_eq!(
            first.recv().await.as_deref(),
            Some("schoolmedical://vaccine-registration")
        );
        assert_eq!(
            second.recv().await.as_deref(),
            Some("schoolmedical://vaccine-registration")
        );
    }

    #[tokio::test]
    async fn unsubscribed_listeners_are_pruned() {
        let source = ChannelLinkSource::new(None);
        let kept = source.subscribe();
        let dropped = source.subscribe();
        assert_eq!(source.listener_count(), 2);

        dropped.unsubscribe();
        assert_eq!(source.listener_count(), 1);
        assert_eq!(source.deliver("https://domain.com/vaccine-registration"), 1);

        drop(kept);
        assert_eq!(source.deliver("https://domain.com/vaccine-registration"), 0);
    }

    #[tokio::test]
    async fn close_drains_queued_links_then_ends() {
        let source = ChannelLinkSource::new(None);
        let mut subscription = source.subscribe();
        source.deliver("schoolmedical://vaccine-registration");
        source.close();

        assert_eq!(source.listener_count(), 0);
        assert!(subscription.recv().await.is_some());
        assert_eq!(subscription.recv().await, None);
    }

    #[tokio::test]
    async fn blank_launch_url_counts_as_none() {
        assert_eq!(ChannelLinkSource::new(Some("  ".into())).initial_url().await, None);
        assert_eq!(
            ChannelLinkSource::new(Some("schoolmedical://x".into()))
                .initial_url()
                .await
                .as_deref(),
            Some("schoolmedical://x")
        );
    }
}
