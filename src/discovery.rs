//! Discovery channel fanning resource kinds out to control loops.
//!
//! The channel is a broadcast: every subscriber sees every kind published
//! after it subscribed, so controllers sharing the channel never compete
//! for messages. Producing the notifications is up to the caller.

use crate::models::ResourceKind;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Default number of kinds buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// Largest accepted capacity. The channel allocates every slot up front.
pub const MAX_CAPACITY: usize = 65_536;

/// Checks a configured capacity against `1..=MAX_CAPACITY`.
pub fn validate_capacity(capacity: usize) -> Result<(), String> {
    if capacity == 0 {
        return Err("Discovery capacity must be at least 1".to_string());
    }
    if capacity > MAX_CAPACITY {
        return Err(format!(
            "Discovery capacity {} exceeds the maximum of {}",
            capacity, MAX_CAPACITY
        ));
    }
    Ok(())
}

/// Shared broadcast channel of newly observed resource kinds.
#[derive(Debug, Clone)]
pub struct DiscoveryChannel {
    sender: broadcast::Sender<ResourceKind>,
    capacity: usize,
}

impl Default for DiscoveryChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DiscoveryChannel {
    /// Create a channel buffering up to `capacity` kinds per subscriber.
    ///
    /// `capacity` is clamped to `1..=MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let clamped = capacity.clamp(1, MAX_CAPACITY);
        if clamped != capacity {
            warn!(requested = capacity, capacity = clamped, "discovery capacity clamped");
        }
        let capacity = clamped;
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Subscribe to kinds published from now on.
    pub fn subscribe(&self) -> DiscoverySubscription {
        DiscoverySubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish a newly observed kind. Returns the number of subscribers reached.
    ///
    /// Publishing without subscribers is not an error; the kind is dropped.
    pub fn publish(&self, kind: ResourceKind) -> usize {
        match self.sender.send(kind) {
            Ok(receivers) => {
                trace!(receivers, "published resource kind");
                receivers
            }
            Err(broadcast::error::SendError(kind)) => {
                debug!("No discovery subscribers, dropping {}", kind);
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Receiving side handed out by [`DiscoveryChannel::subscribe`].
#[derive(Debug)]
pub struct DiscoverySubscription {
    receiver: broadcast::Receiver<ResourceKind>,
}

impl DiscoverySubscription {
    /// Wait for the next kind. Returns `None` once every sender is gone.
    ///
    /// A subscriber that falls behind skips the kinds it missed.
    pub async fn next(&mut self) -> Option<ResourceKind> {
        loop {
            match self.receiver.recv().await {
                Ok(kind) => return Some(kind),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "discovery subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`next`](Self::next).
    pub fn try_next(&mut self) -> Option<ResourceKind> {
        loop {
            match self.receiver.try_recv() {
                Ok(kind) => return Some(kind),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "discovery subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> ResourceKind {
        ResourceKind::new("route.openshift.io", "v1", "Route")
    }

    #[test]
    fn test_publish_without_subscribers() {
        let channel = DiscoveryChannel::default();
        assert_eq!(channel.publish(route()), 0);
        assert_eq!(channel.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_capacity_is_clamped() {
        assert_eq!(DiscoveryChannel::new(0).capacity(), 1);
        assert_eq!(DiscoveryChannel::new(usize::MAX).capacity(), MAX_CAPACITY);
        assert_eq!(DiscoveryChannel::new(1 << 40).capacity(), MAX_CAPACITY);
        assert_eq!(DiscoveryChannel::new(MAX_CAPACITY).capacity(), MAX_CAPACITY);
    }

    #[test]
    fn test_validate_capacity() {
        assert!(validate_capacity(1).is_ok());
        assert!(validate_capacity(MAX_CAPACITY).is_ok());
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(MAX_CAPACITY + 1).is_err());
        assert!(validate_capacity(usize::MAX).is_err());
    }

    #[test]
    fn test_every_subscriber_sees_every_kind() {
        let channel = DiscoveryChannel::new(8);
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);

        assert_eq!(channel.publish(route()), 2);

        assert_eq!(first.try_next(), Some(route()));
        assert_eq!(second.try_next(), Some(route()));
        assert_eq!(first.try_next(), None);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_kinds() {
        let channel = DiscoveryChannel::new(8);
        let mut early = channel.subscribe();
        channel.publish(route());

        let mut late = channel.subscribe();
        assert_eq!(late.try_next(), None);
        assert_eq!(early.try_next(), Some(route()));
    }

    #[test]
    fn test_lagged_subscriber_keeps_newest() {
        let channel = DiscoveryChannel::new(2);
        let mut sub = channel.subscribe();
        for kind in ["A", "B", "C"] {
            channel.publish(ResourceKind::new("", "v1", kind));
        }

        assert_eq!(sub.try_next().map(|k| k.kind), Some("B".to_string()));
        assert_eq!(sub.try_next().map(|k| k.kind), Some("C".to_string()));
    }

    #[tokio::test]
    async fn test_next_returns_none_when_closed() {
        let channel = DiscoveryChannel::new(4);
        let mut sub = channel.subscribe();
        channel.publish(route());
        drop(channel);

        assert_eq!(sub.next().await, Some(route()));
        assert_eq!(sub.next().await, None);
    }
}
