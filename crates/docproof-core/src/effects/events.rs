//! Account and network change notifications
//!
//! Wallets announce account and chain changes asynchronously. Instead of
//! hooking those into workflow state, handlers publish them on a broadcast
//! channel and interested callers subscribe. Workflows never read from it.

use crate::types::{Address, ChainId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default buffered events per subscriber before lagging
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Change reported by a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionEvent {
    /// Exposed accounts changed; empty means the user disconnected all
    AccountsChanged(Vec<Address>),
    /// Active chain changed
    ChainChanged(ChainId),
    /// Connection dropped
    Disconnected {
        /// Reason, when known
        reason: String,
    },
}

/// Publisher side of the notification channel, owned by a handler
#[derive(Debug, Clone)]
pub struct ConnectionEventBus {
    sender: broadcast::Sender<ConnectionEvent>,
}

impl ConnectionEventBus {
    /// Create a bus buffering `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event, returning how many subscribers received it
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ConnectionEvent) -> usize {
        tracing::debug!(?event, "connection event");
        self.sender.send(event).unwrap_or(0)
    }

    /// New receiver that observes events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.sender.subscribe()
    }

    /// Current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ConnectionEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
