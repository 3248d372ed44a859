//! Lifecycle event bus.
//!
//! A tokio broadcast channel. Publishing never blocks; subscribers that fall
//! more than `capacity` events behind observe a lag instead of the missed
//! events.

use crate::LifecycleEvent;
use tenantry_core::TenantryConfig;
use tokio::sync::broadcast;
use tracing::debug;

/// Shared handle for publishing and subscribing to lifecycle events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Create a bus sized from configuration.
    pub fn from_config(config: &TenantryConfig) -> Self {
        Self::new(config.event_bus_capacity)
    }

    /// Publish an event to every current subscriber.
    ///
    /// Returns the number of subscribers that received it. Having none is
    /// not an error.
    pub fn publish(&self, event: LifecycleEvent) -> usize {
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(event_type, receivers, "Published lifecycle event");
                receivers
            }
            Err(_) => {
                debug!(event_type, "No subscribers for lifecycle event");
                0
            }
        }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// A handle that can publish without keeping the bus open.
    ///
    /// Subscribers see the bus close once every `EventBus` is dropped,
    /// however many weak handles remain.
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            tx: self.tx.downgrade(),
        }
    }
}

/// Non-owning publish handle, obtained from [`EventBus::downgrade`].
#[derive(Debug, Clone)]
pub struct WeakEventBus {
    tx: broadcast::WeakSender<LifecycleEvent>,
}

impl WeakEventBus {
    /// The bus, if any `EventBus` handle is still alive.
    pub fn upgrade(&self) -> Option<EventBus> {
        self.tx.upgrade().map(|tx| EventBus { tx })
    }

    /// Publish through the bus if it is still open.
    ///
    /// Returns the number of subscribers that received the event, or 0
    /// once the bus has closed.
    pub fn publish(&self, event: LifecycleEvent) -> usize {
        match self.upgrade() {
            Some(bus) => bus.publish(event),
            None => {
                debug!(event_type = event.event_type(), "Event bus closed, dropping event");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::from_config(&TenantryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityChange;
    use tenantry_core::TenantId;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(8);
        let delivered = bus.publish(LifecycleEvent::tenant_changed(
            TenantId::new(1),
            EntityChange::Updated,
        ));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(LifecycleEvent::FeatureSettingsChanged {
            tenant_id: TenantId::new(1),
        });
        bus.publish(LifecycleEvent::FeatureSettingsChanged {
            tenant_id: TenantId::new(2),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleEvent::FeatureSettingsChanged {
                tenant_id: TenantId::new(1)
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleEvent::FeatureSettingsChanged {
                tenant_id: TenantId::new(2)
            }
        );
    }

    #[tokio::test]
    async fn test_weak_handle_does_not_keep_bus_open() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let weak = bus.downgrade();

        assert_eq!(
            weak.publish(LifecycleEvent::FeatureSettingsChanged {
                tenant_id: TenantId::new(1)
            }),
            1
        );
        drop(bus);

        assert!(weak.upgrade().is_none());
        assert_eq!(
            weak.publish(LifecycleEvent::FeatureSettingsChanged {
                tenant_id: TenantId::new(2)
            }),
            0
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleEvent::FeatureSettingsChanged {
                tenant_id: TenantId::new(1)
            }
        );
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[test]
    fn test_zero_capacity_does_not_panic() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }
}
