// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fan-out of settings changes to every live client connection.

use tokio::sync::broadcast;
use tracing::debug;

use photobooth_core::types::Settings;

/// Buffered updates per subscriber before a slow one starts lagging.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct SettingsNotifier {
    tx: broadcast::Sender<Settings>,
}

impl Default for SettingsNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Send `settings` to every subscriber.  Returns how many received it.
    pub fn publish(&self, settings: Settings) -> usize {
        // No subscribers is not an error.
        let delivered = self.tx.send(settings).unwrap_or(0);
        debug!(delivered, "settings change published");
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Settings> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_fine() {
        let notifier = SettingsNotifier::new();
        assert_eq!(notifier.publish(Settings::default()), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_update() {
        let notifier = SettingsNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        let settings = Settings {
            print_count: 5,
            ..Settings::default()
        };
        assert_eq!(notifier.publish(settings.clone()), 2);
        assert_eq!(a.recv().await.expect("a"), settings);
        assert_eq!(b.recv().await.expect("b"), settings);
    }
}
