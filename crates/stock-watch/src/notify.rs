//! Alert notification sinks

use crate::alert::AlertEvent;
use crate::config::WatchConfig;
use crate::error::Result;
use std::io::Write;

/// Sink for threshold alerts
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &AlertEvent) -> Result<()>;
}

/// Ring the terminal bell on stderr; stdout belongs to the table
fn ring_bell() -> Result<()> {
    let mut stderr = std::io::stderr();
    stderr.write_all(b"\x07")?;
    stderr.flush()?;
    Ok(())
}

/// Logs the alert and rings the terminal bell
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    bell: bool,
}

impl ConsoleNotifier {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, alert: &AlertEvent) -> Result<()> {
        tracing::warn!(
            symbol = %alert.symbol,
            price = alert.price,
            min = alert.band.min,
            max = alert.band.max,
            "{}",
            alert.message()
        );
        if self.bell {
            ring_bell()?;
        }
        Ok(())
    }
}

/// Posts to the OS notification service, then rings the bell
#[cfg(feature = "desktop")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

#[cfg(feature = "desktop")]
impl Notifier for DesktopNotifier {
    fn notify(&self, alert: &AlertEvent) -> Result<()> {
        use crate::error::WatchError;
        use notify_rust::{Notification, Timeout};

        Notification::new()
            .summary(&alert.title())
            .body(&alert.message())
            .timeout(Timeout::Milliseconds(5_000))
            .show()
            .map(|_| ())
            .map_err(|e| WatchError::NotificationError(e.to_string()))?;

        if let Err(e) = ring_bell() {
            tracing::warn!(error = %e, "sound error");
        }
        Ok(())
    }
}

/// Pick the notifier the configuration asks for
pub fn notifier_for(config: &WatchConfig) -> Box<dyn Notifier> {
    if config.desktop_notifications {
        #[cfg(feature = "desktop")]
        return Box::new(DesktopNotifier);

        #[cfg(not(feature = "desktop"))]
        tracing::warn!("desktop notifications requested but the `desktop` feature is disabled; using the console");
    }
    Box::new(ConsoleNotifier::default())
}
