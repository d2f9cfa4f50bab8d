//! Terminal dashboard sink: prints per-tuner signal level/quality.
//!
//! The reference implementation renders a live `rich` progress-bar panel per
//! tuner; nothing in this crate's dependency stack provides an equivalent
//! terminal UI, so the same per-tuner progress state is instead refreshed as
//! a `tracing` line roughly four times a second, one line per tuner.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Snapshot of one tuner's most recent signal readings.
#[derive(Debug, Clone, Copy, Default)]
struct TunerProgress {
    level_pct: u8,
    quality_pct: u8,
}

struct TunerEntry {
    display_name: String,
    progress: Mutex<TunerProgress>,
}

/// Shared dashboard state: one row per registered tuner, refreshed from the
/// RTCP receive tasks and read by a periodic refresh task.
#[derive(Default)]
pub struct Display {
    tuners: Mutex<Vec<Arc<TunerEntry>>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Display {
    /// Create an empty dashboard. Tuners are added with `register()` before
    /// `start()` is called.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one tuner row, labeled `display_name`, and return the update
    /// callback the receive task should invoke with each decoded RTCP
    /// metric pair.
    ///
    /// # Panics
    /// Panics if called after `start()`; registration must happen up front,
    /// as in the reference implementation.
    pub fn register(self: &Arc<Self>, display_name: impl Into<String>) -> impl Fn(u8, u8) + Send + Sync + 'static {
        assert!(
            self.refresh_task.lock().unwrap_or_else(std::sync::PoisonError::into_inner).is_none(),
            "cannot register a tuner after the display has started"
        );

        let entry = Arc::new(TunerEntry {
            display_name: display_name.into(),
            progress: Mutex::new(TunerProgress::default()),
        });
        self.tuners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(entry.clone());

        move |level_pct: u8, quality_pct: u8| {
            let mut guard = entry
                .progress
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.level_pct = level_pct;
            guard.quality_pct = quality_pct;
        }
    }

    /// Start the ~4 Hz refresh task that logs every registered tuner's
    /// current level/quality.
    pub fn start(self: &Arc<Self>) {
        let this = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(250));
            loop {
                ticker.tick().await;
                let tuners = this
                    .tuners
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                for tuner in tuners.iter() {
                    let progress = tuner
                        .progress
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    tracing::info!(
                        tuner = %tuner.display_name,
                        level_pct = progress.level_pct,
                        quality_pct = progress.quality_pct,
                        "signal"
                    );
                }
            }
        });
        *self
            .refresh_task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(task);
    }

    /// Stop the refresh task. Safe to call from a signal handler path and
    /// idempotent; a second call is a no-op.
    pub fn close(self: &Arc<Self>) {
        if let Some(task) = self
            .refresh_task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_returns_callback_that_updates_entry() {
        let display = Display::new();
        let update = display.register("10714.0/h|ARD");
        update(45, 86);

        let tuners = display.tuners.lock().unwrap();
        let progress = tuners[0].progress.lock().unwrap();
        assert_eq!(progress.level_pct, 45);
        assert_eq!(progress.quality_pct, 86);
    }

    #[test]
    fn close_without_start_is_a_noop() {
        let display = Display::new();
        display.close();
        display.close();
    }
}
