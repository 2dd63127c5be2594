//! Elapsed-time tracking for requests in flight

use crate::config::OvertimeConfig;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Called on every tick with the elapsed time
pub type IntervalCallback = Arc<dyn Fn(Duration) + Send + Sync>;

/// Called once per crossed threshold with `(threshold, elapsed)`
pub type ThresholdCallback = Arc<dyn Fn(Duration, Duration) + Send + Sync>;

/// Per-query overtime settings; unset fields come from [`OvertimeConfig`]
#[derive(Clone, Default)]
pub struct OvertimeOptions {
    pub enabled: Option<bool>,
    pub interval: Option<Duration>,
    pub thresholds: Option<Vec<Duration>>,
    pub on_interval: Option<IntervalCallback>,
    pub on_threshold: Option<ThresholdCallback>,
}

impl OvertimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    #[must_use]
    pub fn thresholds(mut self, thresholds: Vec<Duration>) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    #[must_use]
    pub fn on_interval<F>(mut self, callback: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.on_interval = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_threshold<F>(mut self, callback: F) -> Self
    where
        F: Fn(Duration, Duration) + Send + Sync + 'static,
    {
        self.on_threshold = Some(Arc::new(callback));
        self
    }

    pub(crate) fn resolve(&self, defaults: &OvertimeConfig) -> OvertimeSettings {
        let mut thresholds = self
            .thresholds
            .clone()
            .unwrap_or_else(|| defaults.thresholds());
        thresholds.sort_unstable();
        thresholds.dedup();

        let interval = self.interval.unwrap_or_else(|| defaults.interval());
        OvertimeSettings {
            enabled: self.enabled.unwrap_or(defaults.enabled),
            // interval_at panics on a zero period
            interval: interval.max(Duration::from_millis(1)),
            thresholds,
            on_interval: self.on_interval.clone(),
            on_threshold: self.on_threshold.clone(),
        }
    }
}

impl fmt::Debug for OvertimeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OvertimeOptions")
            .field("enabled", &self.enabled)
            .field("interval", &self.interval)
            .field("thresholds", &self.thresholds)
            .field("on_interval", &self.on_interval.is_some())
            .field("on_threshold", &self.on_threshold.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct OvertimeSettings {
    enabled: bool,
    interval: Duration,
    /// Ascending, without duplicates
    thresholds: Vec<Duration>,
    on_interval: Option<IntervalCallback>,
    on_threshold: Option<ThresholdCallback>,
}

/// Publishes the elapsed time of the request in flight.
///
/// `start` begins ticking, `stop` resets the elapsed time to `None`. Each
/// threshold fires at most once per request.
pub(crate) struct OvertimeMonitor {
    settings: OvertimeSettings,
    elapsed: Arc<watch::Sender<Option<Duration>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl OvertimeMonitor {
    pub(crate) fn new(settings: OvertimeSettings) -> Self {
        let (elapsed, _) = watch::channel(None);
        Self {
            settings,
            elapsed: Arc::new(elapsed),
            ticker: Mutex::new(None),
        }
    }

    pub(crate) fn elapsed(&self) -> Option<Duration> {
        *self.elapsed.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<Duration>> {
        self.elapsed.subscribe()
    }

    /// Start measuring; a no-op while already running or when disabled
    pub(crate) fn start(&self) {
        if !self.settings.enabled {
            return;
        }
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            return;
        }

        self.elapsed.send_replace(Some(Duration::ZERO));
        let settings = self.settings.clone();
        let elapsed = Arc::clone(&self.elapsed);
        *ticker = Some(tokio::spawn(async move {
            let started = Instant::now();
            let mut interval = interval_at(started + settings.interval, settings.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut next_threshold = 0;

            loop {
                interval.tick().await;
                let now = started.elapsed();
                elapsed.send_replace(Some(now));
                debug!(elapsed_ms = now.as_millis() as u64, "overtime tick");

                if let Some(on_interval) = &settings.on_interval {
                    on_interval(now);
                }
                while let Some(threshold) = settings.thresholds.get(next_threshold) {
                    if *threshold > now {
                        break;
                    }
                    if let Some(on_threshold) = &settings.on_threshold {
                        on_threshold(*threshold, now);
                    }
                    next_threshold += 1;
                }
            }
        }));
    }

    pub(crate) fn stop(&self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.abort();
        }
        self.elapsed.send_replace(None);
    }
}

impl Drop for OvertimeMonitor {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.get_mut().take() {
            ticker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn settings(options: OvertimeOptions) -> OvertimeSettings {
        options.resolve(&OvertimeConfig::default())
    }

    #[test]
    fn test_resolve_sorts_thresholds_and_applies_defaults() {
        let resolved = settings(OvertimeOptions::new().thresholds(vec![
            Duration::from_secs(3),
            Duration::from_secs(1),
            Duration::from_secs(3),
        ]));
        assert!(resolved.enabled);
        assert_eq!(resolved.interval, Duration::from_secs(1));
        assert_eq!(resolved.thresholds, vec![Duration::from_secs(1), Duration::from_secs(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_and_thresholds() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let crossed = Arc::new(Mutex::new(Vec::new()));
        let monitor = OvertimeMonitor::new(settings(
            OvertimeOptions::new()
                .interval(Duration::from_millis(500))
                .thresholds(vec![Duration::from_secs(1), Duration::from_millis(1200)])
                .on_interval({
                    let ticks = ticks.clone();
                    move |_| {
                        ticks.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .on_threshold({
                    let crossed = crossed.clone();
                    move |threshold, _| crossed.lock().push(threshold)
                }),
        ));

        assert_eq!(monitor.elapsed(), None);
        monitor.start();
        assert_eq!(monitor.elapsed(), Some(Duration::ZERO));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(monitor.elapsed(), Some(Duration::from_secs(1)));
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert_eq!(*crossed.lock(), vec![Duration::from_secs(1)]);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
        assert_eq!(
            *crossed.lock(),
            vec![Duration::from_secs(1), Duration::from_millis(1200)]
        );

        monitor.stop();
        assert_eq!(monitor.elapsed(), None);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_monitor_never_ticks() {
        let monitor = OvertimeMonitor::new(settings(OvertimeOptions::new().enabled(false)));
        monitor.start();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(monitor.elapsed(), None);
    }
}
