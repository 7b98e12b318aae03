//! Translation of device stats into gauge samples.
//!
//! Each collector owns its gauges and is fed by one stat channel through
//! [`drain`]. The [`Exporter`](crate::Exporter) asks every collector for its
//! descriptions once and for its samples on every scrape.

mod dpi;
mod gauge;
mod interfaces;
mod system;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

pub use dpi::DpiCollector;
pub use gauge::GaugeVec;
pub use interfaces::InterfacesCollector;
pub use system::SystemCollector;

/// Anything that can describe and produce gauge samples.
pub trait Collector: Send + Sync {
    /// Metric descriptions, stable for the collector's lifetime.
    fn describe(&self) -> Vec<Desc>;

    /// Current value of every labelled series seen so far.
    fn collect(&self) -> Vec<Sample>;
}

/// A collector that consumes one kind of stat record.
pub trait Observe<T>: Send + Sync {
    fn observe(&self, stat: T);
}

/// Metric description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    pub name: String,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

/// One labelled gauge value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: Vec<(&'static str, String)>,
    pub reading: Reading,
}

/// A gauge value, or the marker for a counter the device sent unparsable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    Unavailable,
}

impl Reading {
    /// Convert a parsed stat field, logging parse failures.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn from_stat(metric: &str, result: Result<u64, edgemax_api::Error>) -> Self {
        match result {
            Ok(value) => Self::Value(value as f64),
            Err(e) => {
                warn!(metric, error = %e, "stat value unavailable");
                Self::Unavailable
            }
        }
    }

    /// The exported number; unavailable readings become `NaN`.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Value(v) => v,
            Self::Unavailable => f64::NAN,
        }
    }
}

/// Feed every record from `rx` into `collector` until the channel closes.
pub async fn drain<T, C>(collector: Arc<C>, mut rx: mpsc::Receiver<T>)
where
    C: Observe<T> + ?Sized,
{
    while let Some(stat) = rx.recv().await {
        collector.observe(stat);
    }
    debug!("stat channel closed, collector idle");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use edgemax_api::SystemStat;

    use super::*;

    #[test]
    fn unavailable_reading_is_nan() {
        assert!(Reading::Unavailable.as_f64().is_nan());
        assert!((Reading::Value(12.0).as_f64() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_failure_maps_to_unavailable() {
        let stat = SystemStat {
            cpu: Some("abc".into()),
            ..SystemStat::default()
        };
        assert_eq!(
            Reading::from_stat("cpu", stat.cpu_percent()),
            Reading::Unavailable
        );
        assert_eq!(Reading::from_stat("cpu", Ok(7)), Reading::Value(7.0));
    }

    #[tokio::test]
    async fn drain_observes_until_channel_closes() {
        let collector = Arc::new(SystemCollector::new("edgemax"));
        let (tx, rx) = mpsc::channel(1);

        let task = tokio::spawn(drain(Arc::clone(&collector), rx));
        tx.send(SystemStat {
            cpu: Some("3".into()),
            uptime: Some("100".into()),
            mem: Some("40".into()),
        })
        .await
        .unwrap();
        drop(tx);
        task.await.unwrap();

        let samples = collector.collect();
        let cpu = samples
            .iter()
            .find(|s| s.name == "edgemax_system_cpu_percent")
            .unwrap();
        assert_eq!(cpu.reading, Reading::Value(3.0));
    }
}
