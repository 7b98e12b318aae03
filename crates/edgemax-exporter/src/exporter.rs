//! Aggregate collector and Prometheus text rendering.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::debug;

use crate::collector::{Collector, Desc, Sample};

/// Every registered collector behind one describe/collect surface.
///
/// Readings live only in the collectors. Each scrape formats them through a
/// throwaway Prometheus recorder that is local to the call, never installed
/// globally, so several exporters (and tests) can coexist in one process.
pub struct Exporter {
    collectors: Vec<Arc<dyn Collector>>,
    descs: Vec<Desc>,
}

impl Exporter {
    pub fn new(collectors: Vec<Arc<dyn Collector>>) -> Self {
        let descs: Vec<Desc> = collectors.iter().flat_map(|c| c.describe()).collect();
        debug!(metrics = descs.len(), "exporter ready");

        Self { collectors, descs }
    }

    /// Render the current samples as Prometheus exposition text.
    pub fn render(&self) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let samples = self.collect();

        metrics::with_local_recorder(&recorder, || {
            for desc in &self.descs {
                metrics::describe_gauge!(desc.name.clone(), desc.help);
            }
            for Sample {
                name,
                labels,
                reading,
            } in samples
            {
                metrics::gauge!(name, &labels).set(reading.as_f64());
            }
        });
        recorder.handle().render()
    }
}

impl Collector for Exporter {
    fn describe(&self) -> Vec<Desc> {
        self.descs.clone()
    }

    fn collect(&self) -> Vec<Sample> {
        self.collectors.iter().flat_map(|c| c.collect()).collect()
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("collectors", &self.collectors.len())
            .field("descs", &self.descs)
            .finish_non_exhaustive()
    }
}
