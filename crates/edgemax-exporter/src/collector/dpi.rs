use edgemax_api::{DpiStat, split_dpi_key};
use tracing::warn;

use super::{Collector, Desc, GaugeVec, Observe, Reading, Sample};

const SUBSYSTEM: &str = "dpi";
const LABELS: &[&str] = &["client_ip", "category", "type"];

/// Per-client deep packet inspection byte counters.
#[derive(Debug)]
pub struct DpiCollector {
    received: GaugeVec,
    transmitted: GaugeVec,
}

impl DpiCollector {
    pub fn new(namespace: &str) -> Self {
        Self {
            received: GaugeVec::new(
                namespace,
                SUBSYSTEM,
                "received_bytes",
                "Bytes received by a client, by traffic type and category.",
                LABELS,
            ),
            transmitted: GaugeVec::new(
                namespace,
                SUBSYSTEM,
                "transmitted_bytes",
                "Bytes transmitted by a client, by traffic type and category.",
                LABELS,
            ),
        }
    }
}

impl Observe<DpiStat> for DpiCollector {
    fn observe(&self, stat: DpiStat) {
        for (client, key, counters) in stat.entries() {
            let Some((kind, category)) = split_dpi_key(key) else {
                warn!(client, key, "skipping DPI entry without a type|category key");
                continue;
            };
            let labels = [client, category, kind];
            self.received
                .set(&labels, Reading::from_stat("dpi_received_bytes", counters.received()));
            self.transmitted.set(
                &labels,
                Reading::from_stat("dpi_transmitted_bytes", counters.transmitted()),
            );
        }
    }
}

impl Collector for DpiCollector {
    fn describe(&self) -> Vec<Desc> {
        vec![self.received.desc().clone(), self.transmitted.desc().clone()]
    }

    fn collect(&self) -> Vec<Sample> {
        let mut samples = self.received.samples();
        samples.extend(self.transmitted.samples());
        samples
    }
}
