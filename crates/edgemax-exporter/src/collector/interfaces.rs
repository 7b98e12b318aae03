use edgemax_api::InterfacesStat;

use super::{Collector, Desc, GaugeVec, Observe, Reading, Sample};

const SUBSYSTEM: &str = "interfaces";
const LABELS: &[&str] = &["name", "mac"];

/// Per-interface byte counters.
#[derive(Debug)]
pub struct InterfacesCollector {
    received: GaugeVec,
    transmitted: GaugeVec,
}

impl InterfacesCollector {
    pub fn new(namespace: &str) -> Self {
        Self {
            received: GaugeVec::new(
                namespace,
                SUBSYSTEM,
                "received_bytes",
                "Bytes received on a network interface.",
                LABELS,
            ),
            transmitted: GaugeVec::new(
                namespace,
                SUBSYSTEM,
                "transmitted_bytes",
                "Bytes transmitted on a network interface.",
                LABELS,
            ),
        }
    }
}

impl Observe<InterfacesStat> for InterfacesCollector {
    fn observe(&self, stat: InterfacesStat) {
        for (name, iface) in &stat.0 {
            let labels = [name.as_str(), iface.mac.as_str()];
            self.received.set(
                &labels,
                Reading::from_stat("interfaces_received_bytes", iface.stats.received()),
            );
            self.transmitted.set(
                &labels,
                Reading::from_stat("interfaces_transmitted_bytes", iface.stats.transmitted()),
            );
        }
    }
}

impl Collector for InterfacesCollector {
    fn describe(&self) -> Vec<Desc> {
        vec![self.received.desc().clone(), self.transmitted.desc().clone()]
    }

    fn collect(&self) -> Vec<Sample> {
        let mut samples = self.received.samples();
        samples.extend(self.transmitted.samples());
        samples
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use edgemax_api::{ByteCounters, InterfaceStat};

    use super::*;

    #[test]
    fn labels_carry_name_and_mac() {
        let collector = InterfacesCollector::new("edgemax");
        collector.observe(InterfacesStat(HashMap::from([(
            "eth0".to_owned(),
            InterfaceStat {
                mac: "04:18:d6:00:00:01".into(),
                stats: ByteCounters {
                    rx_bytes: Some("1024".into()),
                    tx_bytes: Some("2048".into()),
                },
            },
        )])));

        let samples = collector.collect();
        assert_eq!(samples.len(), 2);
        for sample in &samples {
            assert_eq!(
                sample.labels,
                vec![
                    ("name", "eth0".to_owned()),
                    ("mac", "04:18:d6:00:00:01".to_owned()),
                ]
            );
        }
        let tx = samples
            .iter()
            .find(|s| s.name == "edgemax_interfaces_transmitted_bytes")
            .unwrap();
        assert_eq!(tx.reading, Reading::Value(2048.0));
    }

    #[test]
    fn missing_counter_is_unavailable() {
        let collector = InterfacesCollector::new("edgemax");
        collector.observe(InterfacesStat(HashMap::from([(
            "lo".to_owned(),
            InterfaceStat::default(),
        )])));

        assert!(
            collector
                .collect()
                .iter()
                .all(|s| s.reading == Reading::Unavailable)
        );
    }
}
