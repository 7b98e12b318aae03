use edgemax_api::SystemStat;

use super::{Collector, Desc, GaugeVec, Observe, Reading, Sample};

const SUBSYSTEM: &str = "system";

/// Device-wide CPU, memory and uptime gauges.
#[derive(Debug)]
pub struct SystemCollector {
    cpu: GaugeVec,
    uptime: GaugeVec,
    memory: GaugeVec,
}

impl SystemCollector {
    pub fn new(namespace: &str) -> Self {
        Self {
            cpu: GaugeVec::new(namespace, SUBSYSTEM, "cpu_percent", "Device CPU utilization in percent.", &[]),
            uptime: GaugeVec::new(namespace, SUBSYSTEM, "uptime_seconds", "Device uptime in seconds.", &[]),
            memory: GaugeVec::new(
                namespace,
                SUBSYSTEM,
                "memory_percent",
                "Device memory utilization in percent.",
                &[],
            ),
        }
    }

    fn gauges(&self) -> [&GaugeVec; 3] {
        [&self.cpu, &self.uptime, &self.memory]
    }
}

impl Observe<SystemStat> for SystemCollector {
    fn observe(&self, stat: SystemStat) {
        self.cpu
            .set(&[], Reading::from_stat("cpu_percent", stat.cpu_percent()));
        self.uptime
            .set(&[], Reading::from_stat("uptime_seconds", stat.uptime_seconds()));
        self.memory
            .set(&[], Reading::from_stat("memory_percent", stat.memory_percent()));
    }
}

impl Collector for SystemCollector {
    fn describe(&self) -> Vec<Desc> {
        self.gauges().iter().map(|g| g.desc().clone()).collect()
    }

    fn collect(&self) -> Vec<Sample> {
        self.gauges().iter().flat_map(|g| g.samples()).collect()
    }
}
