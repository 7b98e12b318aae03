use dashmap::DashMap;

use super::{Desc, Reading, Sample};

/// A family of gauges sharing a name and label set, keyed by label values.
///
/// Series are created on first `set` and kept for the life of the process,
/// so a series the device stops reporting keeps its last value.
#[derive(Debug)]
pub struct GaugeVec {
    desc: Desc,
    series: DashMap<Vec<String>, Reading>,
}

impl GaugeVec {
    pub fn new(
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            desc: Desc {
                name: format!("{namespace}_{subsystem}_{name}"),
                help,
                labels,
            },
            series: DashMap::new(),
        }
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    /// Set the series identified by `values`, given in label order.
    pub fn set(&self, values: &[&str], reading: Reading) {
        debug_assert_eq!(values.len(), self.desc.labels.len());
        let key = values.iter().map(|v| (*v).to_owned()).collect();
        self.series.insert(key, reading);
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.series
            .iter()
            .map(|entry| Sample {
                name: self.desc.name.clone(),
                labels: self
                    .desc
                    .labels
                    .iter()
                    .copied()
                    .zip(entry.key().iter().cloned())
                    .collect(),
                reading: *entry.value(),
            })
            .collect()
    }
}
