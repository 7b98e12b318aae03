// edgemax-exporter: Prometheus translation of EdgeMAX stats streams

pub mod collector;
pub mod exporter;
pub mod server;

pub use collector::{
    Collector, Desc, DpiCollector, InterfacesCollector, Observe, Reading, Sample, SystemCollector,
    drain,
};
pub use exporter::Exporter;
