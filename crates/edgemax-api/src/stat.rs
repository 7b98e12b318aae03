//! Typed payloads for the three recognized stats topics.
//!
//! Every counter and gauge arrives as a decimal string. The raw strings are
//! kept as-is and the accessors parse them on demand, failing loudly on a
//! missing or garbled value instead of reading it as zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Topic name carrying [`SystemStat`] payloads.
pub const SYSTEM_TOPIC: &str = "system-stats";
/// Topic name carrying [`DpiStat`] payloads.
pub const DPI_TOPIC: &str = "export";
/// Topic name carrying [`InterfacesStat`] payloads.
pub const INTERFACES_TOPIC: &str = "interfaces";

fn parse_field(field: &'static str, value: Option<&str>) -> Result<u64, Error> {
    let value = value.ok_or(Error::MissingStatValue { field })?;
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidStatValue {
            field,
            value: value.to_owned(),
        })
}

/// System-wide load figures for the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStat {
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub mem: Option<String>,
}

impl SystemStat {
    /// CPU usage, in percent.
    pub fn cpu_percent(&self) -> Result<u64, Error> {
        parse_field("cpu", self.cpu.as_deref())
    }

    /// Uptime, in seconds.
    pub fn uptime_seconds(&self) -> Result<u64, Error> {
        parse_field("uptime", self.uptime.as_deref())
    }

    /// Memory usage, in percent.
    pub fn memory_percent(&self) -> Result<u64, Error> {
        parse_field("mem", self.mem.as_deref())
    }
}

/// A received/transmitted byte counter pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteCounters {
    #[serde(default)]
    pub rx_bytes: Option<String>,
    #[serde(default)]
    pub tx_bytes: Option<String>,
}

impl ByteCounters {
    pub fn received(&self) -> Result<u64, Error> {
        parse_field("rx_bytes", self.rx_bytes.as_deref())
    }

    pub fn transmitted(&self) -> Result<u64, Error> {
        parse_field("tx_bytes", self.tx_bytes.as_deref())
    }
}

/// Deep packet inspection counters: client address → `"type|category"` →
/// byte counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DpiStat(pub HashMap<String, HashMap<String, ByteCounters>>);

impl DpiStat {
    /// Iterate every (client, key, counters) triple.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &ByteCounters)> {
        self.0.iter().flat_map(|(client, by_key)| {
            by_key
                .iter()
                .map(move |(key, counters)| (client.as_str(), key.as_str(), counters))
        })
    }
}

/// Split a DPI `"type|category"` key into `(type, category)`.
///
/// Returns `None` when the separator is missing. Only the first `|` splits;
/// the category keeps any later ones.
pub fn split_dpi_key(key: &str) -> Option<(&str, &str)> {
    key.split_once('|')
}

/// Per-interface hardware address and byte counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStat {
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub stats: ByteCounters,
}

/// Interface name → [`InterfaceStat`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfacesStat(pub HashMap<String, InterfaceStat>);
