//! Authoritative zone data loaded from YAML files.
//!
//! One file per zone. The store is built at startup and read-only after
//! that, so handler tasks share it without locking.

use std::net::Ipv4Addr;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::dns::normalize;

/// Zone loading failures; all fatal at startup.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("i/o error reading zones: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid zone file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One `a:` entry in a zone file.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneARecord {
    #[serde(default)]
    pub name: String,
    pub value: Ipv4Addr,
    #[serde(default)]
    pub ttl: u32,
}

/// SOA fields as they appear in zone YAML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Soa {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minttl: u32,
}

/// One `ns:` entry in a zone file.
#[derive(Debug, Clone, Deserialize)]
pub struct NsRecord {
    pub host: String,
}

/// A parsed zone file.
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub origin: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub soa: Option<Soa>,
    #[serde(default)]
    pub ns: Vec<NsRecord>,
    #[serde(default)]
    pub a: Vec<ZoneARecord>,
}

/// Read-only lookup of zones by origin.
#[derive(Debug, Default)]
pub struct ZoneStore {
    zones: FxHashMap<String, Zone>,
}

impl ZoneStore {
    /// Load every `*.yml` / `*.yaml` file under `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, ZoneError> {
        let mut store = Self::default();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("yml") | Some("yaml") => {}
                _ => continue,
            }
            let data = std::fs::read_to_string(&path)?;
            store.insert(serde_yaml::from_str(&data)?);
        }
        Ok(store)
    }

    /// Register a zone under its normalized origin.
    pub fn insert(&mut self, mut zone: Zone) {
        zone.origin = normalize(&zone.origin);
        self.zones.insert(zone.origin.clone(), zone);
    }

    pub fn get(&self, origin: &str) -> Option<&Zone> {
        self.zones.get(origin)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
