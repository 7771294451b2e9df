//! In-memory Graph Model (spec §3): processes, connections, exports, and
//! free-form properties. Both parsers (`parse::fbp`, `parse::json`) build
//! the same `Graph`, and the flattener rewrites it in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A node in the graph. The instance name is the key under which it sits
/// in `Graph::processes`, not a field of `Process` itself (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub component: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A `(process, port, index)` triple. Two endpoints are equal iff all three
/// fields match; `index` is `None` for scalar ports (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub process: String,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl Endpoint {
    pub fn new(process: impl Into<String>, port: impl Into<String>, index: Option<u32>) -> Self {
        Endpoint {
            process: process.into(),
            port: port.into(),
            index,
        }
    }

    /// Canonicalize for planning purposes: an absent index is treated as 0
    /// (spec §4.5 "index absent is treated as 0"), but the distinction still
    /// matters for CLI argument shape (scalar vs. single-element array), so
    /// callers keep the original `Endpoint` around and use this only as a
    /// lookup key.
    pub fn canonical_index(&self) -> u32 {
        self.index.unwrap_or(0)
    }
}

/// Either a wired source endpoint or a seeded literal payload (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionSource {
    Endpoint(Endpoint),
    Iip(String),
}

/// A directed link between endpoints, or a literal-to-endpoint seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: ConnectionSource,
    pub target: Endpoint,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Connection {
    pub fn wired(source: Endpoint, target: Endpoint) -> Self {
        Connection {
            source: ConnectionSource::Endpoint(source),
            target,
            metadata: BTreeMap::new(),
        }
    }

    pub fn seeded(data: impl Into<String>, target: Endpoint) -> Self {
        Connection {
            source: ConnectionSource::Iip(data.into()),
            target,
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_iip(&self) -> bool {
        matches!(self.source, ConnectionSource::Iip(_))
    }
}

/// A mapping from a public name to a private `process.port` reference
/// (spec §3 "Export").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub public: String,
    pub private: Endpoint,
}

/// The parsed network (spec §3 "Graph").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub processes: BTreeMap<String, Process>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub inports: Vec<Export>,
    #[serde(default)]
    pub outports: Vec<Export>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Declare a process if it isn't already present, returning whether it
    /// was newly inserted. Matches the FBP DSL rule that a process is
    /// declared on its first `(Component)`-suffixed appearance and merely
    /// referenced thereafter.
    pub fn declare_process(&mut self, name: impl Into<String>, component: impl Into<String>) -> bool {
        let name = name.into();
        if self.processes.contains_key(&name) {
            return false;
        }
        self.processes.insert(
            name,
            Process {
                component: component.into(),
                metadata: BTreeMap::new(),
            },
        );
        true
    }

    pub fn ensure_process_referenced(&mut self, name: &str) {
        self.processes
            .entry(name.to_string())
            .or_insert_with(|| Process {
                component: String::new(),
                metadata: BTreeMap::new(),
            });
    }

    /// Declare `name`'s component, honoring "first `(Component)` suffix
    /// wins" even when `name` was referenced earlier in the chain without
    /// one (spec §4.2).
    pub fn declare_component(&mut self, name: &str, component: String, metadata: BTreeMap<String, String>) {
        let process = self.processes.entry(name.to_string()).or_insert_with(|| Process {
            component: String::new(),
            metadata: BTreeMap::new(),
        });
        if process.component.is_empty() {
            process.component = component;
            process.metadata = metadata;
        }
    }
}

/// `Graph`s compare equal "ignoring insertion order of the processes map"
/// (spec §8 property 2) — `BTreeMap`/`Vec<Connection>` equality already
/// does this for `processes` since map equality is order-independent;
/// `connections` order is part of planning semantics (§4.5 "allocation
/// order is connection order in the graph") so it is compared as-is.
pub fn graphs_semantically_equal(a: &Graph, b: &Graph) -> bool {
    a.properties == b.properties
        && a.processes == b.processes
        && a.connections == b.connections
        && a.inports == b.inports
        && a.outports == b.outports
}
