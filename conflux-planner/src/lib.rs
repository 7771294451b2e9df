//! Endpoint Planner (spec §4.5, §8 properties 4 & 5).
//!
//! Assigns one `tcp://127.0.0.1:<port>` address per distinct logical
//! endpoint. Endpoints wired together (directly, or transitively through
//! chains and fan-in/fan-out) collapse to a single address via union-find
//! over the connection list, processed in graph order so allocation is
//! deterministic.

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;

use conflux_graph::{ConnectionSource, Endpoint, Graph};

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EndpointKey {
    process: String,
    port: String,
    index: u32,
}

impl From<&Endpoint> for EndpointKey {
    fn from(e: &Endpoint) -> Self {
        EndpointKey {
            process: e.process.clone(),
            port: e.port.clone(),
            index: e.canonical_index(),
        }
    }
}

/// One IIP ready to be sent once the network has settled (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedIip {
    pub data: String,
    pub address: String,
}

/// The Planner's output: per-endpoint addresses, the CLI args each process
/// should be launched with, and the IIPs to inject after settle.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    addresses: HashMap<EndpointKey, String>,
    /// process name -> ordered `--port.<name>=<addr>[,<addr>...]` arguments.
    pub args: HashMap<String, Vec<String>>,
    pub iips: Vec<PlannedIip>,
}

impl Plan {
    pub fn address_for(&self, process: &str, port: &str, index: Option<u32>) -> Option<&str> {
        self.addresses
            .get(&EndpointKey {
                process: process.to_string(),
                port: port.to_string(),
                index: index.unwrap_or(0),
            })
            .map(String::as_str)
    }

    pub fn address_count(&self) -> usize {
        self.addresses.values().collect::<std::collections::HashSet<_>>().len()
    }
}

fn endpoint_id(keys: &mut Vec<EndpointKey>, key_ids: &mut HashMap<EndpointKey, usize>, key: EndpointKey) -> usize {
    if let Some(&id) = key_ids.get(&key) {
        return id;
    }
    let id = keys.len();
    key_ids.insert(key.clone(), id);
    keys.push(key);
    id
}

/// Plan address assignment for `graph`, starting from `start_port`.
pub fn plan(graph: &Graph, start_port: u16) -> Plan {
    let mut keys: Vec<EndpointKey> = Vec::new();
    let mut key_ids: HashMap<EndpointKey, usize> = HashMap::new();

    // First pass: assign an id to every endpoint in connection order,
    // source before target, without yet resolving equivalence classes.
    let mut unions: Vec<(usize, usize)> = Vec::new();
    for connection in &graph.connections {
        let target_id = endpoint_id(&mut keys, &mut key_ids, EndpointKey::from(&connection.target));
        if let ConnectionSource::Endpoint(source) = &connection.source {
            let source_id = endpoint_id(&mut keys, &mut key_ids, EndpointKey::from(source));
            unions.push((source_id, target_id));
        }
    }

    let mut uf = UnionFind::new(keys.len().max(1));
    for (a, b) in unions {
        uf.union(a, b);
    }

    // Second pass: assign one address per root, in the order its root is
    // first encountered while scanning `keys` (their original insertion
    // order, i.e. connection order in the graph).
    let mut address_by_root: HashMap<usize, String> = HashMap::new();
    let mut next_port = start_port;
    let mut addresses = HashMap::new();
    for (id, key) in keys.iter().enumerate() {
        let root = uf.find(id);
        let address = address_by_root.entry(root).or_insert_with(|| {
            let addr = format!("tcp://127.0.0.1:{next_port}");
            next_port += 1;
            addr
        });
        addresses.insert(key.clone(), address.clone());
    }

    let iips = graph
        .connections
        .iter()
        .filter_map(|c| match &c.source {
            ConnectionSource::Iip(data) => {
                let key = EndpointKey::from(&c.target);
                addresses.get(&key).map(|addr| PlannedIip {
                    data: data.clone(),
                    address: addr.clone(),
                })
            }
            ConnectionSource::Endpoint(_) => None,
        })
        .collect();

    let args = build_args(&addresses);

    let plan = Plan { addresses, args, iips };
    tracing::debug!(plan = ?plan, "endpoint plan computed");
    plan
}

/// Group addresses by `(process, port)`, sort by index, and render each
/// group as one `--port.<name>=<addr>[,<addr>...]` CLI argument (§4.5).
fn build_args(addresses: &HashMap<EndpointKey, String>) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<(String, String), Vec<(u32, String)>> = HashMap::new();
    for (key, address) in addresses {
        grouped
            .entry((key.process.clone(), key.port.clone()))
            .or_default()
            .push((key.index, address.clone()));
    }

    let mut args: HashMap<String, Vec<String>> = HashMap::new();
    for ((process, port), mut indexed) in grouped {
        indexed.sort_by_key(|(index, _)| *index);
        let joined = indexed.iter().map(|(_, addr)| addr.as_str()).collect::<Vec<_>>().join(",");
        args.entry(process)
            .or_default()
            .push(format!("--port.{}={}", port.to_lowercase(), joined));
    }
    for flags in args.values_mut() {
        flags.sort();
    }
    args
}

impl std::fmt::Debug for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}[{}]", self.process, self.port, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_graph::Connection;

    #[test]
    fn scenario_s2_allocates_three_addresses() {
        let mut graph = Graph::new();
        graph.declare_process("Ticker", "core/ticker");
        graph.declare_process("Forward", "core/passthru");
        graph.declare_process("Log", "core/console");
        graph
            .connections
            .push(Connection::seeded("5s", Endpoint::new("Ticker", "INTERVAL", None)));
        graph.connections.push(Connection::wired(
            Endpoint::new("Ticker", "OUT", None),
            Endpoint::new("Forward", "IN", None),
        ));
        graph.connections.push(Connection::wired(
            Endpoint::new("Forward", "OUT", None),
            Endpoint::new("Log", "IN", None),
        ));

        let plan = plan(&graph, 9000);
        assert_eq!(plan.address_count(), 3);
        assert_eq!(plan.iips.len(), 1);
        assert_eq!(plan.iips[0].data, "5s");
    }

    #[test]
    fn chained_connections_collapse_pairwise() {
        // Demo OUT -> IN Process RESULT -> INPUT Visualize
        let mut graph = Graph::new();
        graph.connections.push(Connection::wired(
            Endpoint::new("Demo", "OUT", None),
            Endpoint::new("Process", "IN", None),
        ));
        graph.connections.push(Connection::wired(
            Endpoint::new("Process", "RESULT", None),
            Endpoint::new("Visualize", "INPUT", None),
        ));

        let plan = plan(&graph, 9000);
        assert_eq!(plan.address_count(), 2);
        let a = plan.address_for("Demo", "OUT", None).unwrap().to_string();
        let b = plan.address_for("Process", "IN", None).unwrap().to_string();
        assert_eq!(a, b);
        let c = plan.address_for("Process", "RESULT", None).unwrap().to_string();
        let d = plan.address_for("Visualize", "INPUT", None).unwrap().to_string();
        assert_eq!(c, d);
        assert_ne!(a, c);
    }

    #[test]
    fn array_ports_compact_into_one_comma_joined_arg() {
        let mut graph = Graph::new();
        graph.declare_process("Router", "router");
        graph
            .connections
            .push(Connection::seeded("pattern0", Endpoint::new("Router", "IN", Some(0))));
        graph
            .connections
            .push(Connection::seeded("pattern1", Endpoint::new("Router", "IN", Some(1))));
        graph
            .connections
            .push(Connection::seeded("pattern2", Endpoint::new("Router", "IN", Some(2))));

        let plan = plan(&graph, 9000);
        let router_args = &plan.args["Router"];
        assert_eq!(router_args.len(), 1);
        let value = router_args[0].strip_prefix("--port.in=").unwrap();
        assert_eq!(value.split(',').count(), 3);
    }

    #[test]
    fn absent_index_and_explicit_zero_are_the_same_endpoint() {
        let mut graph = Graph::new();
        graph.connections.push(Connection::wired(
            Endpoint::new("A", "OUT", None),
            Endpoint::new("B", "IN", Some(0)),
        ));
        let plan = plan(&graph, 9000);
        assert_eq!(plan.address_for("A", "OUT", None), plan.address_for("A", "OUT", Some(0)));
    }

    #[test]
    fn fan_in_on_same_endpoint_collapses_to_one_address() {
        let mut graph = Graph::new();
        graph.connections.push(Connection::wired(
            Endpoint::new("A", "OUT", None),
            Endpoint::new("C", "IN", None),
        ));
        graph.connections.push(Connection::wired(
            Endpoint::new("B", "OUT", None),
            Endpoint::new("C", "IN", None),
        ));
        let plan = plan(&graph, 9000);
        assert_eq!(plan.address_count(), 1);
        let a = plan.address_for("A", "OUT", None).unwrap().to_string();
        let b = plan.address_for("B", "OUT", None).unwrap().to_string();
        let c = plan.address_for("C", "IN", None).unwrap().to_string();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }
}
