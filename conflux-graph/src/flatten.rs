//! Subgraph expansion (spec §4.4, §8 property 3).
//!
//! Flattening replaces every process whose component resolves to a
//! subgraph-typed library entry with that subgraph's own processes and
//! connections, renamed `<hostProcessName>_<innerName>` to stay unique,
//! and rewrites any connection that touched one of the subgraph's
//! exported ports to point at the private endpoint it stands for. This
//! repeats to a fixed point so subgraphs containing subgraphs expand
//! fully; a bound on the number of passes catches a subgraph that
//! (directly or transitively) contains itself.

use std::collections::BTreeMap;

use conflux_library::Library;

use crate::error::GraphError;
use crate::model::{Connection, ConnectionSource, Endpoint, Export, Graph, Process};

/// Loads the `Graph` a subgraph library entry's executable path points at.
pub trait SubgraphLoader {
    fn load(&self, path: &str) -> Result<Graph, GraphError>;
}

impl<F> SubgraphLoader for F
where
    F: Fn(&str) -> Result<Graph, GraphError>,
{
    fn load(&self, path: &str) -> Result<Graph, GraphError> {
        self(path)
    }
}

pub fn flatten(graph: &Graph, library: &Library, loader: &dyn SubgraphLoader) -> Result<Graph, GraphError> {
    let mut current = graph.clone();
    let max_passes = graph.processes.len() + 1;
    for _ in 0..max_passes.max(1) {
        let (next, changed) = expand_pass(&current, library, loader)?;
        if !changed {
            return Ok(next);
        }
        current = next;
    }
    Err(GraphError::NonTerminatingSubgraph(
        current.processes.keys().cloned().collect(),
    ))
}

struct Expansion {
    /// Prefixed process map contributed by one subgraph's contents.
    processes: BTreeMap<String, Process>,
    connections: Vec<Connection>,
    /// Exported port name -> the prefixed private endpoint it resolves to.
    inports: BTreeMap<String, Endpoint>,
    outports: BTreeMap<String, Endpoint>,
}

fn expand_pass(
    graph: &Graph,
    library: &Library,
    loader: &dyn SubgraphLoader,
) -> Result<(Graph, bool), GraphError> {
    let mut new_processes = BTreeMap::new();
    let mut expansions: BTreeMap<String, Expansion> = BTreeMap::new();
    let mut changed = false;

    for (name, process) in &graph.processes {
        let Ok(entry) = library.get(&process.component) else {
            new_processes.insert(name.clone(), process.clone());
            continue;
        };
        if !entry.is_subgraph() {
            new_processes.insert(name.clone(), process.clone());
            continue;
        }

        changed = true;
        let inner = loader.load(&entry.executable_path)?;
        let prefix = format!("{name}_");

        let mut prefixed_processes = BTreeMap::new();
        for (inner_name, inner_process) in &inner.processes {
            prefixed_processes.insert(format!("{prefix}{inner_name}"), inner_process.clone());
        }

        let rename = |e: &Endpoint| Endpoint::new(format!("{prefix}{}", e.process), e.port.clone(), e.index);
        let prefixed_connections: Vec<Connection> = inner
            .connections
            .iter()
            .map(|c| Connection {
                source: match &c.source {
                    ConnectionSource::Iip(data) => ConnectionSource::Iip(data.clone()),
                    ConnectionSource::Endpoint(e) => ConnectionSource::Endpoint(rename(e)),
                },
                target: rename(&c.target),
                metadata: c.metadata.clone(),
            })
            .collect();

        let inports = inner
            .inports
            .iter()
            .map(|export: &Export| (export.public.clone(), rename(&export.private)))
            .collect();
        let outports = inner
            .outports
            .iter()
            .map(|export: &Export| (export.public.clone(), rename(&export.private)))
            .collect();

        expansions.insert(
            name.clone(),
            Expansion {
                processes: prefixed_processes,
                connections: prefixed_connections,
                inports,
                outports,
            },
        );
    }

    for expansion in expansions.values() {
        new_processes.extend(expansion.processes.clone());
    }

    let resolve_source = |c: &ConnectionSource| -> Result<ConnectionSource, GraphError> {
        match c {
            ConnectionSource::Iip(data) => Ok(ConnectionSource::Iip(data.clone())),
            ConnectionSource::Endpoint(e) => match expansions.get(&e.process) {
                Some(expansion) => expansion
                    .outports
                    .get(&e.port)
                    .cloned()
                    .map(ConnectionSource::Endpoint)
                    .ok_or_else(|| GraphError::UnknownExportTarget(e.port.clone(), e.process.clone(), e.port.clone())),
                None => Ok(ConnectionSource::Endpoint(e.clone())),
            },
        }
    };
    let resolve_target = |e: &Endpoint| -> Result<Endpoint, GraphError> {
        match expansions.get(&e.process) {
            Some(expansion) => expansion
                .inports
                .get(&e.port)
                .cloned()
                .ok_or_else(|| GraphError::UnknownExportTarget(e.port.clone(), e.process.clone(), e.port.clone())),
            None => Ok(e.clone()),
        }
    };

    let mut new_connections = Vec::new();
    for c in &graph.connections {
        new_connections.push(Connection {
            source: resolve_source(&c.source)?,
            target: resolve_target(&c.target)?,
            metadata: c.metadata.clone(),
        });
    }
    for expansion in expansions.values() {
        new_connections.extend(expansion.connections.clone());
    }

    let resolve_export = |e: &Export, is_inport: bool| -> Result<Export, GraphError> {
        match expansions.get(&e.private.process) {
            Some(expansion) => {
                let table = if is_inport { &expansion.inports } else { &expansion.outports };
                let private = table
                    .get(&e.private.port)
                    .cloned()
                    .ok_or_else(|| GraphError::UnknownExportTarget(e.public.clone(), e.private.process.clone(), e.private.port.clone()))?;
                Ok(Export {
                    public: e.public.clone(),
                    private,
                })
            }
            None => Ok(e.clone()),
        }
    };

    let mut new_inports = Vec::new();
    for e in &graph.inports {
        new_inports.push(resolve_export(e, true)?);
    }
    let mut new_outports = Vec::new();
    for e in &graph.outports {
        new_outports.push(resolve_export(e, false)?);
    }

    Ok((
        Graph {
            properties: graph.properties.clone(),
            processes: new_processes,
            connections: new_connections,
            inports: new_inports,
            outports: new_outports,
        },
        changed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_library::{Entry, EntryPort};

    fn console_entry() -> Entry {
        Entry {
            name: "core/console".to_string(),
            description: String::new(),
            executable_path: "/bin/console".to_string(),
            elementary: true,
            inports: vec![EntryPort {
                name: "IN".to_string(),
                type_tag: "any".to_string(),
                description: String::new(),
                required: true,
                addressable: false,
            }],
            outports: vec![],
        }
    }

    fn subgraph_entry(name: &str, path: &str) -> Entry {
        Entry {
            name: name.to_string(),
            description: String::new(),
            executable_path: path.to_string(),
            elementary: false,
            inports: vec![],
            outports: vec![],
        }
    }

    #[test]
    fn already_flat_graph_is_unchanged() {
        let mut graph = Graph::new();
        graph.declare_process("Log", "core/console");
        let mut library = Library::new("test");
        library.add(console_entry(), false).unwrap();
        let loader = |_: &str| -> Result<Graph, GraphError> { panic!("no subgraph should be loaded") };
        let flattened = flatten(&graph, &library, &loader).unwrap();
        assert_eq!(flattened, graph);
    }

    #[test]
    fn subgraph_process_is_replaced_and_export_is_rewritten() {
        let mut inner = Graph::new();
        inner.declare_process("Read", "core/file_reader");
        inner.inports.push(Export {
            public: "FILENAME".to_string(),
            private: Endpoint::new("Read", "IN", None),
        });

        let mut parent = Graph::new();
        parent.declare_process("Sub", "app/reader_sub");
        parent.declare_process("Log", "core/console");
        parent.connections.push(Connection::seeded("input.txt", Endpoint::new("Sub", "FILENAME", None)));

        let mut library = Library::new("test");
        library.add(console_entry(), false).unwrap();
        library
            .add(
                Entry {
                    name: "core/file_reader".to_string(),
                    description: String::new(),
                    executable_path: "/bin/file_reader".to_string(),
                    elementary: true,
                    inports: vec![EntryPort {
                        name: "IN".to_string(),
                        type_tag: "string".to_string(),
                        description: String::new(),
                        required: true,
                        addressable: false,
                    }],
                    outports: vec![],
                },
                false,
            )
            .unwrap();
        library.add(subgraph_entry("app/reader_sub", "reader_sub.fbp"), false).unwrap();

        let loader = move |path: &str| -> Result<Graph, GraphError> {
            assert_eq!(path, "reader_sub.fbp");
            Ok(inner.clone())
        };
        let flattened = flatten(&parent, &library, &loader).unwrap();

        assert!(flattened.processes.contains_key("Sub_Read"));
        assert!(!flattened.processes.contains_key("Sub"));
        let conn = &flattened.connections[0];
        assert_eq!(conn.target.process, "Sub_Read");
        assert_eq!(conn.target.port, "IN");
    }

    #[test]
    fn self_referential_subgraph_is_rejected() {
        let mut graph = Graph::new();
        graph.declare_process("Loop", "app/loopy");
        let mut library = Library::new("test");
        library.add(subgraph_entry("app/loopy", "loopy.fbp"), false).unwrap();

        let loader = |_: &str| -> Result<Graph, GraphError> {
            let mut g = Graph::new();
            g.declare_process("Inner", "app/loopy");
            Ok(g)
        };
        let err = flatten(&graph, &library, &loader).unwrap_err();
        assert!(matches!(err, GraphError::NonTerminatingSubgraph(_)));
    }

    #[test]
    fn flattening_twice_is_idempotent() {
        let mut graph = Graph::new();
        graph.declare_process("Log", "core/console");
        let mut library = Library::new("test");
        library.add(console_entry(), false).unwrap();
        let loader = |_: &str| -> Result<Graph, GraphError> { panic!("no subgraph should be loaded") };
        let once = flatten(&graph, &library, &loader).unwrap();
        let twice = flatten(&once, &library, &loader).unwrap();
        assert_eq!(once, twice);
    }
}
