//! Post-flatten validation (spec §9 "Open question — validation depth").
//!
//! The source's own `Validate` is a stub; this checks, at minimum, that
//! every connection and export endpoint names a declared process and a
//! port that process's library entry actually declares.

use conflux_library::Library;

use crate::error::GraphError;
use crate::model::{ConnectionSource, Endpoint, Graph};

pub fn validate(graph: &Graph, library: &Library) -> Result<(), GraphError> {
    for connection in &graph.connections {
        if let ConnectionSource::Endpoint(source) = &connection.source {
            check_outport(graph, library, source)?;
        }
        check_inport(graph, library, &connection.target)?;
    }
    for export in graph.inports.iter().chain(graph.outports.iter()) {
        check_process_exists(graph, &export.private)?;
    }
    Ok(())
}

fn check_process_exists(graph: &Graph, endpoint: &Endpoint) -> Result<(), GraphError> {
    if !graph.processes.contains_key(&endpoint.process) {
        return Err(GraphError::UnknownProcess(endpoint.process.clone()));
    }
    Ok(())
}

fn check_inport(graph: &Graph, library: &Library, endpoint: &Endpoint) -> Result<(), GraphError> {
    check_process_exists(graph, endpoint)?;
    let component = &graph.processes[&endpoint.process].component;
    let entry = library
        .get(component)
        .map_err(|_| GraphError::UnknownComponent(component.clone(), endpoint.process.clone()))?;
    if entry.find_inport(&endpoint.port).is_none() {
        return Err(GraphError::UnknownInport {
            process: endpoint.process.clone(),
            component: component.clone(),
            port: endpoint.port.clone(),
        });
    }
    Ok(())
}

fn check_outport(graph: &Graph, library: &Library, endpoint: &Endpoint) -> Result<(), GraphError> {
    check_process_exists(graph, endpoint)?;
    let component = &graph.processes[&endpoint.process].component;
    let entry = library
        .get(component)
        .map_err(|_| GraphError::UnknownComponent(component.clone(), endpoint.process.clone()))?;
    if entry.find_outport(&endpoint.port).is_none() {
        return Err(GraphError::UnknownOutport {
            process: endpoint.process.clone(),
            component: component.clone(),
            port: endpoint.port.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Connection;
    use conflux_library::{Entry, EntryPort};

    fn library_with_ticker_and_console() -> Library {
        let mut library = Library::new("test");
        library
            .add(
                Entry {
                    name: "core/ticker".to_string(),
                    description: String::new(),
                    executable_path: "/bin/ticker".to_string(),
                    elementary: true,
                    inports: vec![],
                    outports: vec![EntryPort {
                        name: "OUT".to_string(),
                        type_tag: "any".to_string(),
                        description: String::new(),
                        required: false,
                        addressable: false,
                    }],
                },
                false,
            )
            .unwrap();
        library
            .add(
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
                },
                false,
            )
            .unwrap();
        library
    }

    #[test]
    fn wired_chain_with_declared_ports_validates() {
        let mut graph = Graph::new();
        graph.declare_process("Ticker", "core/ticker");
        graph.declare_process("Log", "core/console");
        graph.connections.push(Connection::wired(
            Endpoint::new("Ticker", "OUT", None),
            Endpoint::new("Log", "IN", None),
        ));
        validate(&graph, &library_with_ticker_and_console()).unwrap();
    }

    #[test]
    fn unknown_port_is_rejected() {
        let mut graph = Graph::new();
        graph.declare_process("Ticker", "core/ticker");
        graph.declare_process("Log", "core/console");
        graph.connections.push(Connection::wired(
            Endpoint::new("Ticker", "NOPE", None),
            Endpoint::new("Log", "IN", None),
        ));
        let err = validate(&graph, &library_with_ticker_and_console()).unwrap_err();
        assert!(matches!(err, GraphError::UnknownOutport { .. }));
    }

    #[test]
    fn unknown_component_is_rejected() {
        let mut graph = Graph::new();
        graph.declare_process("Ticker", "core/ticker");
        graph.declare_process("Weird", "app/does_not_exist");
        graph.connections.push(Connection::wired(
            Endpoint::new("Ticker", "OUT", None),
            Endpoint::new("Weird", "IN", None),
        ));
        let err = validate(&graph, &library_with_ticker_and_console()).unwrap_err();
        assert!(matches!(err, GraphError::UnknownComponent(..)));
    }

    #[test]
    fn seeded_connection_only_checks_target() {
        let mut graph = Graph::new();
        graph.declare_process("Log", "core/console");
        graph
            .connections
            .push(Connection::seeded("hello", Endpoint::new("Log", "IN", None)));
        validate(&graph, &library_with_ticker_and_console()).unwrap();
    }
}
