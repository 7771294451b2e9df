//! End-to-end scenarios (spec §8) exercising the parser, flattener, and
//! validator together.

use conflux_graph::{flatten, parse, validate, Connection, ConnectionSource, Endpoint, Export, Graph, GraphError};
use conflux_library::{Entry, EntryPort, Library};

fn elementary(name: &str, inports: &[&str], outports: &[&str]) -> Entry {
    let port = |n: &str| EntryPort {
        name: n.to_string(),
        type_tag: "any".to_string(),
        description: String::new(),
        required: false,
        addressable: false,
    };
    Entry {
        name: name.to_string(),
        description: String::new(),
        executable_path: format!("/bin/{}", name.replace('/', "_")),
        elementary: true,
        inports: inports.iter().map(|p| port(p)).collect(),
        outports: outports.iter().map(|p| port(p)).collect(),
    }
}

fn no_subgraphs(_: &str) -> Result<Graph, GraphError> {
    panic!("this scenario does not reference any subgraph component")
}

/// S1 — an IIP with no target is parseable and yields no connections.
#[test]
fn s1_iip_only() {
    let graph = parse::fbp::parse("'5s'").unwrap();
    assert_eq!(graph.processes.len(), 0);
    assert_eq!(graph.connections.len(), 0);
}

/// S2 — tick-logger: 3 processes, 3 connections including one IIP.
#[test]
fn s2_tick_logger() {
    let source = "'5s' -> INTERVAL Ticker(core/ticker) OUT -> IN Forward(core/passthru)\n\
                   Forward OUT -> IN Log(core/console)\n";
    let graph = parse::fbp::parse(source).unwrap();
    assert_eq!(graph.processes.len(), 3);
    assert_eq!(graph.connections.len(), 3);
    assert!(graph.connections.iter().any(|c| c.is_iip()));

    let mut library = Library::new("test");
    library.add(elementary("core/ticker", &["INTERVAL"], &["OUT"]), false).unwrap();
    library.add(elementary("core/passthru", &["IN"], &["OUT"]), false).unwrap();
    library.add(elementary("core/console", &["IN"], &[]), false).unwrap();

    let flattened = flatten::flatten(&graph, &library, &no_subgraphs).unwrap();
    assert_eq!(flattened.processes.len(), 3);
    validate::validate(&flattened, &library).unwrap();
}

/// S3 — a one-liner chain parses to 4 connections (one per `->` hop) and 0
/// declared components; validating against an empty library surfaces the
/// expected unknown-component error rather than panicking.
#[test]
fn s3_one_liner_chain_parses_but_fails_validation() {
    let source = "Demo OUT -> IN Process RESULT -> INPUT Visualize DISPLAY -> IN Console LOG -> IN D1";
    let graph = parse::fbp::parse(source).unwrap();
    assert_eq!(graph.connections.len(), 4);
    assert!(graph.processes.values().all(|p| p.component.is_empty()));

    let library = Library::new("test");
    let flattened = flatten::flatten(&graph, &library, &no_subgraphs).unwrap();
    let err = validate::validate(&flattened, &library).unwrap_err();
    assert!(matches!(err, GraphError::UnknownComponent(..)));
}

/// S4 — array ports: 3 processes, 4 connections, indices preserved per endpoint.
#[test]
fn s4_array_ports() {
    let source = "'pattern1' -> IN[0] Router(router)\n\
                   Router OUT[0] -> IN Log1(console)\n\
                   'pattern2' -> IN[1] Router\n\
                   Router OUT[1] -> IN Log2(console)\n";
    let graph = parse::fbp::parse(source).unwrap();
    assert_eq!(graph.processes.len(), 3);
    assert_eq!(graph.connections.len(), 4);

    let indices: Vec<Option<u32>> = graph
        .connections
        .iter()
        .filter(|c| c.target.process == "Router")
        .map(|c| c.target.index)
        .collect();
    assert_eq!(indices, vec![Some(0), Some(1)]);
}

/// S5 — exported ports / subgraph: after flattening, a connection aimed at
/// the subgraph's exported `FILENAME` inport rewrites to `Sub_Read.IN`.
#[test]
fn s5_subgraph_export_rewrite() {
    let mut inner = Graph::new();
    inner.declare_process("Read", "core/file_reader");
    inner.inports.push(Export {
        public: "FILENAME".to_string(),
        private: Endpoint::new("Read", "IN", None),
    });

    let mut parent = Graph::new();
    parent.declare_process("Sub", "app/reader_sub");
    parent
        .connections
        .push(Connection::seeded("input.txt", Endpoint::new("Sub", "FILENAME", None)));

    let mut library = Library::new("test");
    library.add(elementary("core/file_reader", &["IN"], &[]), false).unwrap();
    library
        .add(
            Entry {
                name: "app/reader_sub".to_string(),
                description: String::new(),
                executable_path: "reader_sub.fbp".to_string(),
                elementary: false,
                inports: vec![],
                outports: vec![],
            },
            false,
        )
        .unwrap();

    let loader = move |path: &str| -> Result<Graph, GraphError> {
        assert_eq!(path, "reader_sub.fbp");
        Ok(inner.clone())
    };
    let flattened = flatten::flatten(&parent, &library, &loader).unwrap();

    assert!(flattened.processes.contains_key("Sub_Read"));
    assert_eq!(flattened.connections[0].target, Endpoint::new("Sub_Read", "IN", None));
    assert!(matches!(
        &flattened.connections[0].source,
        ConnectionSource::Iip(data) if data == "input.txt"
    ));
}

/// Property #2 — a graph expressed in both FBP and JSON forms parses to
/// deeply equal Graph Models.
#[test]
fn property_parser_model_equivalence() {
    let fbp_source = "'5s' -> INTERVAL Ticker(core/ticker) OUT -> IN Log(core/console)\n";
    let json_source = r#"{
        "processes": {
            "Ticker": {"component": "core/ticker"},
            "Log": {"component": "core/console"}
        },
        "connections": [
            {"src": {"data": "5s"}, "tgt": {"process": "Ticker", "port": "INTERVAL"}},
            {"src": {"process": "Ticker", "port": "OUT"}, "tgt": {"process": "Log", "port": "IN"}}
        ]
    }"#;

    let from_fbp = parse::fbp::parse(fbp_source).unwrap();
    let from_json = parse::json::parse(json_source).unwrap();
    assert!(conflux_graph::model::graphs_semantically_equal(&from_fbp, &from_json));
}

/// Property #3 — flattening is idempotent once no subgraph processes remain.
#[test]
fn property_flatten_is_idempotent() {
    let graph = parse::fbp::parse("'5s' -> INTERVAL Ticker(core/ticker) OUT -> IN Log(core/console)\n").unwrap();
    let mut library = Library::new("test");
    library.add(elementary("core/ticker", &["INTERVAL"], &["OUT"]), false).unwrap();
    library.add(elementary("core/console", &["IN"], &[]), false).unwrap();

    let once = flatten::flatten(&graph, &library, &no_subgraphs).unwrap();
    let twice = flatten::flatten(&once, &library, &no_subgraphs).unwrap();
    assert_eq!(once, twice);
}
