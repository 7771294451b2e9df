//! Driver for the `.fbp` text grammar (spec §4.2, §4.2a).
//!
//! The chain-building logic mirrors the original `createLeftlet` /
//! `createMiddlet` / `createRightlet` state machine: a chain carries one
//! "pending source" (either a literal IIP or a wired endpoint) forward as
//! it consumes each `-> port node port?` hop, emitting one connection per
//! hop and replacing the pending source with the hop's outport when one
//! is present.

use std::collections::BTreeMap;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;

use crate::error::{ParseError, SourcePos};
use crate::model::{Connection, ConnectionSource, Endpoint, Export, Graph};

#[derive(PestParser)]
#[grammar = "parse/fbp.pest"]
struct FbpParser;

pub fn parse(source: &str) -> Result<Graph, ParseError> {
    let mut pairs = FbpParser::parse(Rule::file, source).map_err(pest_error_to_parse_error)?;
    let file = pairs.next().expect("grammar guarantees a `file` pair");

    let mut graph = Graph::new();
    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::statement => apply_statement(&mut graph, pair)?,
            Rule::EOI => {}
            other => unreachable!("unexpected top-level rule {other:?}"),
        }
    }
    Ok(graph)
}

fn apply_statement(graph: &mut Graph, statement: Pair<Rule>) -> Result<(), ParseError> {
    for inner in statement.into_inner() {
        match inner.as_rule() {
            Rule::inport_decl => apply_export_decl(graph, inner, true),
            Rule::outport_decl => apply_export_decl(graph, inner, false),
            Rule::export_decl => apply_export_alias(graph, inner),
            Rule::chain => apply_chain(graph, inner)?,
            other => unreachable!("unexpected statement body {other:?}"),
        }
    }
    Ok(())
}

fn apply_export_decl(graph: &mut Graph, decl: Pair<Rule>, is_inport: bool) {
    let mut inner = decl.into_inner();
    let process = inner.next().unwrap().as_str().to_string();
    let port = parse_port_ref(inner.next().unwrap());
    let public = inner.next().unwrap().as_str().to_string();

    graph.ensure_process_referenced(&process);
    let export = Export {
        public,
        private: Endpoint::new(process, port.0, port.1),
    };
    if is_inport {
        graph.inports.push(export);
    } else {
        graph.outports.push(export);
    }
}

fn apply_export_alias(graph: &mut Graph, decl: Pair<Rule>) {
    let mut inner = decl.into_inner();
    let direction = inner.next().unwrap().as_str();
    let process = inner.next().unwrap().as_str().to_string();
    let port = parse_port_ref(inner.next().unwrap());
    let public = inner.next().unwrap().as_str().to_string();

    graph.ensure_process_referenced(&process);
    let export = Export {
        public,
        private: Endpoint::new(process, port.0, port.1),
    };
    match direction {
        "IN" => graph.inports.push(export),
        "OUT" => graph.outports.push(export),
        other => unreachable!("grammar only admits IN/OUT direction, got {other:?}"),
    }
}

fn apply_chain(graph: &mut Graph, chain: Pair<Rule>) -> Result<(), ParseError> {
    let mut inner = chain.into_inner();
    let head = inner.next().expect("chain always has a head");

    let mut pending_source = Some(match head.as_rule() {
        Rule::chain_head => parse_chain_head(graph, head),
        other => unreachable!("unexpected chain head {other:?}"),
    });

    for hop in inner {
        debug_assert_eq!(hop.as_rule(), Rule::hop);
        let hop_pos = hop.as_span().start_pos().line_col();
        let source = pending_source.take().ok_or_else(|| ParseError::Syntax {
            pos: SourcePos {
                line: hop_pos.0,
                column: hop_pos.1,
            },
            message: "chain continues past a hop with no outport to carry forward".to_string(),
        })?;

        let mut hop_inner = hop.into_inner();
        let inport = parse_port_ref(hop_inner.next().unwrap());
        let node = hop_inner.next().unwrap();
        let outport = hop_inner.next().map(parse_port_ref);

        let (name, _component) = apply_node(graph, node);
        let target = Endpoint::new(name.clone(), inport.0, inport.1);
        graph.connections.push(Connection {
            source,
            target,
            metadata: BTreeMap::new(),
        });

        pending_source = outport.map(|(port, index)| ConnectionSource::Endpoint(Endpoint::new(name, port, index)));
    }
    Ok(())
}

fn parse_chain_head(graph: &mut Graph, head: Pair<Rule>) -> ConnectionSource {
    let mut inner = head.into_inner();
    let first = inner.next().expect("chain_head always has content");
    match first.as_rule() {
        Rule::literal => ConnectionSource::Iip(unescape_literal(first.as_str())),
        Rule::node => {
            let port = inner.next().expect("node head is followed by its outport");
            let (name, _component) = apply_node(graph, first);
            let (port_name, index) = parse_port_ref(port);
            ConnectionSource::Endpoint(Endpoint::new(name, port_name, index))
        }
        other => unreachable!("unexpected chain_head content {other:?}"),
    }
}

/// Declare or reference `node`, returning its name and component (empty
/// string if this occurrence carries no `(Component)` suffix).
fn apply_node(graph: &mut Graph, node: Pair<Rule>) -> (String, String) {
    debug_assert_eq!(node.as_rule(), Rule::node);
    let mut inner = node.into_inner();
    let name = inner.next().unwrap().as_str().to_string();

    match inner.next() {
        Some(suffix) => {
            let mut suffix_inner = suffix.into_inner();
            let component = suffix_inner.next().unwrap().as_str().to_string();
            let metadata = suffix_inner
                .next()
                .map(|meta| parse_metadata(meta.as_str()))
                .unwrap_or_default();
            graph.declare_component(&name, component.clone(), metadata);
            (name, component)
        }
        None => {
            graph.ensure_process_referenced(&name);
            (name, String::new())
        }
    }
}

fn parse_metadata(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| match part.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
            None => (part.trim().to_string(), String::new()),
        })
        .collect()
}

fn parse_port_ref(pair: Pair<Rule>) -> (String, Option<u32>) {
    debug_assert_eq!(pair.as_rule(), Rule::port_ref);
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let index = inner.next().map(|idx| {
        let digits = idx.into_inner().next().unwrap().as_str();
        digits.parse::<u32>().expect("grammar only admits ASCII digits")
    });
    (name, index)
}

/// Replace the single recognized escape, `\'`, with a literal quote;
/// every other backslash passes through unchanged (spec §4.2).
fn unescape_literal(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    inner.replace("\\'", "'")
}

fn pest_error_to_parse_error(err: pest::error::Error<Rule>) -> ParseError {
    let (line, column) = match err.line_col {
        pest::error::LineColLocation::Pos((l, c)) => (l, c),
        pest::error::LineColLocation::Span((l, c), _) => (l, c),
    };
    ParseError::Syntax {
        pos: SourcePos { line, column },
        message: err.variant.message().to_string(),
    }
}
