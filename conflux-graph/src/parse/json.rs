//! Structural JSON decode of the graph schema (spec §4.3, §4.3a).
//!
//! The wire shape mirrors the FBP DSL 1:1 — a properties map, a processes
//! map, a connections array, and inport/outport export arrays — so this
//! module is a thin `serde` layer rather than a second parser.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::model::{Connection, ConnectionSource, Endpoint, Export, Graph, Process};

#[derive(Debug, Deserialize, Serialize)]
struct JsonGraph {
    #[serde(default)]
    properties: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    processes: std::collections::BTreeMap<String, JsonProcess>,
    #[serde(default)]
    connections: Vec<JsonConnection>,
    #[serde(default)]
    inports: Vec<JsonExport>,
    #[serde(default)]
    outports: Vec<JsonExport>,
    /// §4.3a: optional sibling library index path, used by `conflux run`
    /// to resolve a `--file`-less invocation. Not part of the Graph Model
    /// proper — carried through only for the CLI to read back out.
    #[serde(default)]
    library: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct JsonProcess {
    component: String,
    #[serde(default)]
    metadata: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct JsonEndpoint {
    process: String,
    port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum JsonSource {
    Iip { data: String },
    Wired(JsonEndpoint),
}

#[derive(Debug, Deserialize, Serialize)]
struct JsonConnection {
    src: JsonSource,
    tgt: JsonEndpoint,
    #[serde(default)]
    metadata: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct JsonExport {
    public: String,
    process: String,
    port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<u32>,
}

pub fn parse(source: &str) -> Result<Graph, ParseError> {
    let doc: JsonGraph = serde_json::from_str(source)?;
    Ok(Graph {
        properties: doc.properties,
        processes: doc
            .processes
            .into_iter()
            .map(|(name, p)| {
                (
                    name,
                    Process {
                        component: p.component,
                        metadata: p.metadata,
                    },
                )
            })
            .collect(),
        connections: doc
            .connections
            .into_iter()
            .map(|c| Connection {
                source: match c.src {
                    JsonSource::Iip { data } => ConnectionSource::Iip(data),
                    JsonSource::Wired(e) => ConnectionSource::Endpoint(Endpoint::new(e.process, e.port, e.index)),
                },
                target: Endpoint::new(c.tgt.process, c.tgt.port, c.tgt.index),
                metadata: c.metadata,
            })
            .collect(),
        inports: doc.inports.into_iter().map(export_from_json).collect(),
        outports: doc.outports.into_iter().map(export_from_json).collect(),
    })
}

fn export_from_json(e: JsonExport) -> Export {
    Export {
        public: e.public,
        private: Endpoint::new(e.process, e.port, e.index),
    }
}

/// Serialize a `Graph` back to the same JSON schema `parse` reads.
pub fn to_string_pretty(graph: &Graph) -> Result<String, ParseError> {
    let doc = JsonGraph {
        properties: graph.properties.clone(),
        processes: graph
            .processes
            .iter()
            .map(|(name, p)| {
                (
                    name.clone(),
                    JsonProcess {
                        component: p.component.clone(),
                        metadata: p.metadata.clone(),
                    },
                )
            })
            .collect(),
        connections: graph
            .connections
            .iter()
            .map(|c| JsonConnection {
                src: match &c.source {
                    ConnectionSource::Iip(data) => JsonSource::Iip { data: data.clone() },
                    ConnectionSource::Endpoint(e) => JsonSource::Wired(JsonEndpoint {
                        process: e.process.clone(),
                        port: e.port.clone(),
                        index: e.index,
                    }),
                },
                tgt: JsonEndpoint {
                    process: c.target.process.clone(),
                    port: c.target.port.clone(),
                    index: c.target.index,
                },
                metadata: c.metadata.clone(),
            })
            .collect(),
        inports: graph.inports.iter().map(export_to_json).collect(),
        outports: graph.outports.iter().map(export_to_json).collect(),
        library: None,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn export_to_json(e: &Export) -> JsonExport {
    JsonExport {
        public: e.public.clone(),
        process: e.private.process.clone(),
        port: e.private.port.clone(),
        index: e.private.index,
    }
}
