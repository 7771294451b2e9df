//! Error types for parsing, flattening, and validating a graph.

use thiserror::Error;

/// A 1-indexed source position, reported the way a text editor would.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for SourcePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{pos}: {message}")]
    Syntax { pos: SourcePos, message: String },
    #[error("malformed graph JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read graph file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("subgraph expansion did not terminate (possible self-referential subgraph involving {0:?})")]
    NonTerminatingSubgraph(Vec<String>),
    #[error("component {0:?} referenced by process {1:?} is not in the library")]
    UnknownComponent(String, String),
    #[error("connection references unknown process {0:?}")]
    UnknownProcess(String),
    #[error("connection targets port {port:?} on process {process:?}, which {component:?} does not declare as an inport")]
    UnknownInport {
        process: String,
        component: String,
        port: String,
    },
    #[error("connection sources port {port:?} on process {process:?}, which {component:?} does not declare as an outport")]
    UnknownOutport {
        process: String,
        component: String,
        port: String,
    },
    #[error("export {0:?} refers to unknown endpoint {1}.{2}")]
    UnknownExportTarget(String, String, String),
}
