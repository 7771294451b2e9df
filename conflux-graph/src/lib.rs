//! Graph Model, FBP/JSON parsers, subgraph flattener, and validation.

pub mod error;
pub mod flatten;
pub mod model;
pub mod parse;
pub mod validate;

pub use error::{GraphError, ParseError, SourcePos};
pub use flatten::{flatten, SubgraphLoader};
pub use model::{Connection, ConnectionSource, Endpoint, Export, Graph, Process};
pub use validate::validate;

/// Load a graph from a file, dispatching on extension the way `conflux run`
/// resolves a `--file` argument: `.json` decodes structurally, anything
/// else (conventionally `.fbp`) goes through the text grammar.
pub fn load_file(path: &std::path::Path) -> Result<Graph, ParseError> {
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        parse::json::parse(&source)
    } else {
        parse::fbp::parse(&source)
    }
}
