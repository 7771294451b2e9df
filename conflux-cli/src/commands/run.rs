use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use conflux_graph::{Graph, GraphError};
use conflux_library::Library;
use conflux_runtime::Runtime;

/// Load, flatten, validate, plan, and (unless `--dry`) run a graph.
/// Returns the process exit code (spec §6 "Exit status").
pub async fn run(graph_file: &Path, library_path: &PathBuf, port: u16, dry: bool, debug: bool) -> Result<i32> {
    let library = Library::load_or_new(library_path, "conflux")
        .with_context(|| format!("loading library index {}", library_path.display()))?;

    let graph = match conflux_graph::load_file(graph_file) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("parse error: {e}");
            return Ok(1);
        }
    };

    let flattened = match conflux_graph::flatten(&graph, &library, &load_subgraph) {
        Ok(flattened) => flattened,
        Err(e) => {
            eprintln!("flatten error: {e}");
            return Ok(1);
        }
    };

    if let Err(e) = conflux_graph::validate(&flattened, &library) {
        eprintln!("validation error: {e}");
        return Ok(1);
    }

    if dry {
        println!(
            "graph OK: {} processes, {} connections",
            flattened.processes.len(),
            flattened.connections.len()
        );
        return Ok(0);
    }

    let plan = conflux_planner::plan(&flattened, port);
    if debug {
        tracing::debug!(?plan, "planned endpoint addresses");
    }

    let mut runtime = Runtime::new();
    if let Err(e) = runtime.run(&flattened, &plan, &library, debug).await {
        eprintln!("runtime error: {e}");
        return Ok(1);
    }

    Ok(0)
}

fn load_subgraph(path: &str) -> Result<Graph, GraphError> {
    conflux_graph::load_file(Path::new(path)).map_err(GraphError::from)
}
