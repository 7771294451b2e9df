//! `cargo xtask check-graphs`: batch-validate every `.fbp`/`.json` graph
//! under a directory against a library index, the same parse -> flatten
//! -> validate pipeline `conflux run --dry` uses for one graph at a time.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use conflux_graph::{Graph, GraphError};
use conflux_library::Library;

pub fn run(dir: PathBuf, library_path: PathBuf) -> Result<()> {
    let library = Library::load_or_new(&library_path, "conflux")
        .with_context(|| format!("loading library index {}", library_path.display()))?;

    let mut checked = 0usize;
    let mut failed = 0usize;
    walk(&dir, &mut |path| {
        checked += 1;
        match check_one(path, &library) {
            Ok(()) => println!("ok    {}", path.display()),
            Err(e) => {
                failed += 1;
                println!("FAIL  {}: {e}", path.display());
            }
        }
    })?;

    println!("{checked} graph(s) checked, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} graph(s) failed validation");
    }
    Ok(())
}

fn walk(dir: &Path, on_graph_file: &mut impl FnMut(&Path)) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, on_graph_file)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("fbp") || path.extension().and_then(|e| e.to_str()) == Some("json") {
            on_graph_file(&path);
        }
    }
    Ok(())
}

fn check_one(path: &Path, library: &Library) -> Result<()> {
    let graph = conflux_graph::load_file(path)?;
    let flattened = conflux_graph::flatten(&graph, library, &load_subgraph)?;
    conflux_graph::validate(&flattened, library)?;
    Ok(())
}

fn load_subgraph(path: &str) -> Result<Graph, GraphError> {
    conflux_graph::load_file(Path::new(path)).map_err(GraphError::from)
}
