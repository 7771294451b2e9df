use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};
use conflux_library::{Entry, EntryPort, Library};
use serde::Deserialize;

/// The subset of an elementary executable's `--json` dump this CLI reads;
/// `executable_path` is filled in from the path it was discovered at,
/// never from the dump itself.
#[derive(Debug, Deserialize)]
struct JsonMetadata {
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    inports: Vec<EntryPort>,
    #[serde(default)]
    outports: Vec<EntryPort>,
}

pub fn add(path: &Path, library_path: &PathBuf, name: Option<&str>, force: bool) -> Result<()> {
    let mut library = Library::load_or_new(library_path, "conflux")?;

    if path.is_dir() {
        if name.is_some() {
            bail!("--name is only accepted when registering a single file");
        }
        let mut registered = 0usize;
        walk_and_register(path, path, &mut library, force, &mut registered)?;
        println!("registered {registered} component(s)");
    } else {
        let name = name.ok_or_else(|| anyhow!("--name is required when registering a single file"))?;
        let entry = build_entry(path, name)?;
        register(&mut library, entry, force);
    }

    library.save(library_path)?;
    Ok(())
}

fn walk_and_register(root: &Path, dir: &Path, library: &mut Library, force: bool, registered: &mut usize) -> Result<()> {
    for child in std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))? {
        let child = child?.path();
        if child.is_dir() {
            walk_and_register(root, &child, library, force, registered)?;
            continue;
        }
        let name = relative_name(root, &child);
        match build_entry(&child, &name) {
            Ok(entry) => {
                register(library, entry, force);
                *registered += 1;
            }
            Err(e) => tracing::warn!(path = %child.display(), error = %e, "skipping non-component file"),
        }
    }
    Ok(())
}

/// `components/core/console` discovered under root `components/` becomes
/// `core/console`.
fn relative_name(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let mut name: String = relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/");
    if name.ends_with(".fbp") || name.ends_with(".json") {
        if let Some(stripped) = name.rsplit_once('.') {
            name = stripped.0.to_string();
        }
    }
    name
}

fn build_entry(path: &Path, name: &str) -> Result<Entry> {
    if Entry::from_executable_path(&path.display().to_string()) {
        return Ok(Entry {
            name: name.to_string(),
            description: String::new(),
            executable_path: path.display().to_string(),
            elementary: false,
            inports: Vec::new(),
            outports: Vec::new(),
        });
    }

    let output = Command::new(path)
        .arg("--json")
        .output()
        .with_context(|| format!("invoking {} --json", path.display()))?;
    if !output.status.success() {
        bail!("{} --json exited with {}", path.display(), output.status);
    }
    let metadata: JsonMetadata = serde_json::from_slice(&output.stdout)
        .with_context(|| format!("parsing --json metadata from {}", path.display()))?;

    Ok(Entry {
        name: metadata.name.unwrap_or_else(|| name.to_string()),
        description: metadata.description,
        executable_path: path.display().to_string(),
        elementary: true,
        inports: metadata.inports,
        outports: metadata.outports,
    })
}

fn register(library: &mut Library, entry: Entry, force: bool) {
    let name = entry.name.clone();
    if let Err(e) = library.add(entry, force) {
        tracing::warn!(%name, error = %e, "keeping existing entry");
    }
}

pub fn list(library_path: &PathBuf) -> Result<()> {
    let library = Library::load_or_new(library_path, "conflux")?;
    let mut entries: Vec<&Entry> = library.list().collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    for entry in entries {
        println!("{}  {}", entry.name, entry.description);
    }
    Ok(())
}

pub fn info(name: &str, library_path: &PathBuf) -> Result<()> {
    let library = Library::load_or_new(library_path, "conflux")?;
    let entry = library.get(name)?;
    println!("{}", serde_json::to_string_pretty(entry)?);
    Ok(())
}
