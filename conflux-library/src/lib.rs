//! Component library index: `name -> executable/subgraph entry`, persisted
//! as a JSON document on disk (§4.10, §6 "Library index").

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single port declared by a library entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPort {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub addressable: bool,
}

/// Library entry: a component's metadata — elementary executable or subgraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "exec")]
    pub executable_path: String,
    pub elementary: bool,
    #[serde(default)]
    pub inports: Vec<EntryPort>,
    #[serde(default)]
    pub outports: Vec<EntryPort>,
}

impl Entry {
    /// An entry is a subgraph, not an elementary component, iff its
    /// executable path ends in `.fbp` or `.json` (§3 "Library Entry").
    pub fn is_subgraph(&self) -> bool {
        !self.elementary
    }

    pub fn from_executable_path(path: &str) -> bool {
        path.ends_with(".fbp") || path.ends_with(".json")
    }

    pub fn find_inport(&self, name: &str) -> Option<&EntryPort> {
        self.inports.iter().find(|p| p.name == name)
    }

    pub fn find_outport(&self, name: &str) -> Option<&EntryPort> {
        self.outports.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("component not found: {0}")]
    NotFound(String),
    #[error("component already registered: {0} (use --force to overwrite)")]
    AlreadyExists(String),
    #[error("failed to read library index {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write library index {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed library index: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// On-disk library index: a name -> entry map plus bookkeeping timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub components: HashMap<String, Entry>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Library {
            name: name.into(),
            created: now,
            updated: now,
            components: HashMap::new(),
        }
    }

    /// Load a library index from disk, or return a fresh empty one if the
    /// file doesn't exist (mirrors the original CLI's register-on-first-use
    /// behavior).
    pub fn load_or_new(path: &Path, default_name: &str) -> Result<Self, LibraryError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Library::new(default_name)),
            Err(source) => Err(LibraryError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes).map_err(|source| LibraryError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Insert `entry`, failing unless `force` or the name is new.
    pub fn add(&mut self, entry: Entry, force: bool) -> Result<(), LibraryError> {
        if !force && self.components.contains_key(&entry.name) {
            return Err(LibraryError::AlreadyExists(entry.name));
        }
        self.components.insert(entry.name.clone(), entry);
        self.updated = Utc::now();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Entry, LibraryError> {
        self.components
            .get(name)
            .ok_or_else(|| LibraryError::NotFound(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &Entry> {
        self.components.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(name: &str) -> Entry {
        Entry {
            name: name.to_string(),
            description: "a component".to_string(),
            executable_path: "/bin/echo".to_string(),
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

    #[test]
    fn add_then_get_round_trips() {
        let mut lib = Library::new("test");
        lib.add(sample_entry("core/console"), false).unwrap();
        let entry = lib.get("core/console").unwrap();
        assert_eq!(entry.name, "core/console");
        assert!(entry.find_inport("IN").is_some());
        assert!(entry.find_inport("NOPE").is_none());
    }

    #[test]
    fn add_without_force_rejects_duplicate() {
        let mut lib = Library::new("test");
        lib.add(sample_entry("dup"), false).unwrap();
        let err = lib.add(sample_entry("dup"), false).unwrap_err();
        assert!(matches!(err, LibraryError::AlreadyExists(name) if name == "dup"));
    }

    #[test]
    fn add_with_force_overwrites() {
        let mut lib = Library::new("test");
        lib.add(sample_entry("dup"), false).unwrap();
        let mut replacement = sample_entry("dup");
        replacement.description = "replaced".to_string();
        lib.add(replacement, true).unwrap();
        assert_eq!(lib.get("dup").unwrap().description, "replaced");
    }

    #[test]
    fn subgraph_detection_is_by_executable_suffix() {
        assert!(Entry::from_executable_path("net.fbp"));
        assert!(Entry::from_executable_path("net.json"));
        assert!(!Entry::from_executable_path("/usr/bin/console"));
    }
}
