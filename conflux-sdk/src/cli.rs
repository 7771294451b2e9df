//! Parses the fixed CLI surface every elementary component executable
//! accepts (spec §4.8 point 1): `--port.<name>=<addr>[,<addr>...]`,
//! `--json`, `--debug`. Port names are open-ended, so this is a small
//! hand-rolled scan rather than a `clap` derive — `conflux-cli` has a
//! fixed flag set and uses `clap` there instead.

use std::collections::HashMap;

use crate::error::SdkError;

/// The component's view of its own invocation: which addresses it was
/// handed for which ports, plus the two boolean switches.
#[derive(Debug, Clone, Default)]
pub struct ComponentArgs {
    ports: HashMap<String, Vec<String>>,
    pub json: bool,
    pub debug: bool,
}

impl ComponentArgs {
    /// Parse `std::env::args()` (skipping argv[0]).
    pub fn from_env() -> Result<Self, SdkError> {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, SdkError> {
        let mut ports = HashMap::new();
        let mut json = false;
        let mut debug = false;

        for arg in args {
            if arg == "--json" {
                json = true;
            } else if arg == "--debug" {
                debug = true;
            } else if let Some(rest) = arg.strip_prefix("--port.") {
                let (name, value) = rest.split_once('=').ok_or_else(|| SdkError::MalformedPortArg {
                    name: rest.to_string(),
                    value: String::new(),
                    reason: "missing '=<address>'".to_string(),
                })?;
                if value.is_empty() {
                    return Err(SdkError::MalformedPortArg {
                        name: name.to_string(),
                        value: value.to_string(),
                        reason: "empty address list".to_string(),
                    });
                }
                let addresses = value.split(',').map(str::to_string).collect();
                ports.insert(name.to_string(), addresses);
            }
            // Unrecognized flags are ignored; a component may layer its
            // own flags (e.g. a template string) on top of this surface.
        }

        Ok(ComponentArgs { ports, json, debug })
    }

    /// The address list declared for `port`, in index order. Empty if the
    /// port was not passed on the command line (it may be optional).
    pub fn port(&self, name: &str) -> &[String] {
        self.ports.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The single address for a scalar (non-array) port.
    pub fn required_port(&self, name: &str) -> Result<&str, SdkError> {
        self.ports
            .get(name)
            .and_then(|addrs| addrs.first())
            .map(String::as_str)
            .ok_or_else(|| SdkError::MissingPort(name.to_string()))
    }
}
