/*!
shared.rs - session bootstrap shared by every subcommand.

Focus:
  - Manifest: optional YAML/JSON file declaring extra commands + profiler knobs
  - build_registry: built-ins first, then manifest commands bound to named handlers
  - Session: registry + resource counters + sampler thread, owned by main

Nothing here is global: main builds one Session and hands it to the
subcommand it runs.
*/

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cmd::builtin::{HANDLER_NAMES, register_builtins, resolve};
use crate::runtime::{Dispatcher, Registry, Sampler, Settings, SharedUsage};

pub const MANIFEST_ENV: &str = "CMDSPEC_MANIFEST";
pub const DEFAULT_HANDLER: &str = "describe";
const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/* ---- Manifest ---- */

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub profile: Option<bool>,
    #[serde(default)]
    pub noise_floor_ms: Option<u64>,
    #[serde(default)]
    pub sample_interval_ms: Option<u64>,
    #[serde(default)]
    pub commands: Vec<ManifestCommand>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestCommand {
    pub name: String,
    #[serde(default)]
    pub spec: String,
    #[serde(default)]
    pub handler: Option<String>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("command '{command}' names unknown handler '{handler}' (known: {known})")]
    UnknownHandler {
        command: String,
        handler: String,
        known: String,
    },
    #[error("manifest entry #{index} has an empty command name")]
    EmptyName { index: usize },
}

/// Load a manifest; `.yaml`/`.yml` parse as YAML, anything else as JSON.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let manifest = if is_yaml {
        serde_yaml::from_str(&raw).context("failed to parse YAML manifest")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON manifest")?
    };
    Ok(manifest)
}

/// Built-ins, then every manifest command in file order.
pub fn build_registry(manifest: &Manifest) -> Result<Registry> {
    let mut registry = Registry::new();
    register_builtins(&mut registry);

    for (index, entry) in manifest.commands.iter().enumerate() {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(ManifestError::EmptyName { index }.into());
        }
        let handler_name = entry.handler.as_deref().unwrap_or(DEFAULT_HANDLER);
        let handler = resolve(handler_name).ok_or_else(|| ManifestError::UnknownHandler {
            command: name.to_string(),
            handler: handler_name.to_string(),
            known: HANDLER_NAMES.join(", "),
        })?;
        let spec = registry.register(name, &entry.spec, handler);
        debug!(
            command = name,
            handler = handler_name,
            options = spec.options.len(),
            "registered manifest command"
        );
    }
    Ok(registry)
}

/* ---- Session ---- */

/// Everything one CLI invocation needs to dispatch commands.
pub struct Session {
    pub registry: Registry,
    pub usage: Arc<SharedUsage>,
    pub settings: Settings,
    pub source: Option<String>,
    _sampler: Option<Sampler>,
}

impl Session {
    /// `manifest_path` wins over `CMDSPEC_MANIFEST`; `no_profile` wins over
    /// the manifest's `profile` key.
    pub fn open(manifest_path: Option<&str>, no_profile: bool) -> Result<Self> {
        let path = manifest_path.map(str::to_string).or_else(|| {
            std::env::var(MANIFEST_ENV)
                .ok()
                .filter(|s| !s.trim().is_empty())
        });

        let manifest = match &path {
            Some(p) => load_manifest(Path::new(p))?,
            None => Manifest::default(),
        };
        let mut session = Self::from_manifest(&manifest, no_profile)?;
        session.source = path;
        Ok(session)
    }

    pub fn from_manifest(manifest: &Manifest, no_profile: bool) -> Result<Self> {
        let registry = build_registry(manifest)?;

        let mut settings = Settings::default();
        if let Some(profile) = manifest.profile {
            settings.profile = profile;
        }
        if no_profile {
            settings.profile = false;
        }
        if let Some(ms) = manifest.noise_floor_ms {
            settings.noise_floor = Duration::from_millis(ms);
        }

        let usage = Arc::new(SharedUsage::new());
        let sampler = if settings.profile {
            let interval = manifest
                .sample_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SAMPLE_INTERVAL);
            match Sampler::spawn(Arc::clone(&usage), interval) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("resource sampler unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            registry,
            usage,
            settings,
            source: None,
            _sampler: sampler,
        })
    }

    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(&self.registry, Arc::clone(&self.usage), self.settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn yaml_manifest_registers_commands() {
        let file = write_manifest(
            ".yaml",
            r#"
profile: false
noise_floor_ms: 5
commands:
  - name: place_cell
    spec: "<cell> -orient N|S -fixed"
  - name: ping
    handler: noop
"#,
        );
        let manifest = load_manifest(file.path()).unwrap();
        assert_eq!(manifest.commands.len(), 2);

        let session = Session::from_manifest(&manifest, false).unwrap();
        assert!(!session.settings.profile);
        assert_eq!(session.settings.noise_floor, Duration::from_millis(5));
        assert!(session.registry.lookup("place_cell").is_some());
        assert!(session.registry.lookup("echo").is_some());
    }

    #[test]
    fn json_manifest_by_extension() {
        let file = write_manifest(
            ".json",
            r#"{"commands":[{"name":"area","spec":"<w> <h>","handler":"echo"}]}"#,
        );
        let manifest = load_manifest(file.path()).unwrap();
        assert_eq!(manifest.commands[0].name, "area");
        assert_eq!(manifest.commands[0].handler.as_deref(), Some("echo"));
    }

    #[test]
    fn bad_manifest_reports_parse_error() {
        let file = write_manifest(".json", "{ not json");
        let err = load_manifest(file.path()).unwrap_err();
        assert!(err.to_string().contains("JSON manifest"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_manifest(".yaml", "commandz: []\n");
        assert!(load_manifest(file.path()).is_err());
    }

    #[test]
    fn unknown_handler_is_an_error() {
        let manifest = Manifest {
            commands: vec![ManifestCommand {
                name: "x".into(),
                spec: String::new(),
                handler: Some("launch".into()),
            }],
            ..Manifest::default()
        };
        let err = build_registry(&manifest).unwrap_err();
        let err = err.downcast::<ManifestError>().unwrap();
        assert!(matches!(err, ManifestError::UnknownHandler { .. }));
        assert!(err.to_string().contains("known: describe, echo, noop"));
    }

    #[test]
    fn empty_name_is_an_error() {
        let manifest = Manifest {
            commands: vec![ManifestCommand {
                name: "  ".into(),
                spec: String::new(),
                handler: None,
            }],
            ..Manifest::default()
        };
        assert!(build_registry(&manifest).is_err());
    }

    #[test]
    fn no_profile_flag_overrides_manifest() {
        let manifest = Manifest {
            profile: Some(true),
            ..Manifest::default()
        };
        let session = Session::from_manifest(&manifest, true).unwrap();
        assert!(!session.settings.profile);
    }

    #[test]
    fn dispatcher_sees_manifest_commands() {
        let manifest = Manifest {
            profile: Some(false),
            commands: vec![ManifestCommand {
                name: "place_cell".into(),
                spec: "<cell> -fixed".into(),
                handler: None,
            }],
            ..Manifest::default()
        };
        let session = Session::from_manifest(&manifest, false).unwrap();
        let mut d = session.dispatcher();
        let out = d.execute_line("place_cell u7 -fixed").unwrap().unwrap();
        assert!(matches!(
            out,
            crate::runtime::Dispatch::Completed { ref output, .. }
                if output == "place_cell: <cell>=u7 -fixed=set"
        ));
    }
}
