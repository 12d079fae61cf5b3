// src/core/config/migrations.rs

//! # Config Migrations
//!
//! An ordered chain of pure byte-to-byte rewrites. Each step parses the YAML document,
//! stamps the new version, adds or moves fields, and serializes it again. Keys a step does
//! not know about are carried over untouched.

use super::ConfigError;
use serde_yaml::{Mapping, Value};

pub type MigrationFn = fn(&[u8]) -> Result<Vec<u8>, ConfigError>;

pub struct Migrator {
    pub from: &'static str,
    pub to: &'static str,
    pub apply: MigrationFn,
}

/// Every known step, oldest first. Each `to` is the next step's `from`.
pub static MIGRATORS: &[Migrator] = &[
    Migrator {
        from: "1.0.0",
        to: "1.1.0",
        apply: migrate_1_0_0_to_1_1_0,
    },
    Migrator {
        from: "1.1.0",
        to: "1.1.1",
        apply: migrate_1_1_0_to_1_1_1,
    },
    Migrator {
        from: "1.1.1",
        to: "1.1.2",
        apply: migrate_1_1_1_to_1_1_2,
    },
];

/// Returns the steps needed to bring a `version` document up to date.
/// The head of the chain must start exactly at `version`.
pub fn chain_from(version: &str) -> Result<&'static [Migrator], ConfigError> {
    let start = MIGRATORS
        .iter()
        .position(|m| m.from == version)
        .ok_or_else(|| ConfigError::NoMigrationPath(version.to_string()))?;
    Ok(MIGRATORS.get(start..).unwrap_or_default())
}

/// Runs `chain` over `input`. A failing step aborts the whole chain.
pub fn run_chain(input: &[u8], chain: &[Migrator]) -> Result<Vec<u8>, ConfigError> {
    let Some(head) = chain.first() else {
        return Ok(input.to_vec());
    };
    let current = document_version(input)?;
    if current != head.from {
        return Err(ConfigError::NoMigrationPath(current));
    }

    let mut bytes = input.to_vec();
    for migrator in chain {
        log::info!("Migrating config from {} to {}", migrator.from, migrator.to);
        bytes = (migrator.apply)(&bytes).map_err(|e| ConfigError::MigrationFailed {
            from: migrator.from.to_string(),
            to: migrator.to.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(bytes)
}

/// Reads the `version` field of a raw document. Unquoted numeric versions are accepted.
pub fn document_version(input: &[u8]) -> Result<String, ConfigError> {
    let document: Value = serde_yaml::from_slice(input)?;
    match document.get("version") {
        Some(Value::String(version)) => Ok(version.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        _ => Err(ConfigError::Invalid("missing 'version' field".to_string())),
    }
}

// --- STEPS ---

/// Moves the legacy top-level `config.shell` into `config.scripts.shell`.
fn migrate_1_0_0_to_1_1_0(input: &[u8]) -> Result<Vec<u8>, ConfigError> {
    let mut document = load_document(input)?;
    set_version(&mut document, "1.1.0");

    let config = child_mapping(&mut document, "config")?;
    if let Some(shell) = config.remove("shell") {
        let scripts = child_mapping(config, "scripts")?;
        if !scripts.contains_key("shell") {
            scripts.insert(Value::from("shell"), shell);
        }
    }
    save_document(&document)
}

/// Hides the key map and fills the script defaults that older versions left implicit.
fn migrate_1_1_0_to_1_1_1(input: &[u8]) -> Result<Vec<u8>, ConfigError> {
    let mut document = load_document(input)?;
    set_version(&mut document, "1.1.1");

    let config = child_mapping(&mut document, "config")?;
    let style = child_mapping(config, "style")?;
    style.insert(Value::from("hideKeyMap"), Value::Bool(true));

    let scripts = child_mapping(config, "scripts")?;
    insert_missing(scripts, "shell", Value::from("/bin/zsh"));
    insert_missing(scripts, "parameterMode", Value::from("SET"));
    insert_missing(scripts, "removeComments", Value::Bool(true));
    save_document(&document)
}

/// Introduces the assistant section.
fn migrate_1_1_1_to_1_1_2(input: &[u8]) -> Result<Vec<u8>, ConfigError> {
    let mut document = load_document(input)?;
    set_version(&mut document, "1.1.2");

    let config = child_mapping(&mut document, "config")?;
    child_mapping(config, "ai")?;
    save_document(&document)
}

// --- DOCUMENT HELPERS ---

fn load_document(input: &[u8]) -> Result<Mapping, ConfigError> {
    match serde_yaml::from_slice::<Value>(input)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::Invalid(
            "the document root is not a mapping".to_string(),
        )),
    }
}

fn save_document(document: &Mapping) -> Result<Vec<u8>, ConfigError> {
    Ok(serde_yaml::to_string(document)?.into_bytes())
}

fn set_version(document: &mut Mapping, version: &str) {
    document.insert(Value::from("version"), Value::from(version));
}

fn insert_missing(mapping: &mut Mapping, key: &str, value: Value) {
    let slot = mapping.entry(Value::from(key)).or_insert(Value::Null);
    if slot.is_null() {
        *slot = value;
    }
}

/// Returns the mapping stored under `name`, replacing a missing or scalar value with an empty one.
fn child_mapping<'a>(parent: &'a mut Mapping, name: &str) -> Result<&'a mut Mapping, ConfigError> {
    let slot = parent.entry(Value::from(name)).or_insert(Value::Null);
    if !slot.is_mapping() {
        *slot = Value::Mapping(Mapping::new());
    }
    slot.as_mapping_mut()
        .ok_or_else(|| ConfigError::Invalid(format!("'{}' is not a mapping", name)))
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CURRENT_CONFIG_VERSION;
    use crate::core::config::model::ConfigFile;
    use crate::models::ParamMode;
    use pretty_assertions::assert_eq;

    fn migrate(input: &str) -> Value {
        let version = document_version(input.as_bytes()).unwrap();
        let chain = chain_from(&version).unwrap();
        let output = run_chain(input.as_bytes(), chain).unwrap();
        serde_yaml::from_slice(&output).unwrap()
    }

    #[test]
    fn test_chain_is_contiguous_and_ends_at_current() {
        for pair in MIGRATORS.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        assert_eq!(MIGRATORS.last().unwrap().to, CURRENT_CONFIG_VERSION);
    }

    #[test]
    fn test_migrate_1_1_0_to_current() {
        let doc = migrate("version: \"1.1.0\"\nconfig:\n  style:\n    theme: dracula\n");
        assert_eq!(doc["version"], Value::from("1.1.2"));
        let config = &doc["config"];
        assert_eq!(config["style"]["theme"], Value::from("dracula"));
        assert_eq!(config["style"]["hideKeyMap"], Value::Bool(true));
        assert_eq!(config["scripts"]["shell"], Value::from("/bin/zsh"));
        assert_eq!(config["scripts"]["parameterMode"], Value::from("SET"));
        assert_eq!(config["scripts"]["removeComments"], Value::Bool(true));
        assert_eq!(config["ai"], Value::Mapping(Mapping::new()));
    }

    #[test]
    fn test_migrate_1_0_0_moves_shell() {
        let doc = migrate("version: 1.0.0\nconfig:\n  shell: /bin/fish\n  editor: nano\n");
        let config = &doc["config"];
        assert!(config.get("shell").is_none());
        assert_eq!(config["scripts"]["shell"], Value::from("/bin/fish"));
        assert_eq!(config["editor"], Value::from("nano"));
    }

    #[test]
    fn test_existing_script_values_are_kept() {
        let doc = migrate(
            "version: 1.1.0\nconfig:\n  scripts:\n    parameterMode: REPLACE\n    removeComments: false\n",
        );
        assert_eq!(doc["config"]["scripts"]["parameterMode"], Value::from("REPLACE"));
        assert_eq!(doc["config"]["scripts"]["removeComments"], Value::Bool(false));
        assert_eq!(doc["config"]["scripts"]["shell"], Value::from("/bin/zsh"));
    }

    #[test]
    fn test_unknown_keys_survive() {
        let doc = migrate("version: 1.1.1\nconfig:\n  custom:\n    answer: 42\n");
        assert_eq!(doc["config"]["custom"]["answer"].as_u64(), Some(42));
    }

    #[test]
    fn test_migrated_documents_round_trip_through_schema() {
        let inputs = [
            "version: 1.0.0\nconfig:\n  shell: /bin/bash\n",
            "version: 1.1.0\nconfig:\n  style:\n    theme: dracula\n",
            "version: 1.1.1\nconfig: {}\n",
        ];
        for input in inputs {
            let chain = chain_from(&document_version(input.as_bytes()).unwrap()).unwrap();
            let output = run_chain(input.as_bytes(), chain).unwrap();
            let parsed: ConfigFile = serde_yaml::from_slice(&output).unwrap();
            let reparsed: ConfigFile =
                serde_yaml::from_str(&serde_yaml::to_string(&parsed).unwrap()).unwrap();
            assert_eq!(parsed, reparsed);
            assert_eq!(parsed.version, CURRENT_CONFIG_VERSION);
            assert_eq!(parsed.config.scripts.parameter_mode, ParamMode::Set);
        }
    }

    #[test]
    fn test_refuses_mismatched_head() {
        let chain = chain_from("1.1.1").unwrap();
        let result = run_chain(b"version: 1.1.0\nconfig: {}\n", chain);
        assert!(matches!(result, Err(ConfigError::NoMigrationPath(v)) if v == "1.1.0"));
    }

    #[test]
    fn test_unknown_version_has_no_chain() {
        assert!(matches!(chain_from("0.9.0"), Err(ConfigError::NoMigrationPath(_))));
    }

    #[test]
    fn test_failing_step_aborts_chain() {
        fn broken(_: &[u8]) -> Result<Vec<u8>, ConfigError> {
            Err(ConfigError::Invalid("boom".to_string()))
        }
        let chain = [
            Migrator {
                from: "1.1.0",
                to: "1.1.1",
                apply: migrate_1_1_0_to_1_1_1,
            },
            Migrator {
                from: "1.1.1",
                to: "1.1.2",
                apply: broken,
            },
        ];
        let result = run_chain(b"version: 1.1.0\n", &chain);
        assert!(matches!(result, Err(ConfigError::MigrationFailed { ref to, .. }) if to == "1.1.2"));
    }
}
