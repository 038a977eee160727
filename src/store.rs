use crate::config::Rule;

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Deployment-standard location, baked into the container image.
pub const SYSTEM_RULES_PATH: &str = "/etc/mail-triage/email_rules.json";
/// Development fallback, relative to the working directory.
pub const LOCAL_RULES_PATH: &str = "config/email_rules.json";

/// Loads the ordered rule list from disk. There is deliberately no cache:
/// every call re-reads the file, so operators can edit rules and have the
/// change picked up by the next classification without a restart.
pub struct RuleStore {
    rules_path: PathBuf,
}

impl RuleStore {
    /// Resolve the rules path once. An explicit path wins; otherwise the
    /// system path is tried first, then the development-relative one.
    pub fn new(rules_path: Option<PathBuf>) -> Self {
        let rules_path = rules_path.unwrap_or_else(|| {
            let system = PathBuf::from(SYSTEM_RULES_PATH);
            if system.exists() {
                system
            } else {
                PathBuf::from(LOCAL_RULES_PATH)
            }
        });
        RuleStore { rules_path }
    }

    pub fn path(&self) -> &Path {
        &self.rules_path
    }

    /// Read and materialize the ordered rule list.
    ///
    /// A missing or unparseable file is an operational condition, not a bug:
    /// it is logged and an empty list is returned, so every email degrades to
    /// the uncategorized fallback instead of failing the caller. A rule
    /// missing a required key is a configuration bug and propagates as an
    /// error, distinct from "no rules configured".
    pub fn load(&self) -> anyhow::Result<Vec<Rule>> {
        // Covers missing files, permission errors, and any other read fault.
        let content = match fs::read_to_string(&self.rules_path) {
            Ok(content) => content,
            Err(e) => {
                log::error!(
                    "Failed to read rules file {}: {e}",
                    self.rules_path.display()
                );
                return Ok(Vec::new());
            }
        };

        // Parse the document shell leniently: a concurrent editor mid-write
        // can leave transient garbage here, and that must never take
        // classification down.
        let doc: serde_json::Value = match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("Invalid JSON in rules file {}: {e}", self.rules_path.display());
                return Ok(Vec::new());
            }
        };

        let raw_rules = match doc.get("rules") {
            Some(serde_json::Value::Array(rules)) => rules.as_slice(),
            Some(_) => {
                log::error!(
                    "Rules file {} has a non-array 'rules' key",
                    self.rules_path.display()
                );
                return Ok(Vec::new());
            }
            None => return Ok(Vec::new()),
        };

        let mut rules = Vec::with_capacity(raw_rules.len());
        for (index, raw) in raw_rules.iter().enumerate() {
            let rule: Rule = serde_json::from_value(raw.clone()).with_context(|| {
                format!(
                    "rule #{index} in {} is structurally invalid",
                    self.rules_path.display()
                )
            })?;
            rules.push(rule);
        }

        log::debug!(
            "Loaded {} rules from {}",
            rules.len(),
            self.rules_path.display()
        );
        Ok(rules)
    }

    /// Read-only introspection surface; same reload-per-call contract.
    pub fn list_rules(&self) -> anyhow::Result<Vec<Rule>> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Category, Priority};
    use std::fs;

    fn write_rules(path: &Path, body: &str) {
        fs::write(path, body).unwrap();
    }

    fn rule_json(name: &str, category: &str) -> String {
        format!(
            r#"{{
                "name": "{name}",
                "category": "{category}",
                "priority": "low",
                "actions": ["notify"],
                "conditions": {{
                    "match_type": "any",
                    "rules": [
                        {{"field": "subject", "operator": "contains_any", "values": ["x"]}}
                    ]
                }}
            }}"#
        )
    }

    #[test]
    fn test_missing_file_yields_empty_ruleset() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(Some(dir.path().join("nonexistent.json")));
        let rules = store.load().unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_unreadable_path_yields_empty_ruleset() {
        // A directory at the rules path fails to read for a reason other
        // than "not found"; the degrade-to-empty contract still holds.
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(Some(dir.path().to_path_buf()));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_yields_empty_ruleset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        write_rules(&path, r#"{"rules": [{"name": "trunc"#);
        let store = RuleStore::new(Some(path));
        let rules = store.load().unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_missing_rules_key_yields_empty_ruleset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        write_rules(&path, r#"{"version": 2}"#);
        let store = RuleStore::new(Some(path));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_structurally_invalid_rule_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        // Second rule lacks "category" entirely.
        write_rules(
            &path,
            &format!(
                r#"{{"rules": [{}, {{"name": "broken", "priority": "low",
                   "actions": [], "conditions": {{"match_type": "any", "rules": []}}}}]}}"#,
                rule_json("ok", "invoice")
            ),
        );
        let store = RuleStore::new(Some(path));
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("rule #1"), "got: {err}");
    }

    #[test]
    fn test_rule_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        write_rules(
            &path,
            &format!(
                r#"{{"rules": [{}, {}, {}]}}"#,
                rule_json("first", "invoice"),
                rule_json("second", "newsletter"),
                rule_json("third", "personal")
            ),
        );
        let store = RuleStore::new(Some(path));
        let rules = store.load().unwrap();
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(rules[0].category, Category::Invoice);
        assert_eq!(rules[0].priority, Priority::Low);
    }

    #[test]
    fn test_edits_are_visible_on_next_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        write_rules(&path, &format!(r#"{{"rules": [{}]}}"#, rule_json("v1", "invoice")));
        let store = RuleStore::new(Some(path.clone()));
        assert_eq!(store.load().unwrap()[0].name, "v1");

        write_rules(&path, &format!(r#"{{"rules": [{}]}}"#, rule_json("v2", "personal")));
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded[0].name, "v2");
        assert_eq!(reloaded[0].category, Category::Personal);
    }

    #[test]
    fn test_deleting_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        write_rules(&path, &format!(r#"{{"rules": [{}]}}"#, rule_json("v1", "invoice")));
        let store = RuleStore::new(Some(path.clone()));
        assert_eq!(store.load().unwrap().len(), 1);

        fs::remove_file(&path).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
