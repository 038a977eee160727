use crate::config::Rule;
use crate::engine::{self, Email, Verdict};
use crate::store::RuleStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Literal source tag in the rules listing; rules only ever come from the
/// config file.
pub const RULES_SOURCE: &str = "config_file";

/// What a transport caller gets back: the verdict plus an echo of the
/// normalized (default-filled) email, so the caller can audit what was
/// actually classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub email: Email,
}

/// The full ordered rule list for the read-only introspection surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesResponse {
    pub rules: Vec<Rule>,
    pub total: usize,
    pub source: String,
}

/// Ties the rule store and the engine together. This is the seam an
/// external transport (HTTP handler, sync job) calls; it holds no state
/// beyond the resolved rules path.
pub struct Classifier {
    store: RuleStore,
}

impl Classifier {
    pub fn new(rules_path: Option<PathBuf>) -> Self {
        Classifier {
            store: RuleStore::new(rules_path),
        }
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Classify one email against the current rules file. Rules are
    /// reloaded on every call; an `Err` here means the rules file itself is
    /// structurally broken, never that the email was unclassifiable.
    pub fn classify(&self, email: Email, dry_run: bool) -> anyhow::Result<ClassifyResponse> {
        let prefix = if dry_run { "DRY RUN - " } else { "" };
        log::info!(
            "{prefix}Classifying email: from={} subject='{}' account={}",
            email.from_address,
            email.subject,
            email.account.as_str()
        );

        let rules = self.store.load()?;
        let verdict = engine::classify(&email, &rules, dry_run);

        let action_names: Vec<&str> = verdict.actions.iter().map(|a| a.as_str()).collect();
        log::info!(
            "{prefix}Classification result: category={} priority={} actions={action_names:?}",
            verdict.category.as_str(),
            verdict.priority.as_str()
        );

        Ok(ClassifyResponse { verdict, email })
    }

    /// The current rules, for debugging and transparency.
    pub fn rules(&self) -> anyhow::Result<RulesResponse> {
        let rules = self.store.list_rules()?;
        let total = rules.len();
        Ok(RulesResponse {
            rules,
            total,
            source: RULES_SOURCE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Category, Priority, RulesDocument};
    use crate::engine::Account;

    fn classifier_with_default_rules(dir: &tempfile::TempDir) -> Classifier {
        let path = dir.path().join("rules.json");
        RulesDocument::default()
            .to_file(path.to_str().unwrap())
            .unwrap();
        Classifier::new(Some(path))
    }

    #[test]
    fn test_response_echoes_email_fields() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = classifier_with_default_rules(&dir);

        let email = Email {
            from_address: "kunde@firma.de".to_string(),
            from_name: "Max Mustermann".to_string(),
            subject: "Anfrage AI".to_string(),
            body_preview: "Sehr geehrter Herr Müller".to_string(),
            account: Account::Business,
            ..Default::default()
        };
        let response = classifier.classify(email, false).unwrap();

        assert_eq!(response.verdict.category, Category::ClientInquiry);
        assert_eq!(response.email.from_address, "kunde@firma.de");
        assert_eq!(response.email.from_name, "Max Mustermann");
        assert_eq!(response.email.subject, "Anfrage AI");
        assert_eq!(response.email.body_preview, "Sehr geehrter Herr Müller");
        assert_eq!(response.email.account, Account::Business);
    }

    #[test]
    fn test_missing_rules_file_still_classifies() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Classifier::new(Some(dir.path().join("gone.json")));
        let response = classifier.classify(Email::default(), false).unwrap();
        assert_eq!(response.verdict.category, Category::Uncategorized);
        assert_eq!(response.verdict.priority, Priority::Medium);
    }

    #[test]
    fn test_rules_listing_shape() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = classifier_with_default_rules(&dir);
        let listing = classifier.rules().unwrap();
        assert_eq!(listing.total, listing.rules.len());
        assert_eq!(listing.total, 6);
        assert_eq!(listing.source, "config_file");
    }

    #[test]
    fn test_response_serializes_verdict_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = classifier_with_default_rules(&dir);
        let response = classifier
            .classify(Email::default(), true)
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();

        // Verdict fields sit at the top level next to the email echo.
        assert!(json.get("category").is_some());
        assert!(json.get("confidence").is_some());
        assert_eq!(json["dry_run"], serde_json::Value::Bool(true));
        assert!(json.get("email").is_some());
    }
}
