use serde::{Deserialize, Serialize};

/// Classification categories. Closed set; anything else in a rules file
/// deserializes to `Unknown` so a typo fails closed instead of crashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Category {
    ServerAlert,
    Invoice,
    ClientInquiry,
    Newsletter,
    Personal,
    SpamSuspect,
    Uncategorized,
    Unknown,
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "server_alert" => Category::ServerAlert,
            "invoice" => Category::Invoice,
            "client_inquiry" => Category::ClientInquiry,
            "newsletter" => Category::Newsletter,
            "personal" => Category::Personal,
            "spam_suspect" => Category::SpamSuspect,
            "uncategorized" => Category::Uncategorized,
            _ => Category::Unknown,
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ServerAlert => "server_alert",
            Category::Invoice => "invoice",
            Category::ClientInquiry => "client_inquiry",
            Category::Newsletter => "newsletter",
            Category::Personal => "personal",
            Category::SpamSuspect => "spam_suspect",
            Category::Uncategorized => "uncategorized",
            Category::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
    Unknown,
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        match s.as_str() {
            "low" => Priority::Low,
            "medium" => Priority::Medium,
            "high" => Priority::High,
            _ => Priority::Unknown,
        }
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Unknown => "unknown",
        }
    }
}

/// Follow-up actions a rule can request. Executing them is the caller's job;
/// the engine only reports which ones the matched rule listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ActionKind {
    Notify,
    Skip,
    Unknown,
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "notify" => ActionKind::Notify,
            "skip" => ActionKind::Skip,
            _ => ActionKind::Unknown,
        }
    }
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Notify => "notify",
            ActionKind::Skip => "skip",
            ActionKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Operator {
    ContainsAny,
    NotContainsAny,
    Equals,
    NotEquals,
    Unknown,
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "contains_any" => Operator::ContainsAny,
            "not_contains_any" => Operator::NotContainsAny,
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            _ => Operator::Unknown,
        }
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Unknown
    }
}

/// How a condition tree combines its clauses. Anything that is not "all"
/// behaves as "any", which is also the default when the key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MatchMode {
    All,
    Any,
}

impl From<String> for MatchMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "all" => MatchMode::All,
            _ => MatchMode::Any,
        }
    }
}

impl Default for MatchMode {
    fn default() -> Self {
        MatchMode::Any
    }
}

/// A single field/operator/value-list test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<String>,
}

/// One level of all/any combination over clauses. Flat today; if nested
/// groups are ever needed this becomes a `Clause | Group` sum type rather
/// than untyped JSON traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConditionTree {
    #[serde(default)]
    pub match_type: MatchMode,
    #[serde(default)]
    pub rules: Vec<Clause>,
}

/// An ordered classification rule. Position in the rules file is
/// load-bearing: the engine stops at the first match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub category: Category,
    pub priority: Priority,
    pub actions: Vec<ActionKind>,
    pub conditions: ConditionTree,
    #[serde(default)]
    pub description: String,
}

/// The rules document as stored on disk: `{"rules": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesDocument {
    pub rules: Vec<Rule>,
}

impl Default for RulesDocument {
    fn default() -> Self {
        RulesDocument {
            rules: vec![
                Rule {
                    name: "Server alerts".to_string(),
                    category: Category::ServerAlert,
                    priority: Priority::High,
                    actions: vec![ActionKind::Notify],
                    conditions: ConditionTree {
                        match_type: MatchMode::Any,
                        rules: vec![
                            Clause {
                                field: "from_address".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec![
                                    "proxmox".to_string(),
                                    "fail2ban".to_string(),
                                    "monitoring".to_string(),
                                    "nagios".to_string(),
                                    "zabbix".to_string(),
                                ],
                            },
                            Clause {
                                field: "subject".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec![
                                    "backup".to_string(),
                                    "alert".to_string(),
                                    "fail2ban".to_string(),
                                    "raid".to_string(),
                                    "disk space".to_string(),
                                    "smart error".to_string(),
                                ],
                            },
                        ],
                    },
                    description: "Infrastructure notifications from homelab and hosting"
                        .to_string(),
                },
                Rule {
                    name: "Invoices".to_string(),
                    category: Category::Invoice,
                    priority: Priority::Medium,
                    actions: vec![ActionKind::Notify],
                    conditions: ConditionTree {
                        match_type: MatchMode::Any,
                        rules: vec![
                            Clause {
                                field: "subject".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec![
                                    "rechnung".to_string(),
                                    "invoice".to_string(),
                                    "zahlung".to_string(),
                                    "payment".to_string(),
                                ],
                            },
                            Clause {
                                field: "body_preview".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec!["rechnung".to_string(), "invoice".to_string()],
                            },
                        ],
                    },
                    description: "Bills and payment confirmations (German and English)"
                        .to_string(),
                },
                Rule {
                    name: "Newsletters".to_string(),
                    category: Category::Newsletter,
                    priority: Priority::Low,
                    actions: vec![ActionKind::Skip],
                    conditions: ConditionTree {
                        match_type: MatchMode::Any,
                        rules: vec![
                            Clause {
                                field: "from_address".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec![
                                    "newsletter".to_string(),
                                    "noreply".to_string(),
                                    "no-reply".to_string(),
                                    "marketing".to_string(),
                                ],
                            },
                            Clause {
                                field: "subject".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec![
                                    "newsletter".to_string(),
                                    "unsubscribe".to_string(),
                                    "abmelden".to_string(),
                                    "angebote".to_string(),
                                ],
                            },
                        ],
                    },
                    description: "Bulk mail and marketing, skipped by default".to_string(),
                },
                Rule {
                    name: "Spam suspects".to_string(),
                    category: Category::SpamSuspect,
                    priority: Priority::Low,
                    actions: vec![ActionKind::Skip],
                    conditions: ConditionTree {
                        match_type: MatchMode::Any,
                        rules: vec![
                            Clause {
                                field: "subject".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec![
                                    "you won".to_string(),
                                    "congratulations".to_string(),
                                    "lottery".to_string(),
                                    "viagra".to_string(),
                                ],
                            },
                            Clause {
                                field: "body_preview".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec![
                                    "click here to claim".to_string(),
                                    "wire transfer".to_string(),
                                    "prince".to_string(),
                                ],
                            },
                        ],
                    },
                    description: "Obvious scam patterns that slipped past upstream filtering"
                        .to_string(),
                },
                Rule {
                    name: "Business client inquiries".to_string(),
                    category: Category::ClientInquiry,
                    priority: Priority::High,
                    actions: vec![ActionKind::Notify],
                    conditions: ConditionTree {
                        match_type: MatchMode::All,
                        rules: vec![
                            Clause {
                                field: "account".to_string(),
                                operator: Operator::Equals,
                                values: vec!["business".to_string()],
                            },
                            Clause {
                                field: "from_address".to_string(),
                                operator: Operator::ContainsAny,
                                values: vec!["@".to_string()],
                            },
                            Clause {
                                field: "from_address".to_string(),
                                operator: Operator::NotContainsAny,
                                values: vec!["noreply".to_string(), "no-reply".to_string()],
                            },
                        ],
                    },
                    description: "Human senders on the business mailbox".to_string(),
                },
                Rule {
                    name: "Family personal mail".to_string(),
                    category: Category::Personal,
                    priority: Priority::Medium,
                    actions: vec![ActionKind::Notify],
                    conditions: ConditionTree {
                        match_type: MatchMode::All,
                        rules: vec![Clause {
                            field: "account".to_string(),
                            operator: Operator::Equals,
                            values: vec!["family".to_string()],
                        }],
                    },
                    description: "Everything on the family mailbox that is not bulk mail"
                        .to_string(),
                },
            ],
        }
    }
}

impl RulesDocument {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let doc: RulesDocument = serde_json::from_str(&content)?;
        Ok(doc)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_ruleset_order() {
        let doc = RulesDocument::default();
        let names: Vec<&str> = doc.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Server alerts",
                "Invoices",
                "Newsletters",
                "Spam suspects",
                "Business client inquiries",
                "Family personal mail",
            ]
        );
    }

    #[test]
    fn test_unknown_vocabulary_values_fail_closed() {
        let rule: Rule = serde_json::from_value(json!({
            "name": "typo rule",
            "category": "serverr_alert",
            "priority": "urgent",
            "actions": ["notify", "page_oncall"],
            "conditions": {
                "match_type": "any",
                "rules": [
                    {"field": "subject", "operator": "regex_match", "values": ["x"]}
                ]
            }
        }))
        .unwrap();

        assert_eq!(rule.category, Category::Unknown);
        assert_eq!(rule.priority, Priority::Unknown);
        assert_eq!(rule.actions, vec![ActionKind::Notify, ActionKind::Unknown]);
        assert_eq!(rule.conditions.rules[0].operator, Operator::Unknown);
    }

    #[test]
    fn test_match_type_defaults_to_any() {
        let tree: ConditionTree = serde_json::from_value(json!({
            "rules": [{"field": "subject", "operator": "contains_any", "values": ["a"]}]
        }))
        .unwrap();
        assert_eq!(tree.match_type, MatchMode::Any);

        let tree: ConditionTree =
            serde_json::from_value(json!({"match_type": "some", "rules": []})).unwrap();
        assert_eq!(tree.match_type, MatchMode::Any);

        let tree: ConditionTree =
            serde_json::from_value(json!({"match_type": "all", "rules": []})).unwrap();
        assert_eq!(tree.match_type, MatchMode::All);
    }

    #[test]
    fn test_rule_requires_structural_fields() {
        let result: Result<Rule, _> = serde_json::from_value(json!({
            "name": "half a rule",
            "priority": "high",
            "actions": ["notify"],
            "conditions": {"match_type": "any", "rules": []}
        }));
        assert!(result.is_err(), "rule without a category must not parse");
    }

    #[test]
    fn test_description_is_optional() {
        let rule: Rule = serde_json::from_value(json!({
            "name": "minimal",
            "category": "personal",
            "priority": "low",
            "actions": [],
            "conditions": {"match_type": "any", "rules": []}
        }))
        .unwrap();
        assert_eq!(rule.description, "");
    }

    #[test]
    fn test_shipped_rules_file_matches_defaults() {
        // Keeps config/email_rules.json in sync with the built-in ruleset.
        let doc = RulesDocument::from_file("config/email_rules.json").unwrap();
        assert_eq!(doc, RulesDocument::default());
    }
}
