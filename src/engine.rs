use crate::config::{ActionKind, Category, Clause, MatchMode, Operator, Priority, Rule};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence reported for a deterministic rule match. High but not 1.0:
/// rules are authored heuristics, not ground truth.
pub const RULE_MATCH_CONFIDENCE: f64 = 0.85;
/// Confidence reported when no rule matched and the engine falls back.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;
/// Tier 1 is deterministic rule matching. Tier 2 (LLM escalation) is
/// reserved and lives outside this crate.
pub const RULE_TIER: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }
}

/// Which mailbox the email arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    #[default]
    Business,
    Family,
}

impl Account {
    pub fn as_str(&self) -> &'static str {
        match self {
            Account::Business => "business",
            Account::Family => "family",
        }
    }
}

/// The email metadata one classification call operates on. Every field is
/// optional at the transport boundary and defaulted here, so the engine
/// never sees a partially formed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Email {
    pub from_address: String,
    pub from_name: String,
    pub subject: String,
    /// First ~255 characters of the body.
    pub body_preview: String,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub received_at: Option<DateTime<Utc>>,
    pub has_attachments: bool,
    pub importance: Importance,
    pub account: Account,
    /// Upstream mail-store message id, carried through for audit only.
    pub message_id: String,
}

// Sync jobs send "" for an unset timestamp.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// The classification decision for one email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub category: Category,
    pub priority: Priority,
    pub actions: Vec<ActionKind>,
    pub confidence: f64,
    pub tier_used: u8,
    pub reasoning: String,
    pub dry_run: bool,
}

/// Classify one email against the ordered rule list. First match wins.
///
/// Pure function of its inputs: no state survives between calls, and a
/// fixed (email, rules) pair always yields the identical verdict. `dry_run`
/// is echoed into the verdict and never influences matching.
pub fn classify(email: &Email, rules: &[Rule], dry_run: bool) -> Verdict {
    for rule in rules {
        let (matched, reasoning) = evaluate_rule(rule, email);
        log::debug!("Rule '{}' evaluation result: {matched}", rule.name);
        if !matched {
            continue;
        }

        // A matched rule with an unparseable category or priority cannot
        // produce a meaningful verdict; it is skipped, not fatal.
        if rule.category == Category::Unknown || rule.priority == Priority::Unknown {
            log::warn!(
                "Rule '{}' matched but has an unknown category or priority, skipping it",
                rule.name
            );
            continue;
        }

        let actions: Vec<ActionKind> = rule
            .actions
            .iter()
            .copied()
            .filter(|action| {
                if *action == ActionKind::Unknown {
                    log::warn!("Rule '{}' lists an unknown action, dropping it", rule.name);
                    false
                } else {
                    true
                }
            })
            .collect();

        log::info!(
            "Rule '{}' matched: category={} priority={}",
            rule.name,
            rule.category.as_str(),
            rule.priority.as_str()
        );

        return Verdict {
            category: rule.category,
            priority: rule.priority,
            actions,
            confidence: RULE_MATCH_CONFIDENCE,
            tier_used: RULE_TIER,
            reasoning,
            dry_run,
        };
    }

    log::debug!("No rules matched, falling back to uncategorized");
    Verdict {
        category: Category::Uncategorized,
        priority: Priority::Medium,
        actions: vec![ActionKind::Notify],
        confidence: FALLBACK_CONFIDENCE,
        tier_used: RULE_TIER,
        reasoning: "No classification rule matched".to_string(),
        dry_run,
    }
}

/// Evaluate a rule's condition tree. Returns the match flag and, on a match,
/// a reasoning line naming the rule and every satisfied clause.
fn evaluate_rule(rule: &Rule, email: &Email) -> (bool, String) {
    let clauses = &rule.conditions.rules;

    // A rule with no clauses is a configuration no-op, never a wildcard.
    if clauses.is_empty() {
        return (false, String::new());
    }

    let mut all_matched = true;
    let mut any_matched = false;
    let mut matched_reasons = Vec::new();

    for clause in clauses {
        let (matched, reason) = evaluate_clause(clause, email);
        all_matched &= matched;
        any_matched |= matched;
        if matched {
            matched_reasons.push(reason);
        }
    }

    let overall = match rule.conditions.match_type {
        MatchMode::All => all_matched,
        MatchMode::Any => any_matched,
    };

    if overall {
        let reasoning = format!("Rule '{}': {}", rule.name, matched_reasons.join("; "));
        (true, reasoning)
    } else {
        (false, String::new())
    }
}

/// Evaluate a single clause. All comparisons are case-insensitive. The
/// positive operators short-circuit on the first satisfying value, the
/// negated ones on the first violating value.
fn evaluate_clause(clause: &Clause, email: &Email) -> (bool, String) {
    let field_value = field_value(&clause.field, email);
    let field_lower = field_value.to_lowercase();

    match clause.operator {
        Operator::ContainsAny => {
            for value in &clause.values {
                if field_lower.contains(&value.to_lowercase()) {
                    return (true, format!("{} contains '{}'", clause.field, value));
                }
            }
            (false, String::new())
        }
        Operator::NotContainsAny => {
            for value in &clause.values {
                if field_lower.contains(&value.to_lowercase()) {
                    return (false, String::new());
                }
            }
            (
                true,
                format!("{} does not contain blocked patterns", clause.field),
            )
        }
        Operator::Equals => {
            for value in &clause.values {
                if field_lower == value.to_lowercase() {
                    return (true, format!("{} equals '{}'", clause.field, value));
                }
            }
            (false, String::new())
        }
        Operator::NotEquals => {
            for value in &clause.values {
                if field_lower == value.to_lowercase() {
                    return (false, String::new());
                }
            }
            (
                true,
                format!("{} is not in excluded values", clause.field),
            )
        }
        Operator::Unknown => {
            log::warn!(
                "Unknown operator in clause on field '{}', treating as non-match",
                clause.field
            );
            (false, String::new())
        }
    }
}

/// Map a clause's field name to the email's string value. Unknown names
/// resolve to the empty string so a bad rule degrades to "never fires".
fn field_value<'a>(field: &str, email: &'a Email) -> &'a str {
    match field {
        "from_address" => &email.from_address,
        "from_name" => &email.from_name,
        "subject" => &email.subject,
        "body_preview" => &email.body_preview,
        "account" => email.account.as_str(),
        "importance" => email.importance.as_str(),
        // An absent field key defaults to ""; stay quiet for that case so
        // per-email logs only flag clauses that actually name a bad field.
        "" => "",
        other => {
            log::warn!("Unknown condition field '{other}', treating as empty");
            ""
        }
    }
}
