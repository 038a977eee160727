use clap::{Arg, Command};
use log::LevelFilter;
use mail_triage::{Classifier, Email, RuleStore, RulesDocument};
use std::path::PathBuf;
use std::process;

fn build_cli() -> Command {
    Command::new("mail-triage")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rule-based email classification engine")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Rules file path (default: /etc/mail-triage/email_rules.json, then config/email_rules.json)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("classify")
                .long("classify")
                .value_name("FILE")
                .help("Classify an email JSON document and print the response")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Mark the classification as a dry run (caller must not execute actions)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-rules")
                .long("list-rules")
                .help("Print the active rules as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the rules file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default rules file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
}

fn main() {
    let matches = build_cli().get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        generate_default_config(path);
        return;
    }

    let rules_path = matches.get_one::<String>("config").map(PathBuf::from);

    if matches.get_flag("test-config") {
        test_config(rules_path);
        return;
    }

    if matches.get_flag("list-rules") {
        list_rules(rules_path);
        return;
    }

    if let Some(email_file) = matches.get_one::<String>("classify") {
        classify_email_file(rules_path, email_file, matches.get_flag("dry-run"));
        return;
    }

    build_cli().print_help().ok();
}

fn generate_default_config(path: &str) {
    match RulesDocument::default().to_file(path) {
        Ok(()) => println!("✅ Default rules file written to: {path}"),
        Err(e) => {
            eprintln!("❌ Failed to write rules file: {e}");
            process::exit(1);
        }
    }
}

fn test_config(rules_path: Option<PathBuf>) {
    let store = RuleStore::new(rules_path);
    println!("🔍 Testing rules file: {}", store.path().display());
    println!();

    match store.load() {
        Ok(rules) => {
            if rules.is_empty() {
                println!("⚠️  No rules configured - every email will be uncategorized");
                return;
            }
            println!("Number of rules: {}", rules.len());
            for (i, rule) in rules.iter().enumerate() {
                println!(
                    "  Rule {}: {} -> {}/{}",
                    i + 1,
                    rule.name,
                    rule.category.as_str(),
                    rule.priority.as_str()
                );
            }
            println!("✅ Rules file validated");
        }
        Err(e) => {
            println!("❌ Rules file validation failed:");
            println!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn list_rules(rules_path: Option<PathBuf>) {
    let classifier = Classifier::new(rules_path);
    match classifier.rules() {
        Ok(listing) => match serde_json::to_string_pretty(&listing) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("❌ Failed to serialize rules listing: {e}");
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("❌ Failed to load rules: {e:#}");
            process::exit(1);
        }
    }
}

fn classify_email_file(rules_path: Option<PathBuf>, email_file: &str, dry_run: bool) {
    let content = match std::fs::read_to_string(email_file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Failed to read email file {email_file}: {e}");
            process::exit(1);
        }
    };

    let email: Email = match serde_json::from_str(&content) {
        Ok(email) => email,
        Err(e) => {
            eprintln!("❌ Invalid email document in {email_file}: {e}");
            process::exit(1);
        }
    };

    let classifier = Classifier::new(rules_path);
    match classifier.classify(email, dry_run) {
        Ok(response) => {
            let verdict = &response.verdict;
            println!(
                "📬 {} -> {}/{} (confidence {:.2}, tier {})",
                response.email.from_address,
                verdict.category.as_str(),
                verdict.priority.as_str(),
                verdict.confidence,
                verdict.tier_used
            );
            println!("   {}", verdict.reasoning);
            match serde_json::to_string_pretty(&response) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("❌ Failed to serialize response: {e}");
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ Classification failed: {e:#}");
            process::exit(1);
        }
    }
}
