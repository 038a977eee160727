use mail_triage::engine::{classify, Account, Email};
use mail_triage::RulesDocument;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Running representative emails through the default ruleset...");
    println!();

    let rules = RulesDocument::default().rules;

    let samples = vec![
        (
            "Proxmox backup report",
            Email {
                from_address: "noreply@proxmox.local".to_string(),
                subject: "Backup completed".to_string(),
                ..Default::default()
            },
        ),
        (
            "Hetzner invoice",
            Email {
                from_address: "billing@hetzner.com".to_string(),
                subject: "Ihre Rechnung Nr. 12345".to_string(),
                has_attachments: true,
                ..Default::default()
            },
        ),
        (
            "Tech newsletter",
            Email {
                from_address: "newsletter@techcrunch.com".to_string(),
                subject: "Daily Tech Roundup".to_string(),
                ..Default::default()
            },
        ),
        (
            "Client inquiry on the business mailbox",
            Email {
                from_address: "kunde@firma.de".to_string(),
                from_name: "Max Mustermann".to_string(),
                subject: "Anfrage: AI-Beratung".to_string(),
                account: Account::Business,
                ..Default::default()
            },
        ),
        (
            "Friend on the family mailbox",
            Email {
                from_address: "freund@gmail.com".to_string(),
                subject: "Treffen am Wochenende?".to_string(),
                account: Account::Family,
                ..Default::default()
            },
        ),
        ("Empty email", Email::default()),
    ];

    for (label, email) in samples {
        let verdict = classify(&email, &rules, false);
        println!("📧 {label}");
        println!("   from: {:?} subject: {:?}", email.from_address, email.subject);
        println!(
            "   -> {}/{} (confidence {:.2})",
            verdict.category.as_str(),
            verdict.priority.as_str(),
            verdict.confidence
        );
        println!("   {}", verdict.reasoning);
        println!();
    }

    Ok(())
}
