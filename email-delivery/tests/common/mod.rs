// Shared fixtures for the email-delivery tests
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use email_delivery::{EmailContext, OutgoingEmail, SmtpConfig};
use interfaces::{Story, SummaryResult};

pub const TEST_SENDER: &str = "digest@example.com";

pub fn sample_story(overview: &str, url: &str) -> Story {
    Story {
        overview: overview.to_string(),
        highlights: vec!["First fact".to_string(), "Second fact".to_string()],
        urls: vec![url.to_string()],
        image_url: None,
    }
}

pub fn sample_summary() -> SummaryResult {
    SummaryResult {
        stories: vec![
            sample_story("Sejm passes budget", "https://news.example/pl/1"),
            sample_story("Senate debates tariffs", "https://news.example/us/1"),
        ],
        total_articles: 12,
        sources: 4,
        rationale: None,
    }
}

pub fn fixed_context() -> EmailContext {
    let mut ctx = EmailContext::new("2024-05-01", 12, 4).with_version("1.2.3");
    ctx.generated_at = Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap();
    ctx
}

pub fn smtp_config() -> SmtpConfig {
    SmtpConfig {
        host: "smtp.example.com".to_string(),
        port: 587,
        sender: TEST_SENDER.to_string(),
        password: "app-password".to_string(),
    }
}

pub fn outgoing(recipients: &[&str]) -> OutgoingEmail {
    OutgoingEmail {
        subject: "Top stories: 2024-05-01".to_string(),
        html_body: "<html><body>hi</body></html>".to_string(),
        recipients: recipients.iter().map(|r| r.to_string()).collect(),
    }
}
