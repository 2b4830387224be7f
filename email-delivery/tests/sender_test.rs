use email_delivery::{DeliveryError, SmtpMailer};

mod common;
use common::{outgoing, smtp_config, TEST_SENDER};

#[test]
fn test_empty_recipient_list_is_rejected() {
    let mailer = SmtpMailer::new(smtp_config());

    let err = mailer.build_message(&outgoing(&[])).unwrap_err();
    assert!(matches!(err, DeliveryError::NoRecipients));
}

#[test]
fn test_invalid_recipient_is_reported() {
    let mailer = SmtpMailer::new(smtp_config());

    let err = mailer
        .build_message(&outgoing(&["ok@example.com", "not an address"]))
        .unwrap_err();
    match err {
        DeliveryError::Address { address, .. } => assert_eq!(address, "not an address"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_message_carries_every_recipient_and_html_body() {
    let mailer = SmtpMailer::new(smtp_config());

    let message = mailer
        .build_message(&outgoing(&["a@example.com", "b@example.com"]))
        .expect("message should build");

    let envelope = message.envelope();
    assert_eq!(envelope.to().len(), 2);
    assert_eq!(
        envelope.from().map(|a| a.to_string()),
        Some(TEST_SENDER.to_string())
    );

    let raw = String::from_utf8(message.formatted()).unwrap();
    assert!(raw.contains("Content-Type: text/html"));
    assert!(raw.contains("Subject: Top stories: 2024-05-01"));
}

#[test]
fn test_send_fails_before_connecting_without_recipients() {
    use email_delivery::Mailer;

    let mailer = SmtpMailer::new(smtp_config());

    let result = tokio_test::block_on(mailer.send(&outgoing(&[])));
    assert!(matches!(result, Err(DeliveryError::NoRecipients)));
}
