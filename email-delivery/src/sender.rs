use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no recipients specified")]
    NoRecipients,

    #[error("invalid email address {address:?}: {message}")]
    Address { address: String, message: String },

    #[error("cannot build message: {0}")]
    Build(String),

    #[error("SMTP submission failed: {0}")]
    Smtp(String),

    #[error("mail task failed: {0}")]
    Join(String),
}

/// A rendered email ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub html_body: String,
    pub recipients: Vec<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DeliveryError>;
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

/// STARTTLS + login submission through lettre's blocking transport.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build the MIME message without sending it.
    pub fn build_message(&self, email: &OutgoingEmail) -> Result<Message, DeliveryError> {
        if email.recipients.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        let mut builder = Message::builder()
            .from(parse_mailbox(&self.config.sender)?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML);
        for recipient in &email.recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        builder
            .body(email.html_body.clone())
            .map_err(|e| DeliveryError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, DeliveryError> {
        let credentials = Credentials::new(self.config.sender.clone(), self.config.password.clone());
        Ok(SmtpTransport::starttls_relay(&self.config.host)
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?
            .port(self.config.port)
            .credentials(credentials)
            .build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DeliveryError> {
        let message = self.build_message(email)?;
        let transport = self.transport()?;
        let recipients = email.recipients.len();

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| DeliveryError::Join(e.to_string()))?
            .map_err(|e| {
                error!("Email sending failed: {}", e);
                DeliveryError::Smtp(e.to_string())
            })?;

        info!("Email sent to {} recipients", recipients);
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| DeliveryError::Address {
        address: address.to_string(),
        message: e.to_string(),
    })
}
