pub mod renderer;
pub mod sender;

pub use renderer::{escape_html, render_email, EmailContext};
pub use sender::{DeliveryError, Mailer, OutgoingEmail, SmtpConfig, SmtpMailer};
