//! Quotation email over SMTP: the composed body as plain text with the
//! published document attached.

use std::time::Duration;

use lettre::address::AddressError;
use lettre::message::header::{ContentType, ContentTypeErr};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use showroom_core::config::{SmtpConfig, SmtpSecurity};

use crate::pdf::PublishedDocument;

const DEFAULT_BODY: &str = "Please find your quotation attached.";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address `{address}`: {source}")]
    Address { address: String, source: AddressError },
    #[error("could not build email: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("invalid attachment content type: {0}")]
    ContentType(#[from] ContentTypeErr),
    #[error("email send failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("could not read quotation document: {0}")]
    Document(#[from] std::io::Error),
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse()
        .map_err(|source| MailError::Address { address: address.trim().to_string(), source })
}

/// One outgoing quotation email.
pub struct QuotationEmail<'a> {
    pub to: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
}

/// Builds the message: plain text body plus `document` attached under its
/// published file name.
pub fn quotation_message(
    from: &Mailbox,
    email: &QuotationEmail<'_>,
    document: &PublishedDocument,
    content: Vec<u8>,
) -> Result<Message, MailError> {
    let body = if email.body.trim().is_empty() { DEFAULT_BODY } else { email.body };
    let content_type = ContentType::parse(document.format.content_type())?;

    let message = Message::builder()
        .from(from.clone())
        .to(mailbox(email.to)?)
        .subject(email.subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body.to_string()))
                .singlepart(Attachment::new(document.file_name.clone()).body(content, content_type)),
        )?;
    Ok(message)
}

pub struct QuoteMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl QuoteMailer {
    /// Mailer for the configured relay, or `None` when `smtp.host` is not
    /// set. No connection is made until the first send.
    pub fn from_config(config: &SmtpConfig) -> Result<Option<Self>, MailError> {
        let Some((host, from)) = config.relay() else {
            return Ok(None);
        };

        let builder = match config.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
            SmtpSecurity::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?,
            SmtpSecurity::Plain => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };
        let mut builder =
            builder.port(config.port).timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let Some((username, password)) = config.login() {
            builder = builder.credentials(Credentials::new(
                username.to_string(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Some(Self { from: mailbox(from)?, transport: builder.build() }))
    }

    pub fn sender(&self) -> &Mailbox {
        &self.from
    }

    pub async fn send_quotation(
        &self,
        email: &QuotationEmail<'_>,
        document: &PublishedDocument,
    ) -> Result<(), MailError> {
        let content = tokio::fs::read(&document.path).await?;
        let message = quotation_message(&self.from, email, document, content)?;
        self.transport.send(message).await?;

        info!(
            event_name = "share.email.sent",
            file_name = %document.file_name,
            "quotation email accepted by relay"
        );
        Ok(())
    }
}
