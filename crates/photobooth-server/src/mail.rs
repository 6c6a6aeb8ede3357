// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outgoing mail: contact-form messages to the shop and photo strips to
// customers, over authenticated SMTP with STARTTLS.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use photobooth_core::config::SmtpConfig;
use photobooth_core::error::{PhotoboothError, Result};

#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A message ready to send.  The sender is always the shop account.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    /// `None` sends to the shop's own address.
    pub to: Option<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
    pub attachment: Option<MailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    shop: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let shop = parse_mailbox(&config.user)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| PhotoboothError::Mail(format!("SMTP relay {}: {e}", config.host)))?
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .build();
        info!(host = %config.host, "SMTP mailer configured");
        Ok(Self { transport, shop })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip_all, fields(subject = %mail.subject))]
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let message = build_message(&self.shop, mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| PhotoboothError::Mail(e.to_string()))?;
        info!("mail sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| {
            PhotoboothError::InvalidInput(format!("invalid email address {address:?}: {e}"))
        })
}

fn build_message(shop: &Mailbox, mail: OutgoingMail) -> Result<Message> {
    let to = match &mail.to {
        Some(address) => parse_mailbox(address)?,
        None => shop.clone(),
    };
    let mut builder = Message::builder()
        .from(shop.clone())
        .to(to)
        .subject(mail.subject);
    if let Some(reply_to) = &mail.reply_to {
        builder = builder.reply_to(parse_mailbox(reply_to)?);
    }

    let built = match mail.attachment {
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body),
        Some(attachment) => {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                PhotoboothError::InvalidInput(format!("attachment content type: {e}"))
            })?;
            builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(mail.body))
                    .singlepart(
                        Attachment::new(attachment.filename).body(attachment.bytes, content_type),
                    ),
            )
        }
    };
    built.map_err(|e| PhotoboothError::Mail(format!("build message: {e}")))
}
