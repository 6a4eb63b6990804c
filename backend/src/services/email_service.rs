//! Outbound email delivery.
//!
//! The core depends on the `Mailer` trait; production wires in an async
//! SMTP transport. Send failures propagate to the caller; the core does
//! not retry or guarantee delivery.

use crate::config::EmailConfig;
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;

/// Mail sender collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()>;
}

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::upstream("mail", format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::upstream("mail", format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::upstream("mail", format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::upstream("mail", format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ServiceError::upstream("mail", format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

/// HTML body for the password-reset email.
pub fn build_reset_code_html(first_name: &str, code: &str) -> String {
    format!(
        r#"
        <!DOCTYPE html>
        <html>
        <body style="background-color: #f3f4f6; margin: 0; padding: 0; font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif;">
            <div style="max-width: 600px; margin: 40px auto; background-color: #ffffff; border-radius: 8px; overflow: hidden; box-shadow: 0 4px 6px rgba(0,0,0,0.1);">
                <div style="background-color: #4f46e5; padding: 24px; text-align: center;">
                    <h1 style="color: #ffffff; margin: 0; font-size: 24px;">ConnectBase</h1>
                </div>
                <div style="padding: 32px; text-align: center;">
                    <h2 style="color: #111827; font-size: 20px; font-weight: 600; margin-bottom: 16px;">Password Reset</h2>
                    <p style="color: #4b5563; font-size: 16px; margin-bottom: 24px;">
                        Hi {first_name}, use the code below to reset your password. It expires in 15 minutes.
                    </p>
                    <div style="background-color: #f3f4f6; border-radius: 8px; padding: 16px; display: inline-block; margin-bottom: 24px;">
                        <span style="font-size: 32px; font-weight: 700; letter-spacing: 4px; color: #4f46e5;">{code}</span>
                    </div>
                    <p style="color: #6b7280; font-size: 14px;">
                        If you didn't request this, you can safely ignore this email.
                    </p>
                </div>
                <div style="background-color: #f9fafb; padding: 16px; text-align: center; border-top: 1px solid #e5e7eb;">
                    <p style="color: #9ca3af; font-size: 12px; margin: 0;">
                        &copy; {year} ConnectBase Inc.
                    </p>
                </div>
            </div>
        </body>
        </html>
        "#,
        first_name = first_name,
        code = code,
        year = Utc::now().year(),
    )
}

/// Plain-text alternative for the password-reset email.
pub fn build_reset_code_text(first_name: &str, code: &str) -> String {
    format!(
        r#"Password Reset

Hi {first_name},

Use the code below to reset your ConnectBase password. It expires in 15 minutes.

{code}

If you didn't request this, you can safely ignore this email.
"#
    )
}
