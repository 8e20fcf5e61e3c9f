//! Email delivery with a per-recipient plain-text fallback.

use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use crate::config::DeliveryConfig;
use crate::contract::{
    DeliveryOutcome, DeliveryPath, DeliveryReceipt, DeliveryResult, EmailBody, EmailMessage,
    MailBackend, Report,
};
use crate::error::DigestError;

/// Splits a comma separated recipient list, trimming entries and dropping
/// empty ones.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct Mailer<'a, M: MailBackend + ?Sized> {
    backend: &'a M,
    from: String,
    subject_prefix: String,
}

impl<'a, M: MailBackend + ?Sized> Mailer<'a, M> {
    pub fn new(backend: &'a M, config: &DeliveryConfig) -> Self {
        Self {
            backend,
            from: config.from.clone(),
            subject_prefix: config.subject_prefix.clone(),
        }
    }

    pub fn subject_for(&self, date: NaiveDate) -> String {
        format!("{} - {}", self.subject_prefix, date.format("%Y-%m-%d"))
    }

    fn subject_today(&self) -> String {
        self.subject_for(Local::now().date_naive())
    }

    /// Sends the HTML report to one recipient, falling back to a plain-text
    /// notice when the HTML send fails.
    pub async fn send_html(
        &self,
        recipient: &str,
        report: &Report,
    ) -> Result<DeliveryReceipt, DigestError> {
        let subject = self.subject_today();
        let message = EmailMessage {
            from: self.from.clone(),
            to: vec![recipient.to_string()],
            subject: subject.clone(),
            body: EmailBody::Html(report.html.clone()),
        };

        match self.backend.send_email(&message).await {
            Ok(id) => {
                info!(recipient, id = %id, "[DELIVER] HTML report sent");
                Ok(DeliveryReceipt {
                    id,
                    path: DeliveryPath::Html,
                })
            }
            Err(html_error) => {
                warn!(
                    recipient,
                    error = %html_error,
                    "[DELIVER] HTML send failed, trying plain text"
                );
                self.send_fallback_text(recipient, &subject, report.project_count)
                    .await
                    .map_err(|fallback_error| {
                        error!(
                            recipient,
                            error = %fallback_error,
                            "[DELIVER] Plain-text fallback failed"
                        );
                        DigestError::DeliveryFailed {
                            recipient: recipient.to_string(),
                            reason: html_error.to_string(),
                        }
                    })
            }
        }
    }

    /// Sends a short plain-text notice in place of the report.
    pub async fn send_fallback_text(
        &self,
        recipient: &str,
        subject: &str,
        project_count: usize,
    ) -> Result<DeliveryReceipt, DigestError> {
        let message = EmailMessage {
            from: self.from.clone(),
            to: vec![recipient.to_string()],
            subject: subject.to_string(),
            body: EmailBody::Text(fallback_text(project_count)),
        };
        let id = self
            .backend
            .send_email(&message)
            .await
            .map_err(|e| DigestError::DeliveryFailed {
                recipient: recipient.to_string(),
                reason: e.to_string(),
            })?;
        info!(recipient, id = %id, "[DELIVER] Plain-text fallback sent");
        Ok(DeliveryReceipt {
            id,
            path: DeliveryPath::PlainTextFallback,
        })
    }

    /// Sends to every recipient in order. Never fails as a whole and never
    /// stops early; the result has one entry per recipient.
    pub async fn send_batch(&self, recipients: &[String], report: &Report) -> Vec<DeliveryResult> {
        let mut results = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let outcome = match self.send_html(recipient, report).await {
                Ok(DeliveryReceipt { id, path }) => DeliveryOutcome::Delivered { id, path },
                Err(e) => DeliveryOutcome::Failed {
                    error: e.to_string(),
                },
            };
            results.push(DeliveryResult {
                recipient: recipient.clone(),
                outcome,
            });
        }
        let delivered = results.iter().filter(|r| r.success()).count();
        info!(delivered, total = results.len(), "[DELIVER] Batch finished");
        results
    }
}

fn fallback_text(project_count: usize) -> String {
    format!(
        "Today's GitHub trending report could not be delivered as HTML.\n\n\
         {project_count} trending projects were collected for this run. \
         Please check the service logs or visit https://github.com/trending directly."
    )
}
