//! Report generation: template selection plus a bounded retry loop against a
//! [`TextGenerator`].

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::contract::TextGenerator;
use crate::error::DigestError;
use crate::template::TemplateKind;

pub struct ReportGenerator<'a, G: TextGenerator + ?Sized> {
    backend: &'a G,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<'a, G: TextGenerator + ?Sized> ReportGenerator<'a, G> {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(backend: &'a G, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            backend,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn from_config(backend: &'a G, config: &GenerationConfig) -> Self {
        Self::new(backend, config.max_attempts, config.retry_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Builds the prompt for `template` and asks the backend for an HTML
    /// document, retrying on errors and empty output.
    pub async fn generate(
        &self,
        prompt_text: &str,
        template: TemplateKind,
    ) -> Result<String, DigestError> {
        let prompt = template.build_prompt(prompt_text);
        info!(
            template = %template,
            prompt_chars = prompt.chars().count(),
            max_attempts = self.max_attempts,
            "[GENERATE] Requesting report"
        );

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            match self.backend.generate_text(&prompt).await {
                Ok(raw) => {
                    let html = strip_code_fence(&raw);
                    if !html.trim().is_empty() {
                        info!(attempt, html_len = html.len(), "[GENERATE] Report generated");
                        return Ok(html.to_string());
                    }
                    last_error = "backend returned empty content".to_string();
                }
                Err(e) => last_error = e.to_string(),
            }
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                error = %last_error,
                "[GENERATE] Attempt failed"
            );
            if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                debug!(
                    delay_ms = self.retry_delay.as_millis() as u64,
                    "[GENERATE] Waiting before retry"
                );
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(DigestError::GenerationExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}

/// Unwraps a response wrapped in a Markdown code fence (```` ```html ... ``` ````).
/// Text after the closing fence is dropped. Anything else is returned trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`html`, `HTML`, ...) on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => "",
    };
    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}
