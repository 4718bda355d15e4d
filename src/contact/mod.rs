//! Contact form submission through EmailJS.

use crate::llm::config::EmailConfig;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Please fill in the {0} field.")]
    MissingField(&'static str),
    #[error("{0:?} is not a valid email address")]
    InvalidEmail(String),
    #[error(
        "EmailJS is not configured. Please set EMAILJS_SERVICE_ID, EMAILJS_TEMPLATE_ID and EMAILJS_PUBLIC_KEY."
    )]
    NotConfigured,
    #[error("Email service rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Failed to reach the email service: {0}")]
    Transport(#[from] reqwest::Error),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(email.trim()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), ContactError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(ContactError::MissingField(field));
            }
        }
        if !is_valid_email(&self.email) {
            return Err(ContactError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    /// Variable names used by the EmailJS template.
    pub fn template_params(&self) -> TemplateParams<'_> {
        TemplateParams {
            from_name: self.name.trim(),
            from_email: self.email.trim(),
            subject: self.subject.trim(),
            message: &self.message,
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct TemplateParams<'a> {
    pub from_name: &'a str,
    pub from_email: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
}

#[derive(Serialize, Debug)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

/// How a submission was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Not configured, dev mode: the payload was only logged.
    Logged,
}

pub struct EmailSender {
    http: Client,
    config: EmailConfig,
}

impl EmailSender {
    pub fn new(config: EmailConfig) -> Self {
        if !config.is_configured() {
            debug!(
                dev_mode = config.dev_mode,
                "EmailJS environment variables are not configured"
            );
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, config }
    }

    #[instrument(skip_all, fields(subject = %form.subject))]
    pub async fn send(&self, form: &ContactForm) -> Result<Delivery, ContactError> {
        form.validate()?;
        let params = form.template_params();

        let (Some(service_id), Some(template_id), Some(user_id)) = (
            self.config.service_id.as_deref(),
            self.config.template_id.as_deref(),
            self.config.public_key.as_deref(),
        ) else {
            if self.config.dev_mode {
                let payload = serde_json::to_string_pretty(&params).unwrap_or_default();
                info!(%payload, "[DEV MODE] Contact form submitted");
                return Ok(Delivery::Logged);
            }
            return Err(ContactError::NotConfigured);
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .json(&SendRequest {
                service_id,
                template_id,
                user_id,
                template_params: params,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "Email service rejected message");
            return Err(ContactError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        info!("Contact message sent");
        Ok(Delivery::Sent)
    }
}
