use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::anyhow;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email regex"));

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required!";
pub const INVALID_EMAIL: &str = "Invalid email format!";
pub const INVALID_MOBILE: &str = "Invalid mobile number!";
pub const EMAIL_REQUIRED: &str = "Please enter your email address";
pub const SUBSCRIBE_FAILED: &str = "Failed to subscribe. Please try again later.";
pub const UNSUBSCRIBE_FAILED: &str = "Failed to unsubscribe. Please try again later.";
pub const EMAIL_NOT_FOUND: &str = "Email not found. Please check your email address.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl fmt::Display for AlertFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertFrequency::Daily => "daily",
            AlertFrequency::Weekly => "weekly",
            AlertFrequency::Monthly => "monthly",
        })
    }
}

impl FromStr for AlertFrequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(AlertFrequency::Daily),
            "weekly" => Ok(AlertFrequency::Weekly),
            "monthly" => Ok(AlertFrequency::Monthly),
            other => Err(anyhow!("Invalid alert frequency: {other}")),
        }
    }
}

/// Body of `POST /api/subscribe`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub alert_frequency: AlertFrequency,
}

impl SubscriptionForm {
    /// First failing rule wins, as a user-facing message.
    pub fn validate(&self) -> Result<(), &'static str> {
        let blank = [&self.name, &self.email, &self.mobile, &self.location]
            .iter()
            .any(|f| f.trim().is_empty());
        if blank {
            return Err(ALL_FIELDS_REQUIRED);
        }
        if !is_email(&self.email) {
            return Err(INVALID_EMAIL);
        }
        if self.mobile.len() < 10 || !self.mobile.chars().all(|c| c.is_ascii_digit()) {
            return Err(INVALID_MOBILE);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    #[serde(default)]
    pub email: String,
}

impl UnsubscribeRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() {
            return Err(EMAIL_REQUIRED);
        }
        if !is_email(&self.email) {
            return Err(INVALID_EMAIL);
        }
        Ok(())
    }
}

pub fn is_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

/// What the alert service answers to subscribe and unsubscribe, success or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub sms_sent: Option<bool>,
    pub already_subscribed: Option<bool>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            NoticeKind::Success => "ok",
            NoticeKind::Info => "info",
            NoticeKind::Error => "error",
        };
        write!(f, "[{tag}] {}", self.text)
    }
}

pub fn subscribe_notice(resp: &AlertResponse) -> Notice {
    if resp.success {
        let mut text = resp.message.clone().unwrap_or_default();
        if resp.sms_sent.unwrap_or(false) {
            text.push_str(" Welcome SMS sent to your mobile number.");
        } else {
            text.push_str(" (Note: Welcome SMS could not be sent)");
        }
        return Notice::success(text.trim_start());
    }
    if resp.already_subscribed.unwrap_or(false) {
        return Notice::info(resp.message.clone().unwrap_or_default());
    }
    let text = resp
        .message
        .clone()
        .or_else(|| resp.error.clone())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "An error occurred. Please try again.".to_string());
    Notice::error(text)
}

pub fn unsubscribe_notice(resp: &AlertResponse) -> Notice {
    if resp.success {
        let mut text = resp.message.clone().unwrap_or_default();
        if resp.sms_sent.unwrap_or(false) {
            text.push_str(" Goodbye SMS sent to your mobile number.");
        } else {
            text.push_str(" (Note: Goodbye SMS could not be sent)");
        }
        return Notice::success(text.trim_start());
    }
    let text = resp
        .error
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Email not found".to_string());
    Notice::error(text)
}
