use std::time::Duration;
use std::{env, io};

use serde::Serialize;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::ingestion::{RespondentSchema, SentRule};

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_SUBJECT_TEMPLATE: &str = "{name}, your 1:1 consulting report";

/// Spreadsheet header strings for each logical field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldMap {
    pub name: String,
    pub email: String,
    pub course: String,
    pub timestamp: String,
    pub sent: String,
    pub roster_name: String,
    pub roster_grade: String,
}

impl FieldMap {
    pub fn respondent_schema(&self) -> RespondentSchema<'_> {
        RespondentSchema {
            name: &self.name,
            sent: &self.sent,
        }
    }

    /// Columns already shown in a draft's header lines.
    pub fn is_identity_column(&self, header: &str) -> bool {
        header == self.name
            || header == self.email
            || header == self.timestamp
            || header == self.sent
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            name: "📌 수강생 이름".into(),
            email: "🖊️ 이메일 주소".into(),
            course: "🎈 수강 과정".into(),
            timestamp: "타임스탬프".into(),
            sent: "발송완료".into(),
            roster_name: "성명".into(),
            roster_grade: "기수".into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SenderIdentity {
    pub name: String,
    pub company: String,
    pub phone: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MailSettings {
    pub sender: SenderIdentity,
    pub subject_template: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            sender: SenderIdentity::default(),
            subject_template: DEFAULT_SUBJECT_TEMPLATE.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub respondent_sheet_url: Option<String>,
    pub roster_sheet_url: Option<String>,
    pub fetch_timeout_ms: u64,
    pub columns: FieldMap,
    pub sent_rule: SentRule,
    pub mail: MailSettings,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicAppConfig {
    pub has_respondent_sheet: bool,
    pub has_roster_sheet: bool,
    pub fetch_timeout_ms: u64,
    pub columns: FieldMap,
    pub sent_rule: String,
    pub sender_name: String,
    pub subject_template: String,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        load_dotenv_if_applicable();
        let defaults = FieldMap::default();
        let columns = FieldMap {
            name: string_or("COLUMN_NAME", defaults.name),
            email: string_or("COLUMN_EMAIL", defaults.email),
            course: string_or("COLUMN_COURSE", defaults.course),
            timestamp: string_or("COLUMN_TIMESTAMP", defaults.timestamp),
            sent: string_or("COLUMN_SENT", defaults.sent),
            roster_name: string_or("ROSTER_COLUMN_NAME", defaults.roster_name),
            roster_grade: string_or("ROSTER_COLUMN_GRADE", defaults.roster_grade),
        };

        Ok(Self {
            respondent_sheet_url: non_empty("RESPONDENT_SHEET_URL"),
            roster_sheet_url: non_empty("ROSTER_SHEET_URL"),
            fetch_timeout_ms: parse_u64("FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS)?.max(1),
            columns,
            sent_rule: parse_sent_rule()?,
            mail: MailSettings {
                sender: SenderIdentity {
                    name: string_or("SENDER_NAME", String::new()),
                    company: string_or("SENDER_COMPANY", String::new()),
                    phone: string_or("SENDER_PHONE", String::new()),
                    title: string_or("SENDER_TITLE", String::new()),
                },
                subject_template: string_or(
                    "MAIL_SUBJECT_TEMPLATE",
                    DEFAULT_SUBJECT_TEMPLATE.to_string(),
                ),
            },
        })
    }

    pub fn respondent_url(&self) -> AppResult<&str> {
        self.respondent_sheet_url
            .as_deref()
            .ok_or_else(|| AppError::Config("RESPONDENT_SHEET_URL is not set".into()))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn public_profile(&self) -> PublicAppConfig {
        PublicAppConfig {
            has_respondent_sheet: self.respondent_sheet_url.is_some(),
            has_roster_sheet: self.roster_sheet_url.is_some(),
            fetch_timeout_ms: self.fetch_timeout_ms,
            columns: self.columns.clone(),
            sent_rule: self.sent_rule.as_str().to_string(),
            sender_name: self.mail.sender.name.clone(),
            subject_template: self.mail.subject_template.clone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            respondent_sheet_url: None,
            roster_sheet_url: None,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            columns: FieldMap::default(),
            sent_rule: SentRule::default(),
            mail: MailSettings::default(),
        }
    }
}

fn load_dotenv_if_applicable() {
    if !should_load_dotenv() {
        debug!("skipping .env load outside dev mode");
        return;
    }

    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}

fn should_load_dotenv() -> bool {
    cfg!(debug_assertions) || parse_bool("ALLOW_DOTENV", false)
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}

fn parse_u64(key: &str, default: u64) -> AppResult<u64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|err| AppError::Config(format!("{key} must be a whole number: {err}"))),
        Err(_) => Ok(default),
    }
}

fn parse_sent_rule() -> AppResult<SentRule> {
    let sentinel = non_empty("SENT_SENTINEL");
    match env::var("SENT_RULE") {
        Err(_) => Ok(SentRule::Sentinel { sentinel }),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "" | "sentinel" => Ok(SentRule::Sentinel { sentinel }),
            "circle" => Ok(SentRule::Circle),
            other => Err(AppError::Config(format!(
                "SENT_RULE must be `sentinel` or `circle`, got `{other}`"
            ))),
        },
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn string_or(key: &str, default: String) -> String {
    non_empty(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_overrides_from_env() {
        env::set_var("RESPONDENT_SHEET_URL", "https://sheets.test/responses.csv");
        env::set_var("ROSTER_SHEET_URL", "  ");
        env::set_var("COLUMN_NAME", "Name");
        env::set_var("SENT_RULE", "circle");
        env::set_var("SENDER_NAME", "Dana");
        env::set_var("FETCH_TIMEOUT_MS", "2500");

        let config = AppConfig::from_env().unwrap();
        let public = config.public_profile();

        assert_eq!(
            config.respondent_url().unwrap(),
            "https://sheets.test/responses.csv"
        );
        assert!(!public.has_roster_sheet);
        assert_eq!(public.columns.name, "Name");
        assert_eq!(public.columns.email, FieldMap::default().email);
        assert_eq!(config.sent_rule, SentRule::Circle);
        assert_eq!(public.sent_rule, "circle");
        assert_eq!(public.sender_name, "Dana");
        assert_eq!(config.fetch_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn missing_respondent_url_is_a_config_error() {
        let config = AppConfig::default();
        assert!(matches!(config.respondent_url(), Err(AppError::Config(_))));
    }

    #[test]
    fn identity_columns_cover_header_fields() {
        let columns = FieldMap::default();
        assert!(columns.is_identity_column(&columns.email));
        assert!(columns.is_identity_column(&columns.sent));
        assert!(!columns.is_identity_column(&columns.course));
    }
}
