use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

const USER_AGENT: &str = concat!("survey-desk/", env!("CARGO_PKG_VERSION"));

/// Anything that can hand back the text of a published sheet export.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> AppResult<String>;
}

/// Plain HTTP GET against published CSV links.
#[derive(Clone)]
pub struct HttpSheetSource {
    http: Client,
}

impl HttpSheetSource {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Self::new(config.fetch_timeout())
    }
}

#[async_trait]
impl SheetSource for HttpSheetSource {
    async fn fetch_text(&self, url: &str) -> AppResult<String> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Raw text of one load: respondents always, roster when it could be fetched.
#[derive(Debug, Clone)]
pub struct SheetDocuments {
    pub respondents: String,
    pub roster: Option<String>,
}

/// Fetches both exports concurrently.
///
/// A respondent failure aborts the load. A roster failure is logged and
/// reported as `roster: None`.
pub async fn load_documents(
    source: &dyn SheetSource,
    config: &AppConfig,
) -> AppResult<SheetDocuments> {
    let respondent_url = config.respondent_url()?;
    let roster_url = config.roster_sheet_url.as_deref();

    let (respondents, roster) = tokio::join!(
        source.fetch_text(respondent_url),
        fetch_optional(source, roster_url)
    );

    let respondents = respondents.map_err(|err| AppError::Fetch {
        url: respondent_url.to_string(),
        reason: err.to_string(),
    })?;
    info!(
        bytes = respondents.len(),
        roster = roster.is_some(),
        "fetched sheet exports"
    );

    Ok(SheetDocuments {
        respondents,
        roster,
    })
}

async fn fetch_optional(source: &dyn SheetSource, url: Option<&str>) -> Option<String> {
    let url = url?;
    match source.fetch_text(url).await {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(?err, url, "roster fetch failed; continuing without roster");
            None
        }
    }
}
