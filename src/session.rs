use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::comparison::{compute_progress, compute_stats, NameKeys, ProgressSummary, ResponseStats};
use crate::config::AppConfig;
use crate::duplicates::{detect_duplicates, DuplicateGroup};
use crate::errors::{AppError, AppResult};
use crate::fetch::{load_documents, SheetDocuments, SheetSource};
use crate::filter::{filter_respondents, RespondentFilter, ViewState};
use crate::ingestion::{parse_respondents, parse_roster, Respondent, RosterEntry};
use crate::mail::{compose_draft, MailDraft};

/// Everything one load produced, plus the operator's current view.
///
/// A reload builds a fresh session; nothing is updated in place.
#[derive(Debug, Clone, Serialize)]
pub struct DeskSession {
    respondents: Vec<Respondent>,
    duplicates: Vec<DuplicateGroup>,
    roster: Option<Vec<RosterEntry>>,
    view: ViewState,
    loaded_at: DateTime<Utc>,
}

impl DeskSession {
    pub fn from_documents(documents: &SheetDocuments, config: &AppConfig) -> Self {
        let columns = &config.columns;
        let policy = config.sent_rule.policy();
        let parsed = parse_respondents(
            &documents.respondents,
            columns.respondent_schema(),
            policy.as_ref(),
        );
        let report = detect_duplicates(parsed, &columns.email, &columns.name);
        let roster = documents
            .roster
            .as_deref()
            .map(|text| parse_roster(text, &columns.roster_name));

        info!(
            respondents = report.respondents.len(),
            duplicate_groups = report.groups.len(),
            roster = roster.as_ref().map(Vec::len),
            "session loaded"
        );

        Self {
            respondents: report.respondents,
            duplicates: report.groups,
            roster,
            view: ViewState::default(),
            loaded_at: Utc::now(),
        }
    }

    pub fn respondents(&self) -> &[Respondent] {
        &self.respondents
    }

    pub fn duplicates(&self) -> &[DuplicateGroup] {
        &self.duplicates
    }

    pub fn roster(&self) -> Option<&[RosterEntry]> {
        self.roster.as_deref()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn stats(&self) -> ResponseStats {
        compute_stats(&self.respondents)
    }

    pub fn progress(&self, config: &AppConfig) -> Option<ProgressSummary> {
        compute_progress(
            &self.respondents,
            self.roster(),
            NameKeys {
                respondent: &config.columns.name,
                roster: &config.columns.roster_name,
            },
        )
    }

    pub fn count(&self, filter: RespondentFilter) -> usize {
        self.respondents.iter().filter(|r| filter.matches(r)).count()
    }

    /// Respondents under the active filter.
    pub fn visible(&self) -> Vec<Respondent> {
        filter_respondents(&self.respondents, self.view.filter)
    }

    pub fn set_filter(&mut self, filter: RespondentFilter) {
        self.view.set_filter(filter);
    }

    pub fn select(&mut self, index: usize) -> AppResult<()> {
        let visible_len = self.count(self.view.filter);
        self.view.select(index, visible_len)
    }

    pub fn selected(&self) -> Option<Respondent> {
        let index = self.view.selected?;
        self.visible().into_iter().nth(index)
    }

    pub fn draft_for_selected(&self, config: &AppConfig) -> AppResult<MailDraft> {
        let respondent = self.selected().ok_or(AppError::NoSelection)?;
        Ok(compose_draft(&respondent, &config.mail, &config.columns))
    }
}

/// Fetches both sheets and builds a fresh session from them.
pub async fn load_session(source: &dyn SheetSource, config: &AppConfig) -> AppResult<DeskSession> {
    let documents = load_documents(source, config).await?;
    Ok(DeskSession::from_documents(&documents, config))
}
