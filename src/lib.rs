mod cli;
mod comparison;
mod config;
mod csv_line;
mod duplicates;
mod errors;
mod fetch;
mod filter;
mod ingestion;
mod mail;
mod report;
mod session;

use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use cli::{dispatch, Cli, Command};
pub use comparison::{
    compute_progress, compute_stats, percent, NameKeys, ProgressSummary, ResponseStats,
};
pub use config::{AppConfig, FieldMap, MailSettings, PublicAppConfig, SenderIdentity};
pub use csv_line::tokenize_line;
pub use duplicates::{detect_duplicates, normalize_email, DuplicateGroup, DuplicateReport};
pub use errors::{AppError, AppResult};
pub use fetch::{load_documents, HttpSheetSource, SheetDocuments, SheetSource};
pub use filter::{filter_respondents, RespondentFilter, ViewState};
pub use ingestion::{
    parse_respondents, parse_roster, sheet_trim, CircleMark, Record, RespondentSchema,
    Respondent, RosterEntry, SentPolicy, SentRule, SentinelOrOne,
};
pub use mail::{compose_draft, render_subject, MailDraft};
pub use report::write_csv;
pub use session::{load_session, DeskSession};

/// Entry point for the binary: logging, configuration, then one command.
pub async fn run(cli: Cli) -> AppResult<()> {
    init_tracing();
    let config = AppConfig::from_env()?;
    cli::execute(cli, &config).await
}

pub fn init_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    let _ = INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,survey_desk=debug"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    });
}
