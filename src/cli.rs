use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::fetch::HttpSheetSource;
use crate::filter::RespondentFilter;
use crate::report;
use crate::session::{load_session, DeskSession};

#[derive(Debug, Parser)]
#[command(name = "survey-desk")]
#[command(
    author,
    version,
    about = "Review survey responses, roster progress and follow-up mail drafts"
)]
pub struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List respondents under a filter (all, pending, sent, duplicate)
    List {
        #[arg(short, long, default_value = "all")]
        filter: String,
    },

    /// Show response counts
    Stats,

    /// Compare respondents against the roster
    Progress,

    /// Show email addresses that were submitted more than once
    Duplicates,

    /// Print the mail draft for one respondent of a filtered list
    Draft {
        /// Position of the respondent in the filtered list
        index: usize,

        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Print only the subject line
        #[arg(long)]
        subject_only: bool,
    },

    /// Write the filtered respondents as CSV
    Export {
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the active configuration
    Config,
}

pub async fn execute(cli: Cli, config: &AppConfig) -> AppResult<()> {
    if let Command::Config = cli.command {
        return show_config(cli.json, config);
    }

    let source = HttpSheetSource::from_config(config)?;
    let mut session = load_session(&source, config).await?;
    dispatch(cli, config, &mut session)
}

/// Runs one command against an already loaded session.
pub fn dispatch(cli: Cli, config: &AppConfig, session: &mut DeskSession) -> AppResult<()> {
    let columns = &config.columns;
    match cli.command {
        Command::List { filter } => {
            session.set_filter(RespondentFilter::parse(&filter));
            let rows = session.visible();
            emit(cli.json, &rows, || {
                report::render_list(&rows, session.view().filter, columns)
            })
        }
        Command::Stats => {
            let stats = session.stats();
            let filters: serde_json::Map<String, serde_json::Value> = RespondentFilter::ALL
                .iter()
                .map(|filter| (filter.as_str().to_string(), json!(session.count(*filter))))
                .collect();
            let payload = json!({
                "stats": stats,
                "filters": filters,
                "loaded_at": session.loaded_at(),
            });
            emit(cli.json, &payload, || {
                report::render_stats(&stats, session.count(RespondentFilter::Duplicate))
            })
        }
        Command::Progress => {
            let progress = session.progress(config);
            emit(cli.json, &progress, || {
                report::render_progress(progress.as_ref(), columns)
            })
        }
        Command::Duplicates => {
            let groups = session.duplicates();
            emit(cli.json, &groups, || report::render_duplicates(groups))
        }
        Command::Draft {
            index,
            filter,
            subject_only,
        } => {
            session.set_filter(RespondentFilter::parse(&filter));
            session.select(index)?;
            let draft = session.draft_for_selected(config)?;
            emit(cli.json, &draft, || {
                if subject_only {
                    format!("{}\n", draft.subject)
                } else {
                    format!("To: {}\n{}\n", draft.to, draft.full_text())
                }
            })
        }
        Command::Export { filter, output } => {
            session.set_filter(RespondentFilter::parse(&filter));
            let rows = session.visible();
            match output {
                Some(path) => report::write_csv(&rows, File::create(path)?),
                None => report::write_csv(&rows, io::stdout().lock()),
            }
        }
        Command::Config => show_config(cli.json, config),
    }
}

fn show_config(json: bool, config: &AppConfig) -> AppResult<()> {
    let profile = config.public_profile();
    emit(json, &profile, || report::render_config(&profile))
}

fn emit<T, F>(json: bool, value: &T, text: F) -> AppResult<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, value)?;
        stdout.write_all(b"\n")?;
    } else {
        stdout.write_all(text().as_bytes())?;
    }
    stdout.flush()?;
    Ok(())
}
