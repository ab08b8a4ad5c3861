//! Terminal and CSV renderings of a loaded session.

use std::fmt::Write as _;
use std::io;

use crate::comparison::{ProgressSummary, ResponseStats};
use crate::config::{FieldMap, PublicAppConfig};
use crate::duplicates::DuplicateGroup;
use crate::errors::AppResult;
use crate::filter::RespondentFilter;
use crate::ingestion::Respondent;

const UNKNOWN_COURSE: &str = "(course unknown)";

pub fn render_list(rows: &[Respondent], filter: RespondentFilter, columns: &FieldMap) -> String {
    if rows.is_empty() {
        return format!("{}\n", filter.empty_message());
    }

    let mut out = String::new();
    for (index, respondent) in rows.iter().enumerate() {
        let record = &respondent.record;
        let course = match record.value(&columns.course) {
            "" => UNKNOWN_COURSE,
            course => course,
        };
        let mut markers = Vec::new();
        if respondent.sent {
            markers.push("sent");
        }
        if respondent.duplicate {
            markers.push("duplicate");
        }

        let _ = write!(
            out,
            "[{index}] {} <{}>  {course}",
            record.value(&columns.name),
            record.value(&columns.email),
        );
        if !markers.is_empty() {
            let _ = write!(out, "  ({})", markers.join(", "));
        }
        out.push('\n');
        let timestamp = record.value(&columns.timestamp);
        if !timestamp.is_empty() {
            let _ = writeln!(out, "      responded {timestamp}");
        }
    }
    out
}

pub fn render_stats(stats: &ResponseStats, duplicate_count: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "total    {}", stats.total);
    let _ = writeln!(out, "pending  {}", stats.pending);
    let _ = writeln!(out, "sent     {}", stats.sent);
    let _ = writeln!(out, "flagged duplicates  {duplicate_count}");
    out
}

pub fn render_progress(progress: Option<&ProgressSummary>, columns: &FieldMap) -> String {
    let Some(progress) = progress else {
        return "Roster unavailable; progress is not shown.\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "responses  {}/{} ({}%)",
        progress.responded_count, progress.total_students, progress.response_rate
    );
    let _ = writeln!(
        out,
        "mails sent {}/{} ({}%)",
        progress.sent_count, progress.total_students, progress.sent_rate
    );
    let _ = writeln!(out, "{}", progress_bar(progress.response_rate));

    if progress.not_responded.is_empty() {
        out.push_str("Every student on the roster has responded.\n");
        return out;
    }
    let _ = writeln!(out, "not responded ({}):", progress.not_responded.len());
    for entry in &progress.not_responded {
        let name = entry.record.value(&columns.roster_name);
        match entry.record.value(&columns.roster_grade) {
            "" => {
                let _ = writeln!(out, "  - {name}");
            }
            grade => {
                let _ = writeln!(out, "  - {name} ({grade})");
            }
        }
    }
    out
}

pub fn render_duplicates(groups: &[DuplicateGroup]) -> String {
    if groups.is_empty() {
        return "No duplicate email submissions.\n".to_string();
    }
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(
            out,
            "{} x{}: {}",
            group.email,
            group.indices.len(),
            group.names.join(", ")
        );
    }
    out
}

pub fn render_config(profile: &PublicAppConfig) -> String {
    let mut out = String::new();
    let set = |present: bool| if present { "set" } else { "not set" };
    let _ = writeln!(out, "respondent sheet  {}", set(profile.has_respondent_sheet));
    let _ = writeln!(out, "roster sheet      {}", set(profile.has_roster_sheet));
    let _ = writeln!(out, "fetch timeout     {} ms", profile.fetch_timeout_ms);
    let _ = writeln!(out, "sent rule         {}", profile.sent_rule);
    let _ = writeln!(out, "subject template  {}", profile.subject_template);
    let columns = &profile.columns;
    let _ = writeln!(out, "columns:");
    for (label, header) in [
        ("name", &columns.name),
        ("email", &columns.email),
        ("course", &columns.course),
        ("timestamp", &columns.timestamp),
        ("sent", &columns.sent),
        ("roster name", &columns.roster_name),
        ("roster grade", &columns.roster_grade),
    ] {
        let _ = writeln!(out, "  {label:<13}{header}");
    }
    out
}

/// Writes rows as CSV: the sheet's own columns followed by the derived flags.
pub fn write_csv<W: io::Write>(rows: &[Respondent], writer: W) -> AppResult<()> {
    let mut out = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    if let Some(first) = rows.first() {
        let mut header: Vec<&str> = first.record.fields().map(|(key, _)| key).collect();
        header.extend(["sent", "duplicate"]);
        out.write_record(&header)?;
    }
    for respondent in rows {
        let mut row: Vec<&str> = respondent.record.fields().map(|(_, value)| value).collect();
        row.push(flag(respondent.sent));
        row.push(flag(respondent.duplicate));
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn progress_bar(percent: u32) -> String {
    const WIDTH: usize = 30;
    let filled = (percent.min(100) as usize * WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(WIDTH - filled))
}
