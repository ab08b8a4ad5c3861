use std::collections::HashSet;

use serde::Serialize;

use crate::ingestion::{sheet_trim, Respondent, RosterEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponseStats {
    pub total: usize,
    pub sent: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub total_students: usize,
    pub responded_count: usize,
    pub sent_count: usize,
    pub response_rate: u32,
    pub sent_rate: u32,
    pub not_responded: Vec<RosterEntry>,
}

/// Header names used to match roster entries against respondents.
#[derive(Debug, Clone, Copy)]
pub struct NameKeys<'a> {
    pub respondent: &'a str,
    pub roster: &'a str,
}

pub fn compute_stats(respondents: &[Respondent]) -> ResponseStats {
    let total = respondents.len();
    let sent = count_sent(respondents);
    ResponseStats {
        total,
        sent,
        pending: total - sent,
    }
}

/// Roster-relative completion. `None` when no roster was loaded.
///
/// Non-responders are roster entries whose trimmed name matches no
/// respondent's trimmed name exactly.
pub fn compute_progress(
    respondents: &[Respondent],
    roster: Option<&[RosterEntry]>,
    keys: NameKeys<'_>,
) -> Option<ProgressSummary> {
    let roster = roster?;
    let total_students = roster.len();
    let responded_count = respondents.len();
    let sent_count = count_sent(respondents);

    let responded: HashSet<&str> = respondents
        .iter()
        .map(|r| sheet_trim(r.record.value(keys.respondent)))
        .collect();
    let not_responded = roster
        .iter()
        .filter(|entry| !responded.contains(sheet_trim(entry.record.value(keys.roster))))
        .cloned()
        .collect();

    Some(ProgressSummary {
        total_students,
        responded_count,
        sent_count,
        response_rate: percent(responded_count, total_students),
        sent_rate: percent(sent_count, total_students),
        not_responded,
    })
}

/// `round(100 * part / whole)` with halves rounded up; 0 for an empty whole.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part as u64 + whole as u64) / (2 * whole as u64)) as u32
}

fn count_sent(respondents: &[Respondent]) -> usize {
    respondents.iter().filter(|r| r.sent).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::Record;

    const KEYS: NameKeys<'static> = NameKeys {
        respondent: "Name",
        roster: "성명",
    };

    fn respondent(name: &str, sent: bool) -> Respondent {
        Respondent::new([("Name", name)].into_iter().collect::<Record>(), sent)
    }

    fn student(name: &str) -> RosterEntry {
        RosterEntry {
            record: [("성명", name)].into_iter().collect(),
        }
    }

    #[test]
    fn stats_partition_total() {
        let rows = vec![
            respondent("a", true),
            respondent("b", false),
            respondent("c", true),
        ];
        let stats = compute_stats(&rows);
        assert_eq!(
            stats,
            ResponseStats {
                total: 3,
                sent: 2,
                pending: 1
            }
        );
        assert_eq!(stats.sent + stats.pending, stats.total);
        assert_eq!(compute_stats(&[]).total, 0);
    }

    #[test]
    fn progress_lists_missing_students() {
        let rows = vec![respondent("Kim", true), respondent("Lee", false)];
        let roster = vec![student("Kim"), student("Lee"), student(" Park "), student("Choi")];
        let summary = compute_progress(&rows, Some(roster.as_slice()), KEYS).unwrap();

        assert_eq!(summary.total_students, 4);
        assert_eq!(summary.responded_count, 2);
        assert_eq!(summary.sent_count, 1);
        assert_eq!(summary.response_rate, 50);
        assert_eq!(summary.sent_rate, 25);
        let missing: Vec<_> = summary
            .not_responded
            .iter()
            .map(|s| s.record.value("성명"))
            .collect();
        assert_eq!(missing, vec![" Park ", "Choi"]);
    }

    #[test]
    fn empty_roster_has_zero_rates() {
        let rows = vec![respondent("Kim", true)];
        let summary = compute_progress(&rows, Some(&[][..]), KEYS).unwrap();
        assert_eq!(summary.response_rate, 0);
        assert_eq!(summary.sent_rate, 0);
        assert!(summary.not_responded.is_empty());
    }

    #[test]
    fn missing_roster_yields_no_progress() {
        assert!(compute_progress(&[respondent("Kim", false)], None, KEYS).is_none());
    }

    #[test]
    fn percentages_round_half_up() {
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(5, 4), 125);
    }
}
