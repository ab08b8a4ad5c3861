use std::fmt;

use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::ingestion::Respondent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RespondentFilter {
    #[default]
    All,
    Pending,
    Sent,
    Duplicate,
}

impl RespondentFilter {
    pub const ALL: [RespondentFilter; 4] = [
        RespondentFilter::All,
        RespondentFilter::Pending,
        RespondentFilter::Sent,
        RespondentFilter::Duplicate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RespondentFilter::All => "all",
            RespondentFilter::Pending => "pending",
            RespondentFilter::Sent => "sent",
            RespondentFilter::Duplicate => "duplicate",
        }
    }

    /// Unknown names fall back to `All`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => RespondentFilter::Pending,
            "sent" => RespondentFilter::Sent,
            "duplicate" => RespondentFilter::Duplicate,
            _ => RespondentFilter::All,
        }
    }

    pub fn matches(&self, respondent: &Respondent) -> bool {
        match self {
            RespondentFilter::All => true,
            RespondentFilter::Pending => !respondent.sent,
            RespondentFilter::Sent => respondent.sent,
            RespondentFilter::Duplicate => respondent.duplicate,
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            RespondentFilter::All => "No responses yet.",
            RespondentFilter::Pending => "No respondents are waiting for a mail.",
            RespondentFilter::Sent => "No mails have been sent yet.",
            RespondentFilter::Duplicate => "No duplicate email submissions.",
        }
    }
}

impl fmt::Display for RespondentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Respondents matching `filter`, in source order. The input is untouched.
pub fn filter_respondents(respondents: &[Respondent], filter: RespondentFilter) -> Vec<Respondent> {
    respondents
        .iter()
        .filter(|respondent| filter.matches(respondent))
        .cloned()
        .collect()
}

/// Active filter plus the selected position within the filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub filter: RespondentFilter,
    pub selected: Option<usize>,
}

impl ViewState {
    pub fn new(filter: RespondentFilter) -> Self {
        Self {
            filter,
            selected: None,
        }
    }

    /// Switching filters always drops the selection.
    pub fn set_filter(&mut self, filter: RespondentFilter) {
        self.filter = filter;
        self.selected = None;
    }

    pub fn select(&mut self, index: usize, visible_len: usize) -> AppResult<()> {
        if index >= visible_len {
            return Err(AppError::SelectionOutOfRange {
                index,
                len: visible_len,
            });
        }
        self.selected = Some(index);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::ingestion::Record;

    fn rows() -> Vec<Respondent> {
        [("a", true, false), ("b", false, true), ("c", false, false), ("d", true, true)]
            .into_iter()
            .map(|(name, sent, duplicate)| {
                Respondent::new([("Name", name)].into_iter().collect::<Record>(), sent)
                    .with_duplicate(duplicate)
            })
            .collect()
    }

    fn names(rows: &[Respondent]) -> Vec<&str> {
        rows.iter().map(|r| r.record.value("Name")).collect()
    }

    #[test]
    fn filters_by_flag_in_source_order() {
        let rows = rows();
        assert_eq!(names(&filter_respondents(&rows, RespondentFilter::All)), ["a", "b", "c", "d"]);
        assert_eq!(names(&filter_respondents(&rows, RespondentFilter::Pending)), ["b", "c"]);
        assert_eq!(names(&filter_respondents(&rows, RespondentFilter::Sent)), ["a", "d"]);
        assert_eq!(names(&filter_respondents(&rows, RespondentFilter::Duplicate)), ["b", "d"]);
    }

    #[test]
    fn pending_and_sent_partition_the_list() {
        let rows = rows();
        let pending = filter_respondents(&rows, RespondentFilter::Pending);
        let sent = filter_respondents(&rows, RespondentFilter::Sent);

        let pending: HashSet<_> = names(&pending).into_iter().collect();
        let sent: HashSet<_> = names(&sent).into_iter().collect();
        let all: HashSet<_> = names(&rows).into_iter().collect();

        assert!(pending.is_disjoint(&sent));
        assert_eq!(pending.union(&sent).copied().collect::<HashSet<_>>(), all);
    }

    #[test]
    fn filtering_is_repeatable_and_leaves_input_alone() {
        let rows = rows();
        let before = rows.clone();
        let first = filter_respondents(&rows, RespondentFilter::Pending);
        let second = filter_respondents(&rows, RespondentFilter::Pending);
        assert_eq!(first, second);
        assert_eq!(rows, before);
    }

    #[test]
    fn unknown_names_fall_back_to_all() {
        assert_eq!(RespondentFilter::parse("bogus"), RespondentFilter::All);
        assert_eq!(RespondentFilter::parse(" Sent "), RespondentFilter::Sent);
        for filter in RespondentFilter::ALL {
            assert_eq!(RespondentFilter::parse(filter.as_str()), filter);
        }
    }

    #[test]
    fn changing_filter_resets_selection() {
        let mut view = ViewState::default();
        view.select(2, 4).unwrap();
        assert_eq!(view.selected, Some(2));

        view.set_filter(RespondentFilter::Sent);
        assert_eq!(view.selected, None);
        assert_eq!(view.filter, RespondentFilter::Sent);
    }

    #[test]
    fn rejects_selection_outside_view() {
        let mut view = ViewState::new(RespondentFilter::Pending);
        let err = view.select(2, 2).unwrap_err();
        assert!(matches!(err, AppError::SelectionOutOfRange { index: 2, len: 2 }));
        assert_eq!(view.selected, None);
    }
}
