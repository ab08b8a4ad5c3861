use std::collections::HashMap;

use serde::Serialize;

use crate::ingestion::Respondent;

/// Respondents sharing one normalized email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub email: String,
    pub indices: Vec<usize>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub respondents: Vec<Respondent>,
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    pub fn flagged_count(&self) -> usize {
        self.groups.iter().map(|group| group.indices.len()).sum()
    }
}

pub fn normalize_email(value: &str) -> String {
    value.to_lowercase().trim().to_string()
}

/// Groups respondents by normalized email and rebuilds every respondent
/// with its `duplicate` flag set. Blank emails never form a group.
///
/// Groups come out in order of each email's first appearance.
pub fn detect_duplicates(
    respondents: Vec<Respondent>,
    email_header: &str,
    name_header: &str,
) -> DuplicateReport {
    let mut order: Vec<String> = Vec::new();
    let mut by_email: HashMap<String, Vec<usize>> = HashMap::new();

    for (index, respondent) in respondents.iter().enumerate() {
        let email = normalize_email(respondent.record.value(email_header));
        if email.is_empty() {
            continue;
        }
        by_email
            .entry(email)
            .or_insert_with_key(|key| {
                order.push(key.clone());
                Vec::new()
            })
            .push(index);
    }

    let mut flagged = vec![false; respondents.len()];
    let groups: Vec<DuplicateGroup> = order
        .into_iter()
        .filter_map(|email| {
            let indices = by_email.remove(&email)?;
            if indices.len() < 2 {
                return None;
            }
            for &index in &indices {
                flagged[index] = true;
            }
            let names = indices
                .iter()
                .map(|&index| respondents[index].record.value(name_header).to_string())
                .collect();
            Some(DuplicateGroup {
                email,
                indices,
                names,
            })
        })
        .collect();

    let respondents = respondents
        .into_iter()
        .zip(flagged)
        .map(|(respondent, duplicate)| respondent.with_duplicate(duplicate))
        .collect();

    DuplicateReport {
        respondents,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::Record;

    fn respondent(name: &str, email: &str) -> Respondent {
        Respondent::new(
            [("Name", name), ("Email", email)].into_iter().collect::<Record>(),
            false,
        )
    }

    #[test]
    fn groups_case_and_whitespace_variants() {
        let rows = vec![
            respondent("Alice", "a@x.com"),
            respondent("Alicia", "A@X.com "),
            respondent("Bob", "b@x.com"),
        ];
        let report = detect_duplicates(rows, "Email", "Name");

        assert_eq!(report.groups.len(), 1);
        let group = &report.groups[0];
        assert_eq!(group.email, "a@x.com");
        assert_eq!(group.indices, vec![0, 1]);
        assert_eq!(group.names, vec!["Alice", "Alicia"]);

        let flags: Vec<_> = report.respondents.iter().map(|r| r.duplicate).collect();
        assert_eq!(flags, vec![true, true, false]);
        assert_eq!(report.flagged_count(), 2);
    }

    #[test]
    fn blank_emails_never_group() {
        let rows = vec![respondent("A", ""), respondent("B", "  "), respondent("C", "")];
        let report = detect_duplicates(rows, "Email", "Name");
        assert!(report.groups.is_empty());
        assert!(report.respondents.iter().all(|r| !r.duplicate));
    }

    #[test]
    fn groups_follow_first_appearance() {
        let rows = vec![
            respondent("B1", "b@x.com"),
            respondent("A1", "a@x.com"),
            respondent("B2", "b@x.com"),
            respondent("A2", "a@x.com"),
            respondent("A3", "A@x.com"),
        ];
        let report = detect_duplicates(rows, "Email", "Name");
        let emails: Vec<_> = report.groups.iter().map(|g| g.email.as_str()).collect();
        assert_eq!(emails, vec!["b@x.com", "a@x.com"]);
        assert_eq!(report.groups[1].indices, vec![1, 3, 4]);
        assert!(report.respondents.iter().all(|r| r.duplicate));
    }

    #[test]
    fn rerunning_clears_stale_flags() {
        let mut stale = respondent("Solo", "solo@x.com");
        stale.duplicate = true;
        let report = detect_duplicates(vec![stale], "Email", "Name");
        assert!(!report.respondents[0].duplicate);
    }
}
