use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::csv_line::tokenize_line;

/// One parsed sheet row, keyed by trimmed header name in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == header)
            .map(|(_, value)| value.as_str())
    }

    /// Value for `header`, or `""` when the column does not exist.
    pub fn value(&self, header: &str) -> &str {
        self.get(header).unwrap_or("")
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // A repeated header keeps its first position and takes the later value.
    fn insert(&mut self, header: String, value: String) {
        match self.fields.iter_mut().find(|(key, _)| *key == header) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((header, value)),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::default();
        for (key, value) in iter {
            record.insert(key.into(), value.into());
        }
        record
    }
}

/// A survey response row with its derived flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Respondent {
    pub record: Record,
    pub sent: bool,
    pub duplicate: bool,
}

impl Respondent {
    pub fn new(record: Record, sent: bool) -> Self {
        Self {
            record,
            sent,
            duplicate: false,
        }
    }

    pub fn with_duplicate(self, duplicate: bool) -> Self {
        Self { duplicate, ..self }
    }
}

/// One expected participant from the course roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub record: Record,
}

/// Decides whether a trimmed "sent" cell marks a response as processed.
pub trait SentPolicy: Send + Sync {
    fn is_sent(&self, value: &str) -> bool;
}

impl<F> SentPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_sent(&self, value: &str) -> bool {
        self(value)
    }
}

/// Sent when the cell equals the configured sentinel or `"1"`.
#[derive(Debug, Clone, Default)]
pub struct SentinelOrOne {
    pub sentinel: Option<String>,
}

impl SentPolicy for SentinelOrOne {
    fn is_sent(&self, value: &str) -> bool {
        value == "1" || self.sentinel.as_deref() == Some(value)
    }
}

/// Sent when the cell holds a circle mark (`O` or `o`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleMark;

impl SentPolicy for CircleMark {
    fn is_sent(&self, value: &str) -> bool {
        value.to_uppercase() == "O"
    }
}

/// Configurable selector for the built-in sent policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentRule {
    Sentinel { sentinel: Option<String> },
    Circle,
}

impl SentRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentRule::Sentinel { .. } => "sentinel",
            SentRule::Circle => "circle",
        }
    }

    pub fn policy(&self) -> Arc<dyn SentPolicy> {
        match self {
            SentRule::Sentinel { sentinel } => Arc::new(SentinelOrOne {
                sentinel: sentinel.clone(),
            }),
            SentRule::Circle => Arc::new(CircleMark),
        }
    }
}

impl Default for SentRule {
    fn default() -> Self {
        SentRule::Sentinel { sentinel: None }
    }
}

/// Header names the respondent parser keys on.
#[derive(Debug, Clone, Copy)]
pub struct RespondentSchema<'a> {
    pub name: &'a str,
    pub sent: &'a str,
}

/// Parses a respondent export into annotated rows, in source order.
///
/// Rows with an empty name are dropped; `duplicate` starts out false.
pub fn parse_respondents(
    document: &str,
    schema: RespondentSchema<'_>,
    policy: &dyn SentPolicy,
) -> Vec<Respondent> {
    let respondents: Vec<Respondent> = parse_records(document, schema.name)
        .map(|record| {
            let sent = policy.is_sent(sheet_trim(record.value(schema.sent)));
            Respondent::new(record, sent)
        })
        .collect();
    debug!(count = respondents.len(), "parsed respondent rows");
    respondents
}

/// Parses a roster export; rows with an empty name are dropped.
pub fn parse_roster(document: &str, name_header: &str) -> Vec<RosterEntry> {
    let roster: Vec<RosterEntry> = parse_records(document, name_header)
        .map(|record| RosterEntry { record })
        .collect();
    debug!(count = roster.len(), "parsed roster rows");
    roster
}

fn parse_records<'a>(
    document: &'a str,
    name_header: &'a str,
) -> impl Iterator<Item = Record> + 'a {
    let mut lines = document.split('\n');
    let headers: Vec<String> = lines
        .next()
        .map(tokenize_line)
        .unwrap_or_default()
        .into_iter()
        .map(|header| sheet_trim(&header).to_string())
        .collect();

    lines
        .filter(|line| !sheet_trim(line).is_empty())
        .map(move |line| build_record(&headers, tokenize_line(line)))
        .filter(move |record| !record.value(name_header).is_empty())
}

fn build_record(headers: &[String], values: Vec<String>) -> Record {
    let mut values = values.into_iter();
    headers
        .iter()
        .map(|header| {
            let value = values
                .next()
                .map(|raw| sheet_trim(&raw).to_string())
                .unwrap_or_default();
            (header.clone(), value)
        })
        .collect()
}

/// Trims whitespace and byte-order marks the way the sheet exports need.
pub fn sheet_trim(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}
