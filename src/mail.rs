use std::fmt::Write as _;

use serde::Serialize;

use crate::config::{FieldMap, MailSettings, SenderIdentity};
use crate::ingestion::Respondent;

const NAME_PLACEHOLDER: &str = "{name}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailDraft {
    /// Subject line and body as one block, ready to paste into a mail client.
    pub fn full_text(&self) -> String {
        format!("Subject: {}\n\n{}", self.subject, self.body)
    }
}

pub fn render_subject(template: &str, name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, name)
}

pub fn compose_draft(
    respondent: &Respondent,
    settings: &MailSettings,
    columns: &FieldMap,
) -> MailDraft {
    let record = &respondent.record;
    let name = record.value(&columns.name);
    let email = record.value(&columns.email);

    let mut body = String::new();
    let _ = writeln!(body, "Hello {name},");
    body.push('\n');
    let course = record.value(&columns.course);
    if course.is_empty() {
        body.push_str("Thank you for taking the time to answer our follow-up survey.\n");
    } else {
        let _ = writeln!(
            body,
            "Thank you for taking the time to answer our follow-up survey for {course}."
        );
    }
    body.push_str("Based on your answers, here is what we will focus on together:\n");

    for (question, answer) in record.fields() {
        if answer.is_empty() || question == columns.course || columns.is_identity_column(question)
        {
            continue;
        }
        let _ = write!(body, "\n- {question}\n  {answer}\n");
    }

    body.push_str("\nReply to this mail with any questions before our session.\n\n");
    push_signature(&mut body, &settings.sender);

    MailDraft {
        to: format!("{name} <{email}>"),
        subject: render_subject(&settings.subject_template, name),
        body,
    }
}

fn push_signature(body: &mut String, sender: &SenderIdentity) {
    body.push_str("Best regards,\n");
    let byline = [sender.name.as_str(), sender.title.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    for line in [byline.as_str(), sender.company.as_str(), sender.phone.as_str()] {
        if !line.is_empty() {
            body.push_str(line);
            body.push('\n');
        }
    }
}
