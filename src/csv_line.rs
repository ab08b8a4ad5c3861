/// Splits one line of sheet-export CSV into raw fields.
///
/// A double quote toggles quoted mode and is dropped; commas inside quotes
/// are kept. Doubled quotes are not an escape: `""` toggles twice and
/// yields nothing, and an unbalanced quote swallows the remaining commas of
/// the line. Spreadsheet exports we consume rely on this exact splitting.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
}
