//! Splitting a raw SQL script into individually executable statements.

/// Splits a migration script into separate statements.
///
/// A statement ends at a `;` that is outside both single-quoted string
/// literals and `$$`-quoted blocks, so scripts containing semicolons
/// inside literals or plpgsql bodies split correctly. The terminating
/// semicolon is kept on each statement. If the script ends with
/// non-blank content after the last terminator, that content is
/// returned as a final statement.
///
/// This never fails: malformed input (for example an unterminated
/// dollar-quoted block) yields a best-effort result.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut buf = String::new();
    let mut in_string = false;
    let mut in_dollar = false;
    let mut prev = '\0';

    for c in script.chars() {
        // A doubled apostrophe toggles twice, which keeps an escaped
        // quote inside the literal.
        if prev == '\'' {
            in_string = !in_string;
        }
        if c == '$' && prev == '$' && !in_string {
            in_dollar = !in_dollar;
        }
        buf.push(c);
        if c == ';' && !in_string && !in_dollar {
            let stmt = buf.trim();
            if !stmt.is_empty() {
                result.push(stmt.to_string());
            }
            buf.clear();
        }
        prev = c;
    }

    // Trailing content without a terminator is still one statement.
    let rest = buf.trim();
    if !rest.is_empty() {
        result.push(rest.to_string());
    }
    result
}
