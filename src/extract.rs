use regex::Regex;
use std::sync::LazyLock;

static SQL_VERB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(SELECT|WITH|INSERT|UPDATE|DELETE)\b")
        .expect("SQL_VERB_REGEX pattern is valid")
});

static SELECT_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)select").expect("SELECT_TOKEN_REGEX pattern is valid"));

/// Whether the trimmed candidate starts with a statement verb the pipeline
/// accepts: SELECT, WITH, INSERT, UPDATE, or DELETE.
pub fn is_valid_sql(candidate: &str) -> bool {
    SQL_VERB_REGEX.is_match(candidate.trim())
}

/// Locates a SQL statement inside free-form generated text. Strategies are
/// applied in strict precedence order; the first that yields a non-empty
/// candidate wins. Post-processing and verb validation apply regardless of
/// which strategy matched; `None` means extraction failed.
pub fn extract(raw_text: &str) -> Option<String> {
    let candidate = sql_fence(raw_text)
        .or_else(|| generic_fence(raw_text))
        .or_else(|| line_scan(raw_text))
        .or_else(|| verbatim_select(raw_text))?;

    let cleaned = post_process(&candidate);
    if !cleaned.is_empty() && is_valid_sql(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}

/// Strategy 1: text between a ```sql fence and the next ``` fence.
fn sql_fence(raw: &str) -> Option<String> {
    let (_, after) = raw.split_once("```sql")?;
    // A longer tag like ```sqlite is a generic fence, not a sql fence.
    if !after.is_empty() && !after.starts_with(char::is_whitespace) {
        return None;
    }
    let inner = after.split("```").next().unwrap_or(after);
    non_empty(inner.trim())
}

/// Strategy 2: text between the first and second generic ``` fence. A
/// language tag on the opening fence line is dropped.
fn generic_fence(raw: &str) -> Option<String> {
    let mut parts = raw.split("```");
    parts.next()?;
    let inner = parts.next()?.trim();

    let inner = match inner.split_once('\n') {
        Some((first_line, rest))
            if is_language_tag(first_line.trim()) && !rest.trim().is_empty() =>
        {
            rest.trim()
        }
        _ => inner,
    };
    non_empty(inner)
}

fn is_language_tag(line: &str) -> bool {
    !line.is_empty()
        && line.chars().all(|c| c.is_ascii_alphanumeric())
        && !is_valid_sql(line)
}

/// Strategy 3: line scan. Starts at the SELECT token on the first
/// non-comment line containing it, then accumulates lines until one ends
/// with `;` or a non-comment, non-empty line past the first is consumed.
fn line_scan(raw: &str) -> Option<String> {
    let mut lines = raw.lines();
    let first = loop {
        let line = lines.next()?;
        if line.trim_start().starts_with("--") {
            continue;
        }
        if let Some(m) = SELECT_TOKEN_REGEX.find(line) {
            break &line[m.start()..];
        }
    };

    let mut acc = vec![first];
    if !first.trim_end().ends_with(';') {
        for line in lines {
            acc.push(line);
            let trimmed = line.trim();
            if trimmed.ends_with(';') || (!trimmed.is_empty() && !trimmed.starts_with("--")) {
                break;
            }
        }
    }

    non_empty(acc.join("\n").trim())
}

/// Strategy 4: the trimmed raw text itself starts with SELECT.
fn verbatim_select(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.to_uppercase().starts_with("SELECT") {
        non_empty(trimmed)
    } else {
        None
    }
}

/// Strips remaining fence markers, trims, and removes a single layer of
/// leading/trailing quote characters.
fn post_process(candidate: &str) -> String {
    let stripped = candidate.replace("```sql", "").replace("```", "");
    let quotes: &[char] = &['"', '\''];
    let mut s = stripped.trim();
    if let Some(rest) = s.strip_prefix(quotes) {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix(quotes) {
        s = rest;
    }
    s.trim().to_string()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
