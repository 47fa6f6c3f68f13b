//! Command templating with exactly two named slots.
//!
//! Test commands may reference `{command}` (the executable under test) and
//! `{count}` (the case's position in the global run, handy for generating
//! per-test artifact names). `{{` and `}}` escape literal braces. Anything
//! else is rejected, so a malformed template surfaces when the test file is
//! loaded rather than halfway through a run.

pub const SLOT_COMMAND: &str = "command";
pub const SLOT_COUNT: &str = "count";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}} (expected {{command}} or {{count}})")]
    UnknownPlaceholder(String),

    #[error("unmatched brace in command template")]
    UnmatchedBrace,

    #[error("no executable configured for the {{command}} placeholder")]
    MissingCommand,
}

/// Scan a template and return the slot names it references, validating brace
/// syntax and slot names. Called by the loader so bad templates are fatal at
/// load time.
pub fn placeholders(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names = Vec::new();
    scan(template, |name| match name {
        SLOT_COMMAND | SLOT_COUNT => {
            names.push(name.to_string());
            Ok(String::new())
        }
        other => Err(TemplateError::UnknownPlaceholder(other.to_string())),
    })?;
    Ok(names)
}

/// Substitute the two slots into `template`.
pub fn render(
    template: &str,
    command: Option<&str>,
    count: usize,
) -> Result<String, TemplateError> {
    scan(template, |name| match name {
        SLOT_COMMAND => command
            .map(str::to_string)
            .ok_or(TemplateError::MissingCommand),
        SLOT_COUNT => Ok(count.to_string()),
        // Unreachable after load-time validation, but render stands alone.
        other => Err(TemplateError::UnknownPlaceholder(other.to_string())),
    })
}

/// Shared scanner: walks the template, expanding `{{`/`}}` escapes and
/// passing each slot name to `resolve`.
fn scan(
    template: &str,
    mut resolve: impl FnMut(&str) -> Result<String, TemplateError>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(TemplateError::UnmatchedBrace),
                        Some(c) => name.push(c),
                    }
                }
                if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(TemplateError::UnknownPlaceholder(name));
                }
                out.push_str(&resolve(&name)?);
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::UnmatchedBrace);
                }
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
