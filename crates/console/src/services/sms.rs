//! SMS template rendering.

use std::collections::HashMap;

use crate::validation::FieldErrors;

/// Longest template body accepted.
pub const MAX_BODY_LEN: usize = 1000;

/// Substitute `{name}` placeholders in `body`.
///
/// Placeholders with no value in `vars` are left as written, braces
/// included, so a missing variable is visible in the preview.
#[must_use]
pub fn render<S: std::hash::BuildHasher>(body: &str, vars: &HashMap<String, String, S>) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some((before, after)) = rest.split_once('{') {
        out.push_str(before);

        let Some(close) = after.find(['}', '{']) else {
            out.push('{');
            out.push_str(after);
            return out;
        };
        let (name, tail) = after.split_at(close);

        let Some(tail) = tail.strip_prefix('}') else {
            // `{{name}`: the first brace is literal
            out.push('{');
            out.push_str(name);
            rest = tail;
            continue;
        };

        match vars.get(name.trim()) {
            Some(value) if is_placeholder_name(name) => out.push_str(value),
            _ => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = tail;
    }

    out.push_str(rest);
    out
}

fn is_placeholder_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Placeholder names used in `body`, in order of first appearance.
#[must_use]
pub fn placeholders(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = body;
    while let Some((_, after)) = rest.split_once('{') {
        let Some(close) = after.find(['}', '{']) else {
            break;
        };
        let (name, tail) = after.split_at(close);
        match tail.strip_prefix('}') {
            Some(tail) => {
                let name = name.trim();
                if is_placeholder_name(name) && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = tail;
            }
            None => rest = tail,
        }
    }
    names
}

/// Validate a template's name and body.
pub fn validate(errors: &mut FieldErrors, name: Option<&str>, body: Option<&str>) {
    if let Some(name) = name {
        errors.require("name", name);
        errors.max_len("name", name, 100);
    }
    if let Some(body) = body {
        errors.require("body", body);
        errors.max_len("body", body, MAX_BODY_LEN);
    }
}
