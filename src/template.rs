//! `{{name}}` placeholder substitution for mock templates.
//!
//! Substitution is literal: the text between the braces must match a variable
//! name exactly, unknown placeholders are left as they are, and inserted values
//! are never scanned again.

use crate::variables::Variables;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replace every `{{key}}` in `template` whose key is present in `variables`.
pub fn process(template: &str, variables: &Variables) -> String {
    if variables.is_empty() {
        return template.to_owned();
    }

    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        let inner = &rest[start + OPEN.len()..];

        let Some(end) = inner.find(CLOSE) else {
            // No closing braces anywhere after this point.
            output.push_str(&rest[start..]);
            return output;
        };

        match variables.get(&inner[..end]) {
            Some(value) => {
                output.push_str(value);
                rest = &inner[end + CLOSE.len()..];
            }
            None => {
                // Step over a single brace so `{{{name}}}` still matches `{{name}}`.
                output.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    output.push_str(rest);
    output
}
