//! Validation constraints attached to schema nodes.
//!
//! Constraints are derived from the raw `allowed:` and `syntax:expression:`
//! scopes of a `node.def` file. Shapes that cannot be understood are kept as
//! [`Constraint::Unrecognized`] so nothing from the grammar is silently lost.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::tree::{NodeType, SchemaNode};

/// A validation rule attached to a [`SchemaNode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Value must be one of `values`.
    AllowedValues {
        values: Vec<String>,
        reason: Option<String>,
    },
    /// Value must not be one of `values`.
    DisallowedValues {
        values: Vec<String>,
        reason: Option<String>,
    },
    /// External command printing the allowed values. Best effort: values
    /// created at runtime on the device are not listed.
    AllowedCommand { command: String },
    /// External command validating a single value.
    ValidateCommand {
        command: String,
        reason: Option<String>,
    },
    /// Value must match `pattern`.
    Pattern {
        pattern: String,
        reason: Option<String>,
    },
    /// Value must not match `pattern`.
    NegatedPattern {
        pattern: String,
        reason: Option<String>,
    },
    /// Inclusive numeric bounds.
    Range {
        min: Option<i64>,
        max: Option<i64>,
        reason: Option<String>,
    },
    /// Expression with no recognized shape.
    Unrecognized {
        expression: String,
        reason: Option<String>,
    },
}

/// Outcome of checking one value against one constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Pass,
    Fail(String),
    /// The constraint needs an external command or is not understood.
    Unchecked,
}

impl Constraint {
    /// Human failure reason supplied by the grammar, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Constraint::AllowedValues { reason, .. }
            | Constraint::DisallowedValues { reason, .. }
            | Constraint::ValidateCommand { reason, .. }
            | Constraint::Pattern { reason, .. }
            | Constraint::NegatedPattern { reason, .. }
            | Constraint::Range { reason, .. }
            | Constraint::Unrecognized { reason, .. } => reason.as_deref(),
            Constraint::AllowedCommand { .. } => None,
        }
    }

    /// Check `value` against this constraint without running commands.
    pub fn check(&self, value: &str) -> Check {
        let passed = match self {
            Constraint::AllowedValues { values, .. } => values.iter().any(|v| v == value),
            Constraint::DisallowedValues { values, .. } => !values.iter().any(|v| v == value),
            Constraint::Pattern { pattern, .. } | Constraint::NegatedPattern { pattern, .. } => {
                let Ok(re) = Regex::new(pattern) else {
                    return Check::Unchecked;
                };
                re.is_match(value) == matches!(self, Constraint::Pattern { .. })
            }
            Constraint::Range { min, max, .. } => {
                let Ok(number) = value.trim().parse::<i64>() else {
                    return self.fail(value);
                };
                min.map_or(true, |min| number >= min) && max.map_or(true, |max| number <= max)
            }
            Constraint::AllowedCommand { .. }
            | Constraint::ValidateCommand { .. }
            | Constraint::Unrecognized { .. } => return Check::Unchecked,
        };
        if passed {
            Check::Pass
        } else {
            self.fail(value)
        }
    }

    fn fail(&self, value: &str) -> Check {
        Check::Fail(
            self.reason()
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("value '{value}' is not allowed")),
        )
    }
}

/// Derive a constraint from the text following `syntax:expression:`.
pub fn from_expression(raw: &str) -> Constraint {
    static RANGE_TERM: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\$VAR\(@\)\s*(>=|<=|>|<)\s*(-?\d+)").expect("static regex must compile")
    });
    static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)^(!\s*)?pattern\s+\$VAR\(@\)\s+"(.*)"$"#)
            .expect("static regex must compile")
    });
    static IN_LIST: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)^(!\s*)?\$VAR\(@\)\s+in\s+(.+)$").expect("static regex must compile")
    });
    static EXEC: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)^exec\s+(.+)$").expect("static regex must compile"));
    static QUOTED: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("static regex must compile"));

    let (expression, reason) = split_reason(raw);

    if let Some(caps) = PATTERN.captures(expression) {
        let pattern = caps[2].to_string();
        return if caps.get(1).is_some() {
            Constraint::NegatedPattern { pattern, reason }
        } else {
            Constraint::Pattern { pattern, reason }
        };
    }

    if let Some(caps) = IN_LIST.captures(expression) {
        let values: Vec<String> = QUOTED
            .captures_iter(&caps[2])
            .map(|c| c[1].to_string())
            .collect();
        if !values.is_empty() {
            return if caps.get(1).is_some() {
                Constraint::DisallowedValues { values, reason }
            } else {
                Constraint::AllowedValues { values, reason }
            };
        }
    }

    if let Some(caps) = EXEC.captures(expression) {
        return Constraint::ValidateCommand {
            command: unquote(caps[1].trim()).to_string(),
            reason,
        };
    }

    let residue = RANGE_TERM.replace_all(expression, "");
    let only_comparisons = residue
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, '&' | '(' | ')'));
    if only_comparisons && RANGE_TERM.is_match(expression) {
        let mut min = None;
        let mut max = None;
        for caps in RANGE_TERM.captures_iter(expression) {
            let Ok(bound) = caps[2].parse::<i64>() else {
                continue;
            };
            match &caps[1] {
                ">=" => min = Some(bound),
                ">" => min = Some(bound.saturating_add(1)),
                "<=" => max = Some(bound),
                _ => max = Some(bound.saturating_sub(1)),
            }
        }
        return Constraint::Range { min, max, reason };
    }

    Constraint::Unrecognized {
        expression: expression.to_string(),
        reason,
    }
}

/// Derive a constraint from an `allowed:` command.
///
/// A plain `echo` of literal words enumerates the values directly; any other
/// command is kept for the device to run.
pub fn from_allowed(raw: &str) -> Constraint {
    let command = raw.trim();
    let literal = command
        .strip_prefix("echo ")
        .map(|rest| rest.trim_start_matches("-n ").trim())
        .filter(|rest| {
            !rest.contains(|c| {
                matches!(
                    c,
                    '$' | '`' | '|' | ';' | '(' | ')' | '{' | '}' | '*' | '?' | '\n' | '&'
                )
            })
        });

    match literal {
        Some(words) => {
            let values: Vec<String> = words
                .split_whitespace()
                .map(|w| w.trim_matches(|c| c == '"' || c == '\'').to_string())
                .filter(|w| !w.is_empty())
                .collect();
            if values.is_empty() {
                Constraint::AllowedCommand {
                    command: command.to_string(),
                }
            } else {
                Constraint::AllowedValues {
                    values,
                    reason: None,
                }
            }
        }
        None => Constraint::AllowedCommand {
            command: command.to_string(),
        },
    }
}

/// Check `value` against the node's declared type and constraints, returning
/// one message per failure. Command-based constraints are not evaluated.
pub fn validate_value(node: &SchemaNode, value: &str) -> Vec<String> {
    let mut failures = Vec::new();
    if !type_admits(node.node_type, value) {
        failures.push(format!("'{value}' is not a valid {}", node.node_type));
    }
    for constraint in &node.constraints {
        if let Check::Fail(reason) = constraint.check(value) {
            failures.push(reason);
        }
    }
    failures
}

fn type_admits(node_type: NodeType, value: &str) -> bool {
    static MAC: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").expect("static regex must compile")
    });

    match node_type {
        NodeType::Unset | NodeType::Txt => true,
        NodeType::Bool => matches!(value, "true" | "false"),
        NodeType::U32 => value.parse::<u32>().is_ok(),
        NodeType::MacAddr => MAC.is_match(value),
        NodeType::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
        NodeType::Ipv6 => value.parse::<Ipv6Addr>().is_ok(),
        NodeType::Ipv4Net => network_admits::<Ipv4Addr>(value, 32),
        NodeType::Ipv6Net => network_admits::<Ipv6Addr>(value, 128),
    }
}

fn network_admits<A: std::str::FromStr>(value: &str, max_prefix: u8) -> bool {
    let Some((address, prefix)) = value.split_once('/') else {
        return false;
    };
    address.parse::<A>().is_ok() && prefix.parse::<u8>().is_ok_and(|p| p <= max_prefix)
}

/// Split `expr ; "reason"` at the last `;` outside double quotes.
fn split_reason(raw: &str) -> (&str, Option<String>) {
    let mut in_quote = false;
    let mut escaped = false;
    let mut split_at = None;
    for (idx, c) in raw.char_indices() {
        match c {
            '\\' if !escaped => {
                escaped = true;
                continue;
            }
            '"' if !escaped => in_quote = !in_quote,
            ';' if !in_quote => split_at = Some(idx),
            _ => {}
        }
        escaped = false;
    }

    match split_at {
        Some(idx) => {
            let reason = unquote(raw[idx + 1..].trim());
            let reason = (!reason.is_empty()).then(|| reason.to_string());
            (raw[..idx].trim(), reason)
        }
        None => (raw.trim(), None),
    }
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
