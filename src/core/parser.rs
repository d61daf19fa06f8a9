/// Token-pair parser for authored condition, cost and effect lists.
///
/// Every entry is a `"token:value"` pair. All entries of a field are parsed
/// and every problem is collected, so authors see all mistakes at once.
use thiserror::Error;

use crate::schema::stats::{StatAmount, StatId};
use crate::schema::vocabulary::{Condition, Effect};

const CONDITION_KEYS: [&str; 3] = ["item", "title", "node_kind"];
const EFFECT_KEYS: [&str; 3] = ["event", "item", "title"];

/// One or more bad entries in a single field, one message per entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join("\n"))]
pub struct ParseError {
    pub messages: Vec<String>,
}

/// Which vocabulary a field is parsed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Condition,
    Cost,
    Effect,
}

impl FieldKind {
    /// Every key accepted in this kind of field, in the order they are listed
    /// in diagnostics.
    pub fn valid_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = StatId::ALL.iter().map(StatId::key).collect();
        match self {
            Self::Condition => keys.extend(CONDITION_KEYS),
            Self::Effect => keys.extend(EFFECT_KEYS),
            Self::Cost => {}
        }
        keys
    }
}

/// Parse a `Conditions` list. Stat thresholds must be plain non-negative numbers.
pub fn parse_conditions(field: &str, entries: &[String]) -> Result<Vec<Condition>, ParseError> {
    parse_entries(field, entries, |key, value| parse_condition(field, key, value))
}

/// Parse a `Costs` list.
pub fn parse_costs(field: &str, entries: &[String]) -> Result<Vec<StatAmount>, ParseError> {
    parse_entries(field, entries, |key, value| {
        let Some(stat) = StatId::from_key(key) else {
            return Err(unknown_key(
                "unknown stat",
                "Valid stat keys are",
                key,
                field,
                FieldKind::Cost,
            ));
        };
        let amount = parse_unsigned(value).ok_or_else(|| {
            format!(
                "bad amount '{value}' in {field}. Expected a whole number of zero or more, like '{}:2'.",
                stat.key()
            )
        })?;
        Ok(StatAmount::new(stat, amount))
    })
}

/// Parse an `Effects` list. Stat changes are signed (`"food:+5"`, `"honor:-1"`).
pub fn parse_effects(field: &str, entries: &[String]) -> Result<Vec<Effect>, ParseError> {
    parse_entries(field, entries, |key, value| parse_effect(field, key, value))
}

fn parse_condition(field: &str, key: &str, value: &str) -> Result<Condition, String> {
    match key.to_ascii_lowercase().as_str() {
        "item" => return require_value(field, key, value).map(Condition::HasItem),
        "title" => return require_value(field, key, value).map(Condition::HasTitle),
        "node_kind" => return require_value(field, key, value).map(Condition::AtNodeKind),
        _ => {}
    }

    let Some(stat) = StatId::from_key(key) else {
        return Err(unknown_key(
            "unknown condition key",
            "Valid keys are",
            key,
            field,
            FieldKind::Condition,
        ));
    };

    let unsigned = value
        .strip_prefix('+')
        .filter(|rest| parse_unsigned(rest).is_some());
    if let Some(unsigned) = unsigned {
        return Err(format!(
            "bad amount '{value}' in {field}: conditions are minimum thresholds and do not allow a '+' sign. Use '{}:{unsigned}' instead.",
            stat.key()
        ));
    }
    if value.starts_with('-') {
        return Err(format!(
            "bad amount '{value}' in {field}: thresholds cannot be negative. Use Costs or Effects to spend or change stats."
        ));
    }

    let min_amount = parse_unsigned(value).ok_or_else(|| {
        format!("bad amount '{value}' in {field}. Expected a whole number of zero or more.")
    })?;
    Ok(Condition::StatThreshold { stat, min_amount })
}

fn parse_effect(field: &str, key: &str, value: &str) -> Result<Effect, String> {
    match key.to_ascii_lowercase().as_str() {
        "event" => return require_value(field, key, value).map(Effect::TriggerEvent),
        "item" => return require_value(field, key, value).map(Effect::GrantItem),
        "title" => return require_value(field, key, value).map(Effect::ChangeTitle),
        _ => {}
    }

    let Some(stat) = StatId::from_key(key) else {
        return Err(unknown_key(
            "unknown effect token",
            "Valid effect tokens are",
            key,
            field,
            FieldKind::Effect,
        ));
    };

    let amount = parse_signed(value).ok_or_else(|| {
        format!(
            "bad amount '{value}' in {field}. Expected a signed whole number, like '{0}:+3' or '{0}:-2'.",
            stat.key()
        )
    })?;
    Ok(Effect::StatChange { stat, amount })
}

/// Split, parse and collect. Blank entries are skipped.
fn parse_entries<T, F>(
    field: &str,
    entries: &[String],
    mut parse_one: F,
) -> Result<Vec<T>, ParseError>
where
    F: FnMut(&str, &str) -> Result<T, String>,
{
    let mut parsed = Vec::with_capacity(entries.len());
    let mut messages = Vec::new();

    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((key, value)) = entry.split_once(':') else {
            messages.push(format!("bad {field} entry '{entry}'. Expected key:value."));
            continue;
        };
        match parse_one(key.trim(), value.trim()) {
            Ok(item) => parsed.push(item),
            Err(message) => messages.push(message),
        }
    }

    if messages.is_empty() {
        Ok(parsed)
    } else {
        Err(ParseError { messages })
    }
}

fn require_value(field: &str, key: &str, value: &str) -> Result<String, String> {
    if value.is_empty() {
        Err(format!("missing value for '{key}' in {field}. Expected '{key}:<id>'."))
    } else {
        Ok(value.to_string())
    }
}

fn unknown_key(what: &str, listing: &str, key: &str, field: &str, kind: FieldKind) -> String {
    let keys = kind.valid_keys();
    let mut message = format!("{what} '{key}' in {field}. {listing}: {}.", keys.join(", "));
    if let Some(suggestion) = suggest(key, &keys) {
        message.push_str(&format!(" Did you mean '{suggestion}'?"));
    }
    message
}

/// The first known key that starts with what the author typed.
fn suggest<'a>(key: &str, known: &[&'a str]) -> Option<&'a str> {
    let key = key.to_ascii_lowercase();
    if key.is_empty() {
        return None;
    }
    known.iter().copied().find(|candidate| candidate.starts_with(&key))
}

fn parse_unsigned(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn parse_signed(value: &str) -> Option<i32> {
    match value.strip_prefix('-') {
        Some(magnitude) => parse_unsigned(magnitude)
            .and_then(|m| i64::from(m).checked_neg())
            .and_then(|m| i32::try_from(m).ok()),
        None => {
            let magnitude = value.strip_prefix('+').unwrap_or(value);
            parse_unsigned(magnitude).and_then(|m| i32::try_from(m).ok())
        }
    }
}
