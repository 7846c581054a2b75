// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Record normalization.
//!
//! Turns a [`RawRecord`] into a flat bag of fields ready for template
//! rendering. The steps run in a fixed order and each may overwrite entries
//! written by a previous one:
//!
//! 1. flatten the nested attribute tree
//! 2. copy the built-in top-level fields under reserved keys
//! 3. resolve every canonical field of the [`FieldMap`]
//! 4. derive the level
//! 5. derive the message text
//! 6. derive the short classname
//! 7. derive the JSON view
//! 8. set the color escape fields

use chrono::{DateTime, SecondsFormat, Utc};

use crate::constants::*;
use crate::fields::{bag_key, FieldMap};
use crate::flatten::flatten;
use crate::search::RawRecord;
use crate::value::{AttributeValue, Bag};

/// The normalized, read-only view of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    fields: Bag,
}

impl NormalizedRecord {
    pub fn fields(&self) -> &Bag {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_str)
    }

    pub fn level(&self) -> &str {
        self.get_str(COMPUTED_LEVEL_FIELD).unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        self.get_str(COMPUTED_MESSAGE_FIELD).unwrap_or_default()
    }

    /// The JSON view of the record, always present.
    pub fn json(&self) -> &str {
        self.get_str(COMPUTED_JSON_FIELD).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    field_map: FieldMap,
    color: bool,
    long: bool,
}

impl Normalizer {
    /// `long` enables appending continuation lines of a multi-line secondary
    /// message to the message text.
    pub fn new(field_map: FieldMap, color: bool, long: bool) -> Self {
        Normalizer {
            field_map,
            color,
            long,
        }
    }

    pub fn normalize(&self, raw: &RawRecord) -> NormalizedRecord {
        let mut bag = flatten(&raw.attributes);

        copy_builtin_fields(raw, &mut bag);

        for name in self.field_map.names() {
            if let Some(value) = self.field_map.resolve(name, &bag).map(str::to_string) {
                bag.insert(bag_key(name), AttributeValue::String(value));
            }
        }

        let level = normalize_level(
            raw.status
                .as_deref()
                .or_else(|| bag.get(COMPUTED_LEVEL_FIELD).and_then(AttributeValue::as_str))
                .unwrap_or_default(),
        );
        bag.insert(
            COMPUTED_LEVEL_FIELD.to_string(),
            AttributeValue::String(level.clone()),
        );

        let message = self.message_text(&bag, raw.tags.as_deref());
        bag.insert(
            COMPUTED_MESSAGE_FIELD.to_string(),
            AttributeValue::String(message),
        );

        let short = bag
            .get(COMPUTED_CLASSNAME_FIELD)
            .and_then(AttributeValue::as_str)
            .map(|classname| short_classname(classname).to_string());
        if let Some(short) = short {
            bag.insert(
                COMPUTED_SHORT_CLASSNAME_FIELD.to_string(),
                AttributeValue::String(short),
            );
        }

        let json = json_view(&bag, raw.tags.as_deref());
        bag.insert(COMPUTED_JSON_FIELD.to_string(), AttributeValue::String(json));

        set_colors(&mut bag, self.color, &level);

        NormalizedRecord { fields: bag }
    }

    /// Picks the best text for the record's message.
    fn message_text(&self, bag: &Bag, tags: Option<&[String]>) -> String {
        let primary = bag
            .get(COMPUTED_MESSAGE_FIELD)
            .and_then(AttributeValue::as_str)
            .filter(|m| !m.is_empty());
        let secondary = self
            .field_map
            .resolve(FULL_MESSAGE, bag)
            .filter(|m| !m.is_empty());

        let mut text = match primary.or(secondary) {
            Some(text) => text.to_string(),
            None => json_view(bag, tags),
        };

        if self.long {
            if let Some(full) = secondary {
                if full != text {
                    append_continuation_lines(&mut text, full);
                }
            }
        }

        unescape_quotes(&text)
    }
}

/// Uppercases a level and maps it to a standard name by its first letter.
///
/// Unrecognized levels are returned uppercased but otherwise unchanged.
pub fn normalize_level(level: &str) -> String {
    let level = level.to_uppercase();
    let mapped = match level.chars().next() {
        Some('E') => ERROR_LEVEL,
        Some('F') => FATAL_LEVEL,
        Some('I') => INFO_LEVEL,
        Some('W') => WARN_LEVEL,
        Some('D') => DEBUG_LEVEL,
        Some('T') => TRACE_LEVEL,
        _ => return level,
    };
    mapped.to_string()
}

/// Escape sequence used to color a normalized level, empty when the level is unknown.
pub fn level_color(level: &str) -> &'static str {
    match level {
        DEBUG_LEVEL | TRACE_LEVEL => BLUE_ESC,
        INFO_LEVEL => GREEN_ESC,
        WARN_LEVEL => YELLOW_ESC,
        ERROR_LEVEL | FATAL_LEVEL => RED_ESC,
        _ => "",
    }
}

/// Last segment of a dotted class name.
pub fn short_classname(classname: &str) -> &str {
    classname.rsplit('.').next().unwrap_or(classname)
}

/// Builds the JSON view of a bag.
///
/// The bag is marshalled, its closing braces trimmed, the tag list spliced in
/// and every `\"` turned back into `"`. This is a textual splice kept for
/// output compatibility: the result is not guaranteed to be valid JSON.
pub fn json_view(bag: &Bag, tags: Option<&[String]>) -> String {
    let body = serde_json::to_string(bag).unwrap_or_default();
    let tags = serde_json::to_string(&tags).unwrap_or_default();

    let mut text = body.trim_end_matches('}').to_string();
    text.push_str(",\"tags\":");
    text.push_str(&tags);
    text.push('}');

    unescape_quotes(&text)
}

/// Formats a record timestamp in the fixed RFC 3339 wire format.
///
/// Values that do not parse are passed through untouched.
pub fn format_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Err(_) => timestamp.to_string(),
    }
}

fn copy_builtin_fields(raw: &RawRecord, bag: &mut Bag) {
    let builtins = [
        (DATADOG_STATUS, raw.status.clone()),
        (DATADOG_SERVICE, raw.service.clone()),
        (DATADOG_HOST, raw.host.clone()),
        (DATADOG_TIMESTAMP, raw.timestamp.as_deref().map(format_timestamp)),
        (DATADOG_MESSAGE, raw.message.clone()),
    ];
    for (key, value) in builtins {
        if let Some(value) = value {
            bag.insert(key.to_string(), AttributeValue::String(value));
        }
    }
}

fn set_colors(bag: &mut Bag, color: bool, level: &str) {
    for (field, escape) in COLOR_FIELDS {
        let value = if color { escape } else { "" };
        bag.insert(field.to_string(), AttributeValue::from(value));
    }
    let level_color = if color { level_color(level) } else { "" };
    bag.insert(LEVEL_COLOR_FIELD.to_string(), AttributeValue::from(level_color));
}

// Two lines: keep the second. More: keep everything but the first and last.
fn append_continuation_lines(text: &mut String, full: &str) {
    let lines: Vec<&str> = full.lines().collect();
    let interior = match lines.len() {
        0 | 1 => return,
        2 => &lines[1..],
        n => &lines[1..n - 1],
    };
    for line in interior {
        text.push('\n');
        text.push_str(line);
    }
}

fn unescape_quotes(text: &str) -> String {
    text.replace("\\\"", "\"")
}
