// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Format templates and template selection.
//!
//! Templates use the `{{ ... }}` action syntax of the Go text templates doglog
//! configurations were written for:
//!
//! ```text
//! {{._Grey}}{{.__timestamp}} {{._Level_color}}{{.__level}}{{._Reset}} {{.__short_classname}} {{.__message}}
//! ```
//!
//! An action names a bag field either as `.name` (or bare `name`) or as
//! `index . "dotted.name"`, optionally followed by a pipeline of functions:
//! `upper`, `lower`, `trim`, `title`, `trunc N`, `quote` and `default "text"`.
//! A field may also be formatted with a single-argument `printf`, as in
//! `{{printf "%-5s" .__level}}`, where the verbs `%s`, `%v` and `%d` accept an
//! optional `-` flag and width. Actions written as `{{-` or `-}}` trim the
//! whitespace of the adjacent text.
//!
//! Any other action is rejected when the template is compiled, which makes the
//! configuration invalid as a whole.
//!
//! A template referencing a field that is absent from the bag fails as a whole
//! and the next template is tried. The list always ends with a fallback that
//! prints the JSON view of the record behind [`NO_FORMAT_DEFINED`].

use std::io::{self, Write};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::constants::{COMPUTED_JSON_FIELD, FALLBACK_TEMPLATE_NAME, NO_FORMAT_DEFINED};
use crate::error::{ConfigError, RenderError};
use crate::normalize::json_view;
use crate::value::{AttributeValue, Bag};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Function {
    Upper,
    Lower,
    Trim,
    Title,
    Trunc(usize),
    Quote,
    /// Replaces an empty value with the given text.
    Default(String),
}

impl Function {
    fn apply(&self, value: String, empty: bool) -> String {
        match self {
            Function::Upper => value.to_uppercase(),
            Function::Lower => value.to_lowercase(),
            Function::Trim => value.trim().to_string(),
            Function::Title => title_case(&value),
            Function::Trunc(len) => value.chars().take(*len).collect(),
            Function::Quote => serde_json::to_string(&value).unwrap_or(value),
            Function::Default(text) if empty => text.clone(),
            Function::Default(_) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormatPart {
    Literal(String),
    Value { left: bool, width: usize },
}

/// A `printf` format string holding exactly one value verb.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Printf {
    parts: Vec<FormatPart>,
}

impl Printf {
    fn parse(format: &str) -> Result<Self, String> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut values = 0;
        let mut chars = format.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                literal.push(ch);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }
            let left = chars.next_if_eq(&'-').is_some();
            let mut width = String::new();
            while let Some(digit) = chars.next_if(char::is_ascii_digit) {
                width.push(digit);
            }
            match chars.next() {
                Some('s' | 'v' | 'd') => {}
                _ => return Err(format!("unsupported printf format \"{format}\"")),
            }
            if !literal.is_empty() {
                parts.push(FormatPart::Literal(std::mem::take(&mut literal)));
            }
            parts.push(FormatPart::Value {
                left,
                width: width.parse().unwrap_or(0),
            });
            values += 1;
        }
        if !literal.is_empty() {
            parts.push(FormatPart::Literal(literal));
        }
        if values != 1 {
            return Err(format!(
                "printf format \"{format}\" must hold exactly one verb"
            ));
        }
        Ok(Printf { parts })
    }

    fn apply(&self, value: &str) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                FormatPart::Literal(text) => out.push_str(text),
                FormatPart::Value { left: true, width } => {
                    let width = *width;
                    out.push_str(&format!("{value:<width$}"));
                }
                FormatPart::Value { left: false, width } => {
                    let width = *width;
                    out.push_str(&format!("{value:>width$}"));
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field {
        key: String,
        printf: Option<Printf>,
        pipeline: Vec<Function>,
    },
}

/// One named, compiled template.
#[derive(Debug, Clone)]
pub struct FormatTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl FormatTemplate {
    pub fn parse(name: &str, source: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::Template {
            name: name.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut last = 0;
        let mut trim_next = false;
        for captures in action_regex().captures_iter(source) {
            let (Some(whole), Some(body)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let mut text = &source[last..whole.start()];
            if trim_next {
                text = text.trim_start();
            }
            let mut body = body.as_str();
            if let Some(rest) = body.strip_prefix('-') {
                text = text.trim_end();
                body = rest;
            }
            trim_next = false;
            if let Some(rest) = body.strip_suffix('-') {
                trim_next = true;
                body = rest;
            }
            if !text.is_empty() {
                segments.push(Segment::Text(text.to_string()));
            }
            segments.push(parse_action(body.trim()).map_err(invalid)?);
            last = whole.end();
        }

        let mut tail = &source[last..];
        if trim_next {
            tail = tail.trim_start();
        }
        if tail.contains("{{") {
            return Err(invalid("unclosed action".to_string()));
        }
        if !tail.is_empty() {
            segments.push(Segment::Text(tail.to_string()));
        }

        Ok(FormatTemplate {
            name: name.to_string(),
            segments,
        })
    }

    fn fallback() -> Self {
        FormatTemplate {
            name: FALLBACK_TEMPLATE_NAME.to_string(),
            segments: vec![
                Segment::Text(format!("{NO_FORMAT_DEFINED} ")),
                Segment::Field {
                    key: COMPUTED_JSON_FIELD.to_string(),
                    printf: None,
                    pipeline: Vec::new(),
                },
            ],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field keys referenced by the template, in order of appearance.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field { key, .. } => Some(key.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Renders the template, failing on the first field missing from `bag`.
    pub fn render(&self, bag: &Bag) -> Result<String, RenderError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field {
                    key,
                    printf,
                    pipeline,
                } => {
                    let value = bag
                        .get(key)
                        .ok_or_else(|| RenderError::MissingField(key.clone()))?;
                    let mut empty = is_empty_value(value);
                    let mut rendered = value.render();
                    if let Some(printf) = printf {
                        rendered = printf.apply(&rendered);
                        empty = rendered.is_empty();
                    }
                    for function in pipeline {
                        rendered = function.apply(rendered, empty);
                        empty = rendered.is_empty();
                    }
                    out.push_str(&rendered);
                }
            }
        }
        Ok(out)
    }
}

/// Output of a successful template selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub template: String,
    pub text: String,
}

impl Rendered {
    /// True when no configured template matched the record.
    pub fn is_fallback(&self) -> bool {
        is_unmatched(&self.text)
    }
}

/// An ordered list of templates terminated by the fallback template.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    templates: Vec<FormatTemplate>,
    fallback: FormatTemplate,
}

impl TemplateRenderer {
    /// Compiles `(name, source)` pairs in order.
    pub fn new<I, N, S>(definitions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let templates = definitions
            .into_iter()
            .map(|(name, source)| FormatTemplate::parse(name.as_ref(), source.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TemplateRenderer {
            templates,
            fallback: FormatTemplate::fallback(),
        })
    }

    /// Configured templates followed by the fallback.
    pub fn templates(&self) -> impl Iterator<Item = &FormatTemplate> {
        self.templates.iter().chain(std::iter::once(&self.fallback))
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Renders `bag` with the first template whose references are all present.
    pub fn render(&self, bag: &Bag) -> Rendered {
        for template in &self.templates {
            match template.render(bag) {
                Ok(text) => {
                    debug!("Applied template '{}' successfully", template.name());
                    return Rendered {
                        template: template.name().to_string(),
                        text,
                    };
                }
                Err(e) => debug!("failed to apply template '{}': {e}", template.name()),
            }
        }

        let text = self
            .fallback
            .render(bag)
            .unwrap_or_else(|_| format!("{NO_FORMAT_DEFINED} {}", json_view(bag, None)));
        Rendered {
            template: self.fallback.name().to_string(),
            text,
        }
    }
}

/// Which configured template list is used for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatProfile {
    #[default]
    Short,
    Long,
}

/// The short and long template profiles.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    short: TemplateRenderer,
    long: TemplateRenderer,
}

impl TemplateSet {
    /// An empty long profile falls back to the short templates.
    pub fn new(short: TemplateRenderer, long: TemplateRenderer) -> Self {
        let long = if long.is_empty() { short.clone() } else { long };
        TemplateSet { short, long }
    }

    pub fn profile(&self, profile: FormatProfile) -> &TemplateRenderer {
        match profile {
            FormatProfile::Short => &self.short,
            FormatProfile::Long => &self.long,
        }
    }
}

/// Whether `text` was produced by the fallback template.
pub fn is_unmatched(text: &str) -> bool {
    text.starts_with(NO_FORMAT_DEFINED)
}

/// Writes one rendered line, surrounding unmatched records with blank lines.
pub fn print_rendered<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    let unmatched = is_unmatched(text);
    if unmatched {
        writeln!(out)?;
    }
    writeln!(out, "{text}")?;
    if unmatched {
        writeln!(out)?;
    }
    Ok(())
}

fn action_regex() -> &'static Regex {
    static ACTION: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    ACTION.get_or_init(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("valid action regex"))
}

fn field_regex() -> &'static Regex {
    static FIELD: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    FIELD.get_or_init(|| {
        Regex::new(r#"^(?:index\s+\.\s+"([^"]+)"|\.?([^\s."][^\s"]*))$"#)
            .expect("valid field regex")
    })
}

fn printf_regex() -> &'static Regex {
    static PRINTF: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PRINTF.get_or_init(|| {
        Regex::new(r#"^printf\s+("(?:[^"\\]|\\.)*")\s+(.+)$"#).expect("valid printf regex")
    })
}

fn parse_action(body: &str) -> Result<Segment, String> {
    let unsupported = || format!("unsupported action \"{body}\"");
    let mut parts = split_pipeline(body).into_iter();
    let head = parts.next().unwrap_or_default().trim();

    let (printf, field) = match printf_regex().captures(head) {
        Some(captures) => {
            let (Some(format), Some(field)) = (captures.get(1), captures.get(2)) else {
                return Err(unsupported());
            };
            (
                Some(Printf::parse(&unquote(format.as_str())?)?),
                field.as_str().trim(),
            )
        }
        None => (None, head),
    };

    let captures = field_regex().captures(field).ok_or_else(unsupported)?;
    let key = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
        .ok_or_else(unsupported)?;

    let pipeline = parts
        .map(|part| parse_function(part.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Segment::Field {
        key,
        printf,
        pipeline,
    })
}

/// Decodes a double-quoted template string literal.
fn unquote(literal: &str) -> Result<String, String> {
    serde_json::from_str(literal).map_err(|_| format!("invalid string literal {literal}"))
}

/// Values `default` replaces: null, false, zero, and empty strings or containers.
fn is_empty_value(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Null => true,
        AttributeValue::Bool(b) => !b,
        AttributeValue::Number(n) => n.as_f64() == Some(0.0),
        AttributeValue::String(s) => s.is_empty(),
        AttributeValue::List(items) => items.is_empty(),
        AttributeValue::Map(map) => map.is_empty(),
    }
}

fn parse_function(text: &str) -> Result<Function, String> {
    if let Some(rest) = text.strip_prefix("default") {
        let rest = rest.trim();
        if rest.starts_with('"') && rest.len() > 1 && rest.ends_with('"') {
            return unquote(rest).map(Function::Default);
        }
        return Err(format!("default expects a quoted string, got \"{text}\""));
    }
    let mut words = text.split_whitespace();
    let function = match (words.next(), words.next()) {
        (Some("upper"), None) => Function::Upper,
        (Some("lower"), None) => Function::Lower,
        (Some("trim"), None) => Function::Trim,
        (Some("title"), None) => Function::Title,
        (Some("quote"), None) => Function::Quote,
        (Some("trunc"), Some(len)) => Function::Trunc(
            len.parse()
                .map_err(|_| format!("trunc expects a length, got \"{len}\""))?,
        ),
        _ => return Err(format!("unknown function \"{text}\"")),
    };
    if words.next().is_some() {
        return Err(format!("too many arguments in \"{text}\""));
    }
    Ok(function)
}

/// Splits an action on `|`, ignoring pipes inside double quotes.
fn split_pipeline(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, ch) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '|' if !in_quotes => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }
    out
}
