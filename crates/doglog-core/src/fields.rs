// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Canonical field resolution.
//!
//! A [`FieldMap`] maps each canonical field (`level`, `message`, ...) to an
//! ordered list of source keys. Resolving a field returns the first candidate
//! present in the bag holding a string value.

use std::collections::BTreeMap;

use tracing::debug;

use crate::constants::{
    CANONICAL_PREFIX, CLASSNAME, DATADOG_MESSAGE, DATADOG_STATUS, DATADOG_TIMESTAMP, LEVEL,
    MESSAGE, THREADNAME, TIMESTAMP,
};
use crate::error::ConfigError;
use crate::value::Bag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    fields: BTreeMap<String, Vec<String>>,
}

impl Default for FieldMap {
    fn default() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            LEVEL.to_string(),
            to_strings(&[
                DATADOG_STATUS,
                "level",
                "status",
                "loglevel",
                "log_status",
                "LogLevel",
                "severity",
            ]),
        );
        fields.insert(
            MESSAGE.to_string(),
            to_strings(&[DATADOG_MESSAGE, "message", "msg", "textPayload", "Message"]),
        );
        fields.insert(
            CLASSNAME.to_string(),
            to_strings(&["classname", "logger_name", "LoggerName", "component", "name"]),
        );
        fields.insert(
            THREADNAME.to_string(),
            to_strings(&["threadname", "thread_name"]),
        );
        fields.insert(
            TIMESTAMP.to_string(),
            to_strings(&[DATADOG_TIMESTAMP, "timestamp"]),
        );
        FieldMap { fields }
    }
}

impl FieldMap {
    /// Starts from the defaults and applies user overrides.
    ///
    /// Each override is a name and a comma-separated candidate list. The list
    /// replaces the default for that name, or adds a new canonical field.
    pub fn with_overrides<I, K, V>(overrides: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = FieldMap::default();
        for (name, candidates) in overrides {
            let name = canonical_name(name.as_ref());
            let list: Vec<String> = candidates
                .as_ref()
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            if name.is_empty() || list.is_empty() {
                return Err(ConfigError::EmptyFieldMapping(name.to_string()));
            }
            debug!("Field '{name}' mapped to {list:?}");
            map.fields.insert(name.to_string(), list);
        }
        Ok(map)
    }

    /// Candidate keys for `field`; an unmapped field is looked up under its own name.
    pub fn candidates<'a>(&'a self, field: &'a str) -> Vec<&'a str> {
        match self.fields.get(field) {
            Some(list) => list.iter().map(String::as_str).collect(),
            None => vec![field],
        }
    }

    /// Returns the value of the first candidate present in `bag` holding a string.
    ///
    /// Candidates holding any other kind of value are skipped.
    pub fn resolve<'b>(&self, field: &str, bag: &'b Bag) -> Option<&'b str> {
        self.candidates(field)
            .into_iter()
            .find_map(|key| bag.get(key).and_then(|value| value.as_str()))
    }

    /// Canonical field names in a stable order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Bag key a canonical field is stored under.
pub fn bag_key(field: &str) -> String {
    format!("{CANONICAL_PREFIX}{field}")
}

fn canonical_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix(CANONICAL_PREFIX).unwrap_or(name)
}

fn to_strings(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| (*k).to_string()).collect()
}
