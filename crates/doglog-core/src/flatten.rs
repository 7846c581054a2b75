// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use crate::value::{AttributeValue, Bag};

/// Collapses a tree of maps into a single top-level bag.
///
/// Nested maps are merged under their children's own keys and the parent key
/// is dropped, so siblings sharing a key overwrite each other (last visited
/// wins). List elements are emitted as `key.index` without descending into
/// them.
pub fn flatten(src: &BTreeMap<String, AttributeValue>) -> Bag {
    let mut dest = Bag::new();
    flatten_into(src, &mut dest);
    dest
}

/// Same as [`flatten`] but merges into an existing bag.
pub fn flatten_into(src: &BTreeMap<String, AttributeValue>, dest: &mut Bag) {
    for (key, value) in src {
        match value {
            AttributeValue::Map(child) => flatten_into(child, dest),
            AttributeValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    dest.insert(format!("{key}.{i}"), item.clone());
                }
            }
            scalar => {
                dest.insert(key.clone(), scalar.clone());
            }
        }
    }
}
