// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Facts and the fact table.

use std::collections::BTreeMap;

/// All fact names start with this prefix.
pub const FACT_PREFIX: &str = "ec2_";

/// The value of a fact.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FactValue {
    /// A single string, most metadata leaves produce these.
    Text(String),
    /// An ordered list of strings.
    List(Vec<String>),
}

impl FactValue {
    /// Returns the value if this is a [FactValue::Text].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Text(s) => Some(s),
            FactValue::List(_) => None,
        }
    }

    /// Returns the values if this is a [FactValue::List].
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FactValue::Text(_) => None,
            FactValue::List(v) => Some(v),
        }
    }
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Text(s) => f.write_str(s),
            FactValue::List(v) => f.write_str(&v.join(",")),
        }
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Text(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FactValue {
    fn from(value: Vec<String>) -> Self {
        FactValue::List(value)
    }
}

/// The facts discovered in one collection pass, keyed by name.
///
/// Inserting a fact with an existing name replaces its value, so running a
/// collection pass twice over the same table does not duplicate anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Facts {
    inner: BTreeMap<String, FactValue>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a fact, returning the previous value.
    pub fn insert<K, V>(&mut self, name: K, value: V) -> Option<FactValue>
    where
        K: Into<String>,
        V: Into<FactValue>,
    {
        self.inner.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FactValue> {
        self.inner.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over the facts in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactValue)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Moves every fact from `other` into this table, replacing duplicates.
    pub fn merge(&mut self, other: Facts) {
        self.inner.extend(other.inner);
    }

    pub fn into_inner(self) -> BTreeMap<String, FactValue> {
        self.inner
    }
}

impl<K, V> FromIterator<(K, V)> for Facts
where
    K: Into<String>,
    V: Into<FactValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let inner = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { inner }
    }
}

/// The fact name for a metadata path, e.g. `placement/availability-zone`
/// becomes `ec2_placement_availability_zone`.
pub fn fact_name(path: &str) -> String {
    let suffix: String = path
        .chars()
        .map(|c| if c == '/' || c == '-' { '_' } else { c })
        .collect();
    format!("{FACT_PREFIX}{suffix}")
}

/// Converts a camelCase (or mixed case) key to snake_case.
///
/// Acronyms stay together: `accountID` becomes `account_id` and
/// `IPAddress` becomes `ip_address`.
pub fn snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in chars.iter().copied().enumerate() {
        if c == '-' || c == '/' || c == ' ' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}
