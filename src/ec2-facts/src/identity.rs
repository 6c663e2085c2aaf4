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

//! Facts from the [instance identity document].
//!
//! [instance identity document]: https://docs.aws.amazon.com/AWSEC2/latest/UserGuide/instance-identity-documents.html

use crate::Result;
use crate::client::Fetch;
use crate::config::Config;
use crate::errors::Error;
use crate::facts::{FactValue, Facts, fact_name, snake_case};
use serde_json::{Map, Value};

/// Fetches the identity document and returns one fact per top-level key.
///
/// A missing or malformed document yields no facts.
pub(crate) async fn collect<F>(fetcher: &F, config: &Config) -> Facts
where
    F: Fetch + ?Sized,
{
    let url = config.identity_document_url();
    let body = match fetcher.read_uri(&url).await {
        Ok(body) => body,
        Err(e) if e.is_not_found() || e.is_connect() => {
            tracing::debug!("no instance identity document: {e}");
            return Facts::new();
        }
        Err(e) => {
            tracing::warn!("cannot fetch the instance identity document: {e}");
            return Facts::new();
        }
    };
    match parse_document(&body) {
        Ok(facts) => facts,
        Err(e) => {
            tracing::warn!("ignoring the instance identity document: {e}");
            Facts::new()
        }
    }
}

/// Converts the document into facts.
///
/// `null` values produce no fact. Strings are used verbatim, arrays become
/// lists, and any other value is rendered as compact JSON.
pub(crate) fn parse_document(body: &str) -> Result<Facts> {
    let document = serde_json::from_str::<Map<String, Value>>(body)
        .map_err(|e| Error::deserialize("instance identity", e))?;
    let facts = document
        .into_iter()
        .filter_map(|(key, value)| {
            let value = fact_value(value)?;
            Some((fact_name(&snake_case(&key)), value))
        })
        .collect();
    Ok(facts)
}

fn fact_value(value: Value) -> Option<FactValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(FactValue::Text(s)),
        Value::Array(items) => Some(FactValue::List(
            items.into_iter().map(element_text).collect(),
        )),
        other => Some(FactValue::Text(other.to_string())),
    }
}

fn element_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
