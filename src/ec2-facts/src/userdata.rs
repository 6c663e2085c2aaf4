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

use crate::client::Fetch;
use crate::config::Config;
use crate::facts::{FACT_PREFIX, FactValue};

pub(crate) const USER_DATA_FACT: &str = "userdata";

/// The name of the user-data fact, `ec2_userdata`.
pub fn fact_name() -> String {
    format!("{FACT_PREFIX}{USER_DATA_FACT}")
}

/// Fetches the user-data, kept as a single raw string.
///
/// EC2 answers 404 when the instance was launched without user-data, that
/// and an empty body both mean there is no fact.
pub(crate) async fn collect<F>(fetcher: &F, config: &Config) -> Option<FactValue>
where
    F: Fetch + ?Sized,
{
    match fetcher.read_uri(&config.user_data_url()).await {
        Ok(body) if body.is_empty() => None,
        Ok(body) => Some(FactValue::List(vec![body])),
        Err(e) if e.is_not_found() || e.is_connect() => {
            tracing::debug!("no user-data: {e}");
            None
        }
        Err(e) => {
            tracing::warn!("cannot fetch the user-data: {e}");
            None
        }
    }
}
