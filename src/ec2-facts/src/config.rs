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

use std::time::Duration;

pub(crate) const METADATA_ROOT: &str = "http://169.254.169.254";
pub(crate) const DEFAULT_API_VERSION: &str = "latest";
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Overrides the metadata service endpoint, e.g. `http://127.0.0.1:1338`.
pub const METADATA_ENDPOINT_ENV_VAR: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";
/// Set to `true` to disable fact collection entirely.
pub const METADATA_DISABLED_ENV_VAR: &str = "AWS_EC2_METADATA_DISABLED";

const META_DATA_PATH: &str = "meta-data/";
const IDENTITY_DOCUMENT_PATH: &str = "dynamic/instance-identity/document";
const USER_DATA_PATH: &str = "user-data/";

/// The resolved settings used to reach the metadata service.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Config {
    pub(crate) endpoint: String,
    pub(crate) api_version: String,
    pub(crate) connect_timeout: Duration,
    pub(crate) timeout: Duration,
    pub(crate) disabled: bool,
    /// True if the endpoint was NOT overridden by env var or builder.
    pub(crate) is_default_endpoint: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: METADATA_ROOT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            disabled: false,
            is_default_endpoint: true,
        }
    }
}

impl Config {
    /// Applies the environment variables on top of the builder settings.
    pub(crate) fn resolve(
        endpoint_override: Option<String>,
        api_version: Option<String>,
        connect_timeout: Option<Duration>,
        timeout: Option<Duration>,
    ) -> Self {
        let (endpoint, is_default_endpoint) = resolve_endpoint(endpoint_override);
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let api_version = api_version
            .map(|v| v.trim_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        Self {
            endpoint,
            api_version,
            connect_timeout: connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            disabled: disabled_by_env(),
            is_default_endpoint,
        }
    }

    /// The URL used to check whether the service is reachable.
    pub(crate) fn root_url(&self) -> String {
        format!("{}/", self.endpoint)
    }

    /// The URL of a path below `meta-data/`.
    ///
    /// Directory paths keep their trailing `/`, the service requires it to
    /// return the listing.
    pub(crate) fn metadata_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{META_DATA_PATH}{path}",
            self.endpoint, self.api_version
        )
    }

    pub(crate) fn identity_document_url(&self) -> String {
        format!(
            "{}/{}/{IDENTITY_DOCUMENT_PATH}",
            self.endpoint, self.api_version
        )
    }

    pub(crate) fn user_data_url(&self) -> String {
        format!("{}/{}/{USER_DATA_PATH}", self.endpoint, self.api_version)
    }
}

/// Determine the endpoint and whether it was overridden.
fn resolve_endpoint(endpoint_override: Option<String>) -> (String, bool) {
    if let Ok(endpoint) = std::env::var(METADATA_ENDPOINT_ENV_VAR) {
        // Check the environment variable first
        (endpoint, false)
    } else if let Some(e) = endpoint_override {
        (e, false)
    } else {
        (METADATA_ROOT.to_string(), true)
    }
}

fn disabled_by_env() -> bool {
    std::env::var(METADATA_DISABLED_ENV_VAR)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
