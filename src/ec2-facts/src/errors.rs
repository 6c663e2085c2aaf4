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

//! Errors returned while talking to the instance metadata service.

use http::StatusCode;

/// Represents an error fetching or decoding a metadata resource.
///
/// Fact collection never surfaces these errors to its callers; a failed fetch
/// simply means fewer facts. They are public so applications using
/// [Fetch][crate::client::Fetch] directly can tell an unreachable service
/// apart from a missing resource.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The connection could not be established, or the request timed out.
    #[error("cannot connect to the metadata service at {url}")]
    Connect {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The service answered with a non-2xx status code.
    #[error("the metadata service returned {status} for {url}")]
    Status { url: String, status: StatusCode },

    /// The response headers arrived but the body could not be read as text.
    #[error("cannot read the response body for {url}")]
    Body {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A JSON document returned by the service could not be parsed.
    #[error("cannot parse the {what} document")]
    Deserialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn connect<T: Into<String>, E>(url: T, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Connect {
            url: url.into(),
            source: source.into(),
        }
    }

    pub(crate) fn status<T: Into<String>>(url: T, status: StatusCode) -> Self {
        Error::Status {
            url: url.into(),
            status,
        }
    }

    pub(crate) fn body<T: Into<String>, E>(url: T, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Body {
            url: url.into(),
            source: source.into(),
        }
    }

    pub(crate) fn deserialize(what: &'static str, source: serde_json::Error) -> Self {
        Error::Deserialize { what, source }
    }

    /// Returns `true` if the service could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, Error::Connect { .. })
    }

    /// The HTTP status code, if the service answered with an error status.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the service answered, but the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND)
    }
}
