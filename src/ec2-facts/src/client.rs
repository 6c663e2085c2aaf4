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

//! HTTP access to the instance metadata service.
//!
//! Fact collection only needs one operation: fetch the text behind a URL.
//! [Fetch] captures that operation so tests (and applications with unusual
//! transports) can substitute their own implementation.

use crate::Result;
use crate::config::Config;
use crate::errors::Error;
use reqwest::Client as ReqwestClient;

/// Fetches text resources from the metadata service.
#[async_trait::async_trait]
pub trait Fetch: std::fmt::Debug + Send + Sync {
    /// Performs a GET request and returns the response body.
    ///
    /// Implementations must return [Error::Connect] when no response was
    /// received, and [Error::Status] for non-2xx responses.
    async fn read_uri(&self, url: &str) -> Result<String>;
}

/// Returns `true` if the metadata service at `url` answers at all.
///
/// Any HTTP response, including an error status, means something is
/// listening. Only connection failures and timeouts map to `false`.
pub async fn can_connect<F>(fetcher: &F, url: &str) -> bool
where
    F: Fetch + ?Sized,
{
    match fetcher.read_uri(url).await {
        Ok(_) => true,
        Err(e) if e.is_connect() => {
            tracing::debug!("metadata service at {url} is unreachable: {e}");
            false
        }
        Err(e) => {
            tracing::debug!("metadata service at {url} answered with an error: {e}");
            true
        }
    }
}

/// A [Fetch] implementation backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: ReqwestClient,
}

impl HttpClient {
    pub(crate) fn new(config: &Config) -> Self {
        // `build()` only fails when a TLS backend cannot be initialized.
        let inner = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .no_proxy()
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("cannot configure the HTTP client, using defaults: {e}");
                ReqwestClient::new()
            });
        Self { inner }
    }
}

#[async_trait::async_trait]
impl Fetch for HttpClient {
    async fn read_uri(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {url}");
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| Error::connect(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::status(url, status));
        }

        response.text().await.map_err(|e| Error::body(url, e))
    }
}
