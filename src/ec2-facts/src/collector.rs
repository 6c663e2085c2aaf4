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

//! Collects EC2 facts into a [Facts] table.
//!
//! Example usage:
//!
//! ```no_run
//! # use ec2_facts::collector::Builder;
//! # use ec2_facts::environment;
//! # use ec2_facts::facts::Facts;
//! # async fn sample() {
//! let mut collector = Builder::default().build();
//! let environment = environment::probe().await;
//! let facts = collector
//!     .add_ec2_facts(Facts::new(), &environment, false)
//!     .await;
//! for (name, value) in facts.iter() {
//!     println!("{name} => {value}");
//! }
//! # }
//! ```

use crate::client::{Fetch, HttpClient, can_connect};
use crate::config::Config;
use crate::environment::Environment;
use crate::facts::{FactValue, Facts};
use crate::{identity, metadata, userdata};
use std::time::Duration;

/// Creates [Collector] instances.
///
/// The defaults target the well-known link-local endpoint
/// (`http://169.254.169.254`) and the `latest` API version.
#[derive(Debug, Default)]
pub struct Builder {
    endpoint: Option<String>,
    api_version: Option<String>,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl Builder {
    /// Sets the endpoint of the metadata service.
    ///
    /// If not set, the collector uses `http://169.254.169.254`. The
    /// `AWS_EC2_METADATA_SERVICE_ENDPOINT` environment variable, when set,
    /// takes precedence over this value.
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the metadata API version, e.g. `2008-02-01`.
    ///
    /// If not set, the collector uses `latest`.
    pub fn api_version<S: Into<String>>(mut self, api_version: S) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Sets the timeout to establish a connection. Defaults to 1 second.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the timeout for each request. Defaults to 2 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a [Collector] using HTTP to reach the metadata service.
    pub fn build(self) -> Collector<HttpClient> {
        let config = self.config();
        let fetcher = HttpClient::new(&config);
        Collector::new(fetcher, config)
    }

    /// Returns a [Collector] using a custom [Fetch] implementation.
    ///
    /// The timeouts are ignored, they only configure the HTTP client.
    pub fn build_with<F: Fetch>(self, fetcher: F) -> Collector<F> {
        Collector::new(fetcher, self.config())
    }

    fn config(self) -> Config {
        let config = Config::resolve(
            self.endpoint,
            self.api_version,
            self.connect_timeout,
            self.timeout,
        );
        if !config.is_default_endpoint {
            tracing::debug!("using metadata endpoint {}", config.endpoint);
        }
        config
    }
}

/// Where a [Collector] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No collection pass has run yet.
    Pending,
    /// A collection pass ran. Later calls need `force` to run again.
    Collected,
}

/// Discovers facts from the metadata service.
///
/// A collector runs its collection pass once; use the `force` flag of
/// [add_ec2_facts][Collector::add_ec2_facts] to run it again.
#[derive(Debug)]
pub struct Collector<F = HttpClient> {
    fetcher: F,
    config: Config,
    state: State,
}

impl<F> Collector<F>
where
    F: Fetch,
{
    pub(crate) fn new(fetcher: F, config: Config) -> Self {
        Self {
            fetcher,
            config,
            state: State::Pending,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Adds the EC2 facts to `facts` if the host looks like an EC2 instance.
    ///
    /// The host looks like an EC2 instance when `environment` passes
    /// [Environment::is_ec2_like] and the metadata service is reachable.
    /// Nothing happens if a previous call already collected the facts, unless
    /// `force` is set. Facts are replaced, never duplicated, so repeated
    /// forced calls with the same responses produce the same table.
    ///
    /// The collector does not keep the facts, the caller owns the table. Pass
    /// the table returned by the previous call back in, an unforced call
    /// after a completed pass returns `facts` unchanged.
    ///
    /// This function never fails: any error only means fewer facts.
    pub async fn add_ec2_facts(
        &mut self,
        mut facts: Facts,
        environment: &Environment,
        force: bool,
    ) -> Facts {
        if self.config.disabled {
            tracing::debug!("EC2 fact collection disabled by the environment");
            return facts;
        }
        if self.state == State::Collected && !force {
            tracing::debug!("EC2 facts already collected");
            return facts;
        }
        if !self.detect(environment).await {
            tracing::info!("host does not look like an EC2 instance, skipping EC2 facts");
            return facts;
        }
        self.collect(&mut facts).await;
        self.state = State::Collected;
        facts
    }

    /// Returns `true` if the host looks like an EC2 instance.
    pub async fn detect(&self, environment: &Environment) -> bool {
        if !environment.is_cloud_hypervisor() {
            tracing::debug!(
                "virtualization type {:?} is not a cloud hypervisor",
                environment.virtual_type
            );
            return false;
        }
        if !environment.has_link_local_signal() {
            tracing::debug!("no link-local ARP or MAC signal");
            return false;
        }
        can_connect(&self.fetcher, &self.config.root_url()).await
    }

    /// Runs a collection pass without any host checks.
    ///
    /// Collects the `meta-data/` tree, the instance identity document and the
    /// user-data, in that order, and merges them into `facts`.
    pub async fn collect(&self, facts: &mut Facts) {
        let before = facts.len();
        facts.merge(self.metadata().await);
        facts.merge(self.instance_identity().await);
        if let Some(value) = self.userdata().await {
            facts.insert(userdata::fact_name(), value);
        }
        tracing::info!(
            "collected EC2 facts, the table grew from {before} to {} entries",
            facts.len()
        );
    }

    /// The facts from the `meta-data/` tree.
    pub async fn metadata(&self) -> Facts {
        metadata::collect(&self.fetcher, &self.config).await
    }

    /// The facts from the instance identity document.
    pub async fn instance_identity(&self) -> Facts {
        identity::collect(&self.fetcher, &self.config).await
    }

    /// The value of the `ec2_userdata` fact, if there is any user-data.
    pub async fn userdata(&self) -> Option<FactValue> {
        userdata::collect(&self.fetcher, &self.config).await
    }
}
