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

use anyhow::bail;
use clap::Parser;
use humantime::parse_duration;
use std::time::Duration;

/// Configuration options for the tool.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = super::DESCRIPTION)]
pub struct Args {
    /// The metadata service endpoint.
    ///
    /// The `AWS_EC2_METADATA_SERVICE_ENDPOINT` environment variable takes
    /// precedence over this flag.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// The metadata API version.
    #[arg(long, default_value = "latest")]
    pub api_version: String,

    /// The timeout to establish a connection.
    #[arg(long, value_parser = parse_duration, default_value = "1s")]
    pub connect_timeout: Duration,

    /// The timeout for each request.
    #[arg(long, value_parser = parse_duration, default_value = "2s")]
    pub timeout: Duration,

    /// The virtualization type, e.g. `xenu` or `kvm`.
    ///
    /// If not set, the tool probes the host.
    #[arg(long = "virtual")]
    pub virtual_type: Option<String>,

    /// Collect the facts without checking whether the host looks like an EC2
    /// instance.
    #[arg(long, default_value_t = false)]
    pub skip_detection: bool,

    /// Print the facts as a JSON object.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Log the requests sent to the metadata service.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Validates the arguments after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version.trim_matches('/').is_empty() {
            bail!("invalid api-version, must not be empty")
        }
        if self.connect_timeout.is_zero() {
            bail!("invalid connect-timeout, must be greater than zero")
        }
        if self.timeout.is_zero() {
            bail!("invalid timeout, must be greater than zero")
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                bail!("invalid endpoint {endpoint}, must start with http:// or https://")
            }
        }
        Ok(())
    }
}
