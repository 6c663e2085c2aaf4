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

//! Discover facts about an instance from the EC2 instance metadata service.
//!
//! EC2 (and compatible clouds such as OpenStack or Eucalyptus) expose the
//! configuration of each instance through a [metadata service] at the
//! link-local address `169.254.169.254`. This crate walks that service and
//! flattens what it finds into named facts:
//!
//! * every leaf below `meta-data/`, e.g. `ec2_ami_id` or
//!   `ec2_placement_availability_zone`,
//! * every key of the instance identity document, e.g. `ec2_region`,
//! * the raw user-data, as `ec2_userdata`.
//!
//! The facts are returned in an explicit [Facts][facts::Facts] table, the
//! application decides how to report them. Start with
//! [collector::Builder].
//!
//! [metadata service]: https://docs.aws.amazon.com/AWSEC2/latest/UserGuide/instancedata-data-retrieval.html

pub mod client;
pub mod collector;
pub mod environment;
pub mod errors;
pub mod facts;

pub(crate) mod config;
pub(crate) mod identity;
pub(crate) mod metadata;
pub(crate) mod userdata;

pub use config::{METADATA_DISABLED_ENV_VAR, METADATA_ENDPOINT_ENV_VAR};

/// A `Result` alias where the `Err` case is `ec2_facts::errors::Error`.
pub type Result<T> = std::result::Result<T, crate::errors::Error>;
