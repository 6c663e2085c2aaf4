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

//! Print the facts discovered from the EC2 instance metadata service.

mod args;

use anyhow::Result;
use args::Args;
use clap::Parser;
use ec2_facts::collector::Builder;
use ec2_facts::environment;
use ec2_facts::facts::Facts;
use std::io::Write;

const DESCRIPTION: &str = concat!(
    "Discovers facts about this instance from the EC2 instance metadata service.",
    " The tool walks the meta-data tree, reads the instance identity document,",
    " and the user-data, then prints one fact per line.",
    " Nothing is printed if the host does not look like an EC2 instance."
);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;
    let _guard = enable_tracing(&args);
    tracing::debug!("Configuration: {args:?}");

    let builder = Builder::default()
        .api_version(args.api_version.clone())
        .connect_timeout(args.connect_timeout)
        .timeout(args.timeout);
    let builder = match &args.endpoint {
        Some(endpoint) => builder.endpoint(endpoint.clone()),
        None => builder,
    };
    let mut collector = builder.build();

    let facts = if args.skip_detection {
        let mut facts = Facts::new();
        collector.collect(&mut facts).await;
        facts
    } else {
        let mut environment = environment::probe().await;
        if let Some(v) = &args.virtual_type {
            environment.virtual_type = v.clone();
        }
        collector
            .add_ec2_facts(Facts::new(), &environment, false)
            .await
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &facts)?;
        writeln!(out)?;
    } else {
        for (name, value) in facts.iter() {
            writeln!(out, "{name} => {value}")?;
        }
    }
    Ok(())
}

fn enable_tracing(args: &Args) -> tracing::dispatcher::DefaultGuard {
    use tracing_subscriber::fmt::format::FmtSpan;

    let max_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_max_level(max_level)
        .finish();

    tracing::subscriber::set_default(subscriber)
}
