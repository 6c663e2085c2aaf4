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

//! Flattens the `meta-data/` tree into facts.
//!
//! The service exposes instance metadata as a pseudo-filesystem. A path ending
//! in `/` is a directory, its body lists the children one per line. Any other
//! path is a leaf, its body is the value. For example:
//!
//! ```text
//! GET /latest/meta-data/            -> "ami-id\nplacement/\npublic-keys/"
//! GET /latest/meta-data/ami-id      -> "ami-5fb8c835"
//! GET /latest/meta-data/placement/  -> "availability-zone"
//! GET /latest/meta-data/public-keys/ -> "0=my-key"
//! ```
//!
//! produces `ec2_ami_id`, `ec2_placement_availability_zone` and the facts
//! below `public-keys/0/`.

use crate::client::Fetch;
use crate::config::Config;
use crate::errors::Error;
use crate::facts::{Facts, fact_name};

/// Directories nested deeper than this are not visited.
const MAX_DEPTH: usize = 16;

/// Walks the tree depth-first and returns one fact per leaf.
///
/// Failures are skipped: a leaf that cannot be fetched is omitted, and a
/// directory that cannot be listed drops its subtree. The rest of the walk
/// continues.
pub(crate) async fn collect<F>(fetcher: &F, config: &Config) -> Facts
where
    F: Fetch + ?Sized,
{
    let mut facts = Facts::new();
    // Directory prefixes still to visit, the root is the empty prefix.
    let mut pending = vec![String::new()];
    while let Some(dir) = pending.pop() {
        let listing = match fetcher.read_uri(&config.metadata_url(&dir)).await {
            Ok(body) => body,
            Err(e) => {
                skipped(&e);
                continue;
            }
        };

        let mut subdirs = Vec::new();
        for entry in parse_listing(&listing) {
            let path = format!("{dir}{entry}");
            if path.ends_with('/') {
                if path.matches('/').count() > MAX_DEPTH {
                    tracing::warn!("skipping metadata path {path}, nested too deep");
                    continue;
                }
                subdirs.push(path);
                continue;
            }
            match fetcher.read_uri(&config.metadata_url(&path)).await {
                Ok(body) => {
                    facts.insert(fact_name(&path), leaf_value(&body));
                }
                Err(e) => skipped(&e),
            }
        }
        // Pushed in reverse so siblings are visited in listing order.
        pending.extend(subdirs.into_iter().rev());
    }
    tracing::debug!("collected {} facts from the meta-data tree", facts.len());
    facts
}

/// Splits a directory listing into its entries.
///
/// Entries such as `0=my-key` (used by `public-keys/`) name the directory
/// `0/`. Entries that are not relative path segments, e.g. `/` or `a//b`,
/// are dropped.
pub(crate) fn parse_listing(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('=') {
            Some((index, _)) => format!("{index}/"),
            None => line.to_string(),
        })
        .filter(|entry| {
            let valid = !entry.starts_with('/') && !entry.contains("//");
            if !valid {
                tracing::warn!("ignoring malformed metadata listing entry {entry:?}");
            }
            valid
        })
        .collect()
}

/// Multi-line leaf values are reported as a single comma-separated string.
pub(crate) fn leaf_value(body: &str) -> String {
    body.lines().collect::<Vec<_>>().join(",")
}

fn skipped(e: &Error) {
    if e.is_not_found() {
        tracing::debug!("skipping metadata path: {e}");
    } else {
        tracing::warn!("skipping metadata path: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::MockFetch;
    use crate::facts::FactValue;
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use test_case::test_case;

    const ROOT: &str = "http://169.254.169.254/latest/meta-data/";

    /// A mock answering from a canned set of `path -> body` responses.
    ///
    /// Paths missing from `responses` produce a 404.
    fn canned(responses: &[(&str, &str)]) -> MockFetch {
        let responses: HashMap<String, String> = responses
            .iter()
            .map(|(path, body)| (format!("{ROOT}{path}"), body.to_string()))
            .collect();
        let mut mock = MockFetch::new();
        mock.expect_read_uri()
            .returning(move |url| match responses.get(url) {
                Some(body) => Ok(body.clone()),
                None => Err(Error::status(url, StatusCode::NOT_FOUND)),
            });
        mock
    }

    #[test_case("", &[]; "empty")]
    #[test_case("some_key_name", &["some_key_name"]; "single")]
    #[test_case("ami-id\nplacement/\n", &["ami-id", "placement/"]; "trailing newline")]
    #[test_case("a\r\n\r\nb", &["a", "b"]; "blank lines")]
    #[test_case("0=my-key\n1=other-key", &["0/", "1/"]; "indexed")]
    #[test_case("/\nami-id", &["ami-id"]; "root slash")]
    #[test_case("/etc/passwd\nfoo//bar\n=orphan", &[]; "not relative")]
    fn listing(body: &str, want: &[&str]) {
        assert_eq!(parse_listing(body), want);
    }

    #[test_case("some_key_value", "some_key_value"; "single line")]
    #[test_case("bar\nbaz", "bar,baz"; "multi line")]
    #[test_case("bar\nbaz\n", "bar,baz"; "trailing newline")]
    #[test_case("sg-1\r\nsg-2", "sg-1,sg-2"; "crlf")]
    #[test_case("", ""; "empty")]
    fn leaf(body: &str, want: &str) {
        assert_eq!(leaf_value(body), want);
    }

    #[tokio::test]
    async fn single_leaf() {
        let mock = canned(&[("", "some_key_name"), ("some_key_name", "some_key_value")]);
        let facts = collect(&mock, &Config::default()).await;
        assert_eq!(
            facts,
            Facts::from_iter([("ec2_some_key_name", "some_key_value")])
        );
    }

    #[tokio::test]
    async fn comma_separated() {
        let mock = canned(&[("", "some_key_name"), ("some_key_name", "bar\nbaz")]);
        let facts = collect(&mock, &Config::default()).await;
        assert_eq!(
            facts.get("ec2_some_key_name"),
            Some(&FactValue::from("bar,baz"))
        );
    }

    #[tokio::test]
    async fn structured() {
        let mock = canned(&[("", "foo/"), ("foo/", "bar"), ("foo/bar", "baz")]);
        let facts = collect(&mock, &Config::default()).await;
        assert_eq!(facts, Facts::from_iter([("ec2_foo_bar", "baz")]));
    }

    #[tokio::test]
    async fn empty_root() {
        let mut mock = MockFetch::new();
        mock.expect_read_uri()
            .times(1)
            .returning(|_| Ok(String::new()));
        let facts = collect(&mock, &Config::default()).await;
        assert!(facts.is_empty(), "{facts:?}");
    }

    #[tokio::test]
    async fn root_unreachable() {
        let mut mock = MockFetch::new();
        mock.expect_read_uri()
            .times(1)
            .returning(|url| Err(Error::connect(url, "connection refused")));
        let facts = collect(&mock, &Config::default()).await;
        assert!(facts.is_empty(), "{facts:?}");
    }

    #[tokio::test]
    async fn public_keys() {
        let mock = canned(&[
            ("", "ami-id\npublic-keys/"),
            ("ami-id", "ami-5fb8c835"),
            ("public-keys/", "0=my-key"),
            ("public-keys/0/", "openssh-key"),
            ("public-keys/0/openssh-key", "ssh-rsa AAAA my-key\n"),
        ]);
        let facts = collect(&mock, &Config::default()).await;
        assert_eq!(
            facts,
            Facts::from_iter([
                ("ec2_ami_id", "ami-5fb8c835"),
                ("ec2_public_keys_0_openssh_key", "ssh-rsa AAAA my-key"),
            ])
        );
    }

    #[tokio::test]
    async fn failed_leaf_keeps_siblings() {
        // `broken` is missing from the canned responses and returns 404.
        let mock = canned(&[
            ("", "ami-id\nbroken\nplacement/\nmissing-dir/"),
            ("ami-id", "ami-5fb8c835"),
            ("placement/", "availability-zone"),
            ("placement/availability-zone", "us-east-1a"),
        ]);
        let facts = collect(&mock, &Config::default()).await;
        assert_eq!(
            facts,
            Facts::from_iter([
                ("ec2_ami_id", "ami-5fb8c835"),
                ("ec2_placement_availability_zone", "us-east-1a"),
            ])
        );
    }

    #[tokio::test]
    async fn self_referencing_listing_terminates() {
        let mut mock = MockFetch::new();
        mock.expect_read_uri()
            .times(1)
            .returning(|_| Ok("/".to_string()));
        let facts = collect(&mock, &Config::default()).await;
        assert!(facts.is_empty(), "{facts:?}");
    }

    #[tokio::test]
    async fn endless_nesting_is_capped() {
        // Every directory lists a single subdirectory `a/`. The root plus one
        // listing per allowed level.
        let mut mock = MockFetch::new();
        mock.expect_read_uri()
            .times(MAX_DEPTH + 1)
            .returning(|_| Ok("a/".to_string()));
        let facts = collect(&mock, &Config::default()).await;
        assert!(facts.is_empty(), "{facts:?}");
    }

    #[tokio::test]
    async fn api_version() {
        let config = Config {
            api_version: "2008-02-01".to_string(),
            ..Config::default()
        };
        let mut mock = MockFetch::new();
        mock.expect_read_uri()
            .returning(|url| match url {
                "http://169.254.169.254/2008-02-01/meta-data/" => Ok("ami-id".to_string()),
                "http://169.254.169.254/2008-02-01/meta-data/ami-id" => {
                    Ok("ami-5fb8c835".to_string())
                }
                _ => Err(Error::status(url, StatusCode::NOT_FOUND)),
            });
        let facts = collect(&mock, &config).await;
        assert_eq!(facts, Facts::from_iter([("ec2_ami_id", "ami-5fb8c835")]));
    }
}
