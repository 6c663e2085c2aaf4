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

//! Signals used to decide whether the host looks like an EC2 instance.
//!
//! Fact collection only runs when the virtualization type names a cloud
//! hypervisor and the network shows a link-local signal, see
//! [Environment::is_ec2_like]. Applications with their own detection layer
//! fill in an [Environment] directly. [probe] gathers the same signals from a
//! Linux host.

use std::path::Path;

/// The hardware address EC2 uses for the default gateway's ARP entry.
const EC2_ARP_ADDRESS: &str = "fe:ff:ff:ff:ff:ff";
/// Eucalyptus assigns instance MAC addresses with this prefix.
const EUCA_MAC_PREFIX: &str = "d0:0d";
/// OpenStack assigns instance MAC addresses with this prefix.
const OPENSTACK_MAC_PREFIX: &str = "fa:16:3e";

/// What the environment-detection layer knows about the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    /// The virtualization type, e.g. `xenu`, `kvm`, or `physical`.
    pub virtual_type: String,
    /// The ARP table contains the EC2 gateway entry.
    pub has_ec2_arp: bool,
    /// An interface has a Eucalyptus MAC address.
    pub has_euca_mac: bool,
    /// An interface has an OpenStack MAC address.
    pub has_openstack_mac: bool,
}

impl Environment {
    /// An environment that passes the host checks, e.g. for callers that
    /// already know they run on EC2.
    pub fn ec2() -> Self {
        Self {
            virtual_type: "xenu".to_string(),
            has_ec2_arp: true,
            ..Self::default()
        }
    }

    /// Returns `true` if the virtualization type names a hypervisor used by
    /// EC2-style clouds.
    pub fn is_cloud_hypervisor(&self) -> bool {
        let v = self.virtual_type.to_ascii_lowercase();
        v.starts_with("xen") || v.starts_with("kvm")
    }

    /// Returns `true` if any link-local signal is present.
    pub fn has_link_local_signal(&self) -> bool {
        self.has_ec2_arp || self.has_euca_mac || self.has_openstack_mac
    }

    /// The host checks. The collector also requires the metadata service to
    /// be reachable.
    pub fn is_ec2_like(&self) -> bool {
        self.is_cloud_hypervisor() && self.has_link_local_signal()
    }
}

/// Returns `true` if an ARP table dump contains the EC2 gateway entry.
///
/// Accepts both `/proc/net/arp` and `arp -an` output.
pub fn has_ec2_arp_entry(arp_table: &str) -> bool {
    arp_table.to_ascii_lowercase().contains(EC2_ARP_ADDRESS)
}

/// Returns `true` if any of the MAC addresses belongs to Eucalyptus.
pub fn has_euca_mac<I, S>(macs: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    has_mac_prefix(macs, EUCA_MAC_PREFIX)
}

/// Returns `true` if any of the MAC addresses belongs to OpenStack.
pub fn has_openstack_mac<I, S>(macs: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    has_mac_prefix(macs, OPENSTACK_MAC_PREFIX)
}

fn has_mac_prefix<I, S>(macs: I, prefix: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    macs.into_iter()
        .any(|m| m.as_ref().trim().to_ascii_lowercase().starts_with(prefix))
}

/// Gathers the detection signals from the local Linux host.
///
/// Missing files or tools produce negative signals, never errors.
pub async fn probe() -> Environment {
    let root = Path::new("/");
    let arp_table = match read_trimmed(&root.join("proc/net/arp")).await {
        Some(table) => Some(table),
        None => arp_command().await,
    };
    probe_with(root, arp_table.as_deref()).await
}

/// Like [probe], rooted at `root` and with an explicit ARP table dump.
pub(crate) async fn probe_with(root: &Path, arp_table: Option<&str>) -> Environment {
    let macs = interface_macs(root).await;
    let environment = Environment {
        virtual_type: virtual_type(root).await,
        has_ec2_arp: arp_table.is_some_and(has_ec2_arp_entry),
        has_euca_mac: has_euca_mac(&macs),
        has_openstack_mac: has_openstack_mac(&macs),
    };
    tracing::debug!("probed environment: {environment:?}");
    environment
}

async fn virtual_type(root: &Path) -> String {
    if let Some(hypervisor) = read_trimmed(&root.join("sys/hypervisor/type")).await {
        if hypervisor.eq_ignore_ascii_case("xen") {
            return "xenu".to_string();
        }
    }
    let dmi = root.join("sys/class/dmi/id");
    let mut descriptions = Vec::new();
    for name in ["sys_vendor", "product_name"] {
        if let Some(value) = read_trimmed(&dmi.join(name)).await {
            descriptions.push(value);
        }
    }
    let description = descriptions.join(" ");
    if description.contains("HVM domU") || description.starts_with("Xen") {
        return "xenhvm".to_string();
    }
    if ["Amazon EC2", "KVM", "QEMU", "OpenStack"]
        .iter()
        .any(|needle| description.contains(needle))
    {
        return "kvm".to_string();
    }
    "physical".to_string()
}

async fn interface_macs(root: &Path) -> Vec<String> {
    let mut macs = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(root.join("sys/class/net")).await else {
        return macs;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Some(mac) = read_trimmed(&entry.path().join("address")).await {
            macs.push(mac);
        }
    }
    macs
}

async fn arp_command() -> Option<String> {
    let output = tokio::process::Command::new("arp")
        .arg("-an")
        .output()
        .await
        .inspect_err(|e| tracing::debug!("cannot run `arp -an`: {e}"))
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn read_trimmed(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use test_case::test_case;

    const PROC_NET_ARP: &str = "\
IP address       HW type     Flags       HW address            Mask     Device
10.0.2.1         0x1         0x2         fe:ff:ff:ff:ff:ff     *        eth0
";

    const ARP_AN: &str =
        "? (10.240.93.1) at FE:FF:FF:FF:FF:FF [ether] on eth0\n? (10.0.0.7) at 0a:1b:2c:3d:4e:5f [ether] on eth0\n";

    fn write(root: &Path, path: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = root.join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    #[test_case("xenu", true, true; "xen with arp")]
    #[test_case("kvm", true, true; "kvm with arp")]
    #[test_case("XenHVM", true, true; "mixed case")]
    #[test_case("physical", true, false; "physical")]
    #[test_case("vmware", true, false; "other hypervisor")]
    #[test_case("xenu", false, false; "no arp")]
    fn ec2_like(virtual_type: &str, arp: bool, want: bool) {
        let environment = Environment {
            virtual_type: virtual_type.to_string(),
            has_ec2_arp: arp,
            ..Environment::default()
        };
        assert_eq!(environment.is_ec2_like(), want, "{environment:?}");
    }

    #[test]
    fn mac_signals() {
        let environment = Environment {
            virtual_type: "kvm".to_string(),
            has_openstack_mac: true,
            ..Environment::default()
        };
        assert!(environment.is_ec2_like(), "{environment:?}");
        let environment = Environment {
            virtual_type: "xen".to_string(),
            has_euca_mac: true,
            ..Environment::default()
        };
        assert!(environment.is_ec2_like(), "{environment:?}");
        assert!(Environment::ec2().is_ec2_like());
    }

    #[test]
    fn arp_entry() {
        assert!(has_ec2_arp_entry(PROC_NET_ARP));
        assert!(has_ec2_arp_entry(ARP_AN));
        assert!(!has_ec2_arp_entry(
            "? (192.168.1.1) at 00:11:22:33:44:55 [ether] on wlan0"
        ));
        assert!(!has_ec2_arp_entry(""));
    }

    #[test]
    fn mac_prefixes() {
        assert!(has_euca_mac(["00:11:22:33:44:55", "D0:0D:12:34:56:78"]));
        assert!(!has_euca_mac(["00:11:22:33:44:55"]));
        assert!(has_openstack_mac(vec!["fa:16:3e:01:02:03\n".to_string()]));
        assert!(!has_openstack_mac(Vec::<String>::new()));
    }

    #[tokio::test]
    async fn probe_xen() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        write(root.path(), "sys/hypervisor/type", "xen\n")?;
        write(root.path(), "sys/class/net/eth0/address", "0a:1b:2c:3d:4e:5f\n")?;
        write(root.path(), "sys/class/net/lo/address", "00:00:00:00:00:00\n")?;

        let got = probe_with(root.path(), Some(PROC_NET_ARP)).await;
        assert_eq!(
            got,
            Environment {
                virtual_type: "xenu".to_string(),
                has_ec2_arp: true,
                has_euca_mac: false,
                has_openstack_mac: false,
            }
        );
        assert!(got.is_ec2_like());
        Ok(())
    }

    #[tokio::test]
    async fn probe_nitro() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        write(root.path(), "sys/class/dmi/id/sys_vendor", "Amazon EC2\n")?;
        write(root.path(), "sys/class/dmi/id/product_name", "m5.large\n")?;

        let got = probe_with(root.path(), Some(ARP_AN)).await;
        assert_eq!(got.virtual_type, "kvm");
        assert!(got.has_ec2_arp, "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn probe_openstack() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        write(root.path(), "sys/class/dmi/id/sys_vendor", "OpenStack Foundation\n")?;
        write(root.path(), "sys/class/dmi/id/product_name", "OpenStack Nova\n")?;
        write(root.path(), "sys/class/net/ens3/address", "fa:16:3e:aa:bb:cc\n")?;

        let got = probe_with(root.path(), None).await;
        assert_eq!(got.virtual_type, "kvm");
        assert!(!got.has_ec2_arp, "{got:?}");
        assert!(got.has_openstack_mac, "{got:?}");
        assert!(got.is_ec2_like());
        Ok(())
    }

    #[tokio::test]
    async fn probe_physical() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        write(root.path(), "sys/class/dmi/id/sys_vendor", "Dell Inc.\n")?;

        let got = probe_with(root.path(), Some("")).await;
        assert_eq!(
            got,
            Environment {
                virtual_type: "physical".to_string(),
                ..Environment::default()
            }
        );
        assert!(!got.is_ec2_like());
        Ok(())
    }
}
