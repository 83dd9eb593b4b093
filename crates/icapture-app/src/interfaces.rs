//! Network interface selection.
//!
//! Candidates are interfaces that are up, not loopback, and carry at least
//! one IPv4 address.

use std::fmt::Write;
use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink;

/// An interface the server can bind to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Interface name (e.g. `eth0`).
    pub name: String,
    /// Assigned IPv4 addresses, in system order.
    pub ipv4: Vec<Ipv4Addr>,
}

impl InterfaceInfo {
    /// Builds a candidate, or `None` if the interface is unusable.
    pub fn candidate(
        name: &str,
        is_up: bool,
        is_loopback: bool,
        ips: impl IntoIterator<Item = IpAddr>,
    ) -> Option<Self> {
        if !is_up || is_loopback {
            return None;
        }

        let ipv4: Vec<Ipv4Addr> = ips
            .into_iter()
            .filter_map(|ip| match ip {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .collect();

        if ipv4.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            ipv4,
        })
    }

    /// First IPv4 address; the one the server binds to.
    pub fn primary(&self) -> Option<Ipv4Addr> {
        self.ipv4.first().copied()
    }
}

/// Lists the usable interfaces on this host.
pub fn available_interfaces() -> Vec<InterfaceInfo> {
    datalink::interfaces()
        .iter()
        .filter_map(|iface| {
            InterfaceInfo::candidate(
                &iface.name,
                iface.is_up(),
                iface.is_loopback(),
                iface.ips.iter().map(|net| net.ip()),
            )
        })
        .collect()
}

/// Finds the bind address for a named interface.
pub fn resolve_interface(name: &str) -> Option<Ipv4Addr> {
    find_interface(&available_interfaces(), name).and_then(InterfaceInfo::primary)
}

fn find_interface<'a>(interfaces: &'a [InterfaceInfo], name: &str) -> Option<&'a InterfaceInfo> {
    interfaces.iter().find(|iface| iface.name == name)
}

/// Renders the numbered listing printed by `icapture interfaces`.
pub fn render_listing(interfaces: &[InterfaceInfo]) -> String {
    let mut out = String::new();
    for (index, iface) in interfaces.iter().enumerate() {
        let ips: Vec<String> = iface.ipv4.iter().map(|ip| ip.to_string()).collect();
        let _ = writeln!(out, " [{:2}] {:<9}: {}", index + 1, iface.name, ips.join(", "));
    }
    out
}
