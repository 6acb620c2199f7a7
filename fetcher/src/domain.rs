//! Hostname-to-base-domain reduction and private-IP classification.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use url::Host;

use crate::allowlist::Allowlist;

/// The last two dot-labels of `host`, ignoring a trailing dot.
///
/// No public-suffix list is consulted: `foo.co.uk` reduces to `co.uk`. This
/// is intentionally imprecise (see DESIGN.md) and is always paired with the
/// mandatory private-IP check, so the precision loss only widens matches.
#[must_use]
pub fn base_domain(host: &str) -> String {
    let trimmed = host.strip_suffix('.').unwrap_or(host);
    let labels: Vec<&str> = trimmed.split('.').filter(|s| !s.is_empty()).collect();
    if labels.len() <= 2 {
        trimmed.to_string()
    } else {
        labels[labels.len() - 2..].join(".")
    }
}

/// Loopback, link-local, or RFC1918/RFC4193 private address.
#[must_use]
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_ipv4(v4),
        IpAddr::V6(v6) => is_private_ipv6(v6),
    }
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_link_local() || ip.is_private()
}

fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() {
        return true;
    }
    let first = ip.segments()[0];
    // fe80::/10
    if first & 0xffc0 == 0xfe80 {
        return true;
    }
    // fc00::/7 (unique local)
    first & 0xfe00 == 0xfc00
}

/// Parses `url` and rejects it unless the scheme is `http`/`https`, the host
/// is not a private-IP literal (when `check_private_ips`), and the host's
/// base domain is a member of `allowlist` (when `check_domain`).
#[must_use]
pub fn is_url_allowed(
    url: &str,
    allowlist: &Allowlist,
    check_private_ips: bool,
    check_domain: bool,
) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }
    let Some(host) = parsed.host() else {
        return false;
    };

    if check_private_ips {
        let is_private = match host {
            Host::Ipv4(ip) => is_private_ipv4(ip),
            Host::Ipv6(ip) => is_private_ipv6(ip),
            Host::Domain(_) => false,
        };
        if is_private {
            return false;
        }
    }

    if check_domain {
        let host_str = match &host {
            Host::Domain(name) => name.clone(),
            Host::Ipv4(ip) => ip.to_string(),
            Host::Ipv6(ip) => ip.to_string(),
        };
        if !allowlist.contains_domain(&base_domain(&host_str)) {
            return false;
        }
    }

    true
}
