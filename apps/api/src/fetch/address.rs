//! Address policy for outbound fetches: resolve a URL's host and refuse
//! loopback, private, and link-local targets.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use async_trait::async_trait;
use url::{Host, Url};

use crate::fetch::error::FetchError;

/// DNS lookup seam. Implementations return the preferred address, or `None`
/// when the name has no records.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Option<IpAddr>>;
}

/// Resolver backed by the system resolver via `tokio::net::lookup_host`.
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Option<IpAddr>> {
        let mut addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.next().map(|addr| addr.ip()))
    }
}

/// Resolves `url`'s host (IP literals skip DNS) and applies the address policy.
///
/// Only the first resolved address is checked.
pub async fn check_host(url: &Url, resolver: &dyn HostResolver) -> Result<IpAddr, FetchError> {
    let ip = match url.host() {
        Some(Host::Ipv4(v4)) => IpAddr::V4(v4),
        Some(Host::Ipv6(v6)) => IpAddr::V6(v6),
        Some(Host::Domain(domain)) => {
            let port = url.port_or_known_default().unwrap_or(443);
            resolver
                .resolve(domain, port)
                .await
                .map_err(|_| FetchError::DnsFailed)?
                .ok_or(FetchError::DnsFailed)?
        }
        None => return Err(FetchError::InvalidUrl),
    };

    if is_disallowed(ip) {
        return Err(FetchError::UnsupportedAddress);
    }
    Ok(ip)
}

/// True for addresses a server-side fetch must never reach.
pub fn is_disallowed(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_disallowed_v4(v4),
        IpAddr::V6(v6) => is_disallowed_v6(v6),
    }
}

fn is_disallowed_v4(ip: Ipv4Addr) -> bool {
    // 10/8, 172.16/12, 192.168/16, 127/8, 169.254/16, 0/8
    ip.is_private() || ip.is_loopback() || ip.is_link_local() || ip.octets()[0] == 0
}

fn is_disallowed_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_disallowed_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xffc0) == 0xfe80 // link-local fe80::/10
        || (first & 0xfe00) == 0xfc00 // unique-local fc00::/7
}
