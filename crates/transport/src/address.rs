//! Outbound IP discovery.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use invoker::{InvokeError, LocalAddress};
use tracing::debug;

/// Reports the address of the interface the OS would route a probe through.
///
/// Connects an unbound UDP socket to a probe address and reads the local end.
/// Connecting a UDP socket only consults the routing table; no packet is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundAddress {
    probe: SocketAddr,
}

impl OutboundAddress {
    /// Default probe: a public IPv4 address.
    pub const DEFAULT_PROBE: SocketAddr =
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

    /// Uses `probe` to select the outbound route.
    pub fn new(probe: SocketAddr) -> Self {
        Self { probe }
    }
}

impl Default for OutboundAddress {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROBE)
    }
}

impl LocalAddress for OutboundAddress {
    fn local_ip(&self) -> Result<IpAddr, InvokeError> {
        let bind: SocketAddr = match self.probe {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind).map_err(|e| lookup_failed("bind", &e))?;
        socket
            .connect(self.probe)
            .map_err(|e| lookup_failed("route", &e))?;
        let ip = socket
            .local_addr()
            .map_err(|e| lookup_failed("read local address", &e))?
            .ip();

        if ip.is_unspecified() {
            return Err(InvokeError::LocalAddress {
                message: format!("no route towards {}", self.probe),
            });
        }
        debug!(%ip, "resolved outbound address");
        Ok(ip)
    }
}

fn lookup_failed(step: &str, e: &std::io::Error) -> InvokeError {
    InvokeError::LocalAddress {
        message: format!("{step}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_probe_resolves_to_loopback() {
        let address = OutboundAddress::new((Ipv4Addr::LOCALHOST, 9).into());
        assert_eq!(address.local_ip().unwrap(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}
