//! Utility functions shared across the world server crates.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use tracing::warn;

/// Gets the current timestamp in seconds since Unix epoch
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Best-effort guess at this machine's outbound IP address.
///
/// Opens an unbound UDP socket and "connects" it to a routable test address,
/// which selects an outbound interface without sending any packets, then
/// reads the local address back. Falls back to loopback when the host has no
/// usable route.
pub fn system_ip() -> IpAddr {
    match probe_local_ip() {
        Ok(ip) => ip,
        Err(e) => {
            warn!("⚠️ Could not determine local IP address, using loopback: {}", e);
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn probe_local_ip() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;
    // TEST-NET-3 address; connect() only selects a route, nothing is sent.
    socket.connect(("203.0.113.1", 9))?;
    Ok(socket.local_addr()?.ip())
}
