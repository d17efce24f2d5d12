use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::ProbeError;

/// `Ok(true)` once something accepts TCP connections on `addr`.
///
/// Refused, reset or timed-out connections mean the listener is not up yet.
/// An address that cannot be resolved, or a socket error such as permission
/// denied, is a fault.
pub fn tcp_reachable(addr: &str, connect_timeout: Duration) -> Result<bool, ProbeError> {
    let targets: Vec<_> = addr
        .to_socket_addrs()
        .map_err(|e| ProbeError::InvalidAddress(format!("{addr}: {e}")))?
        .collect();

    if targets.is_empty() {
        return Err(ProbeError::InvalidAddress(format!(
            "{addr}: resolved to no addresses"
        )));
    }

    for target in &targets {
        match TcpStream::connect_timeout(target, connect_timeout) {
            Ok(_) => {
                log::trace!("TCP connect to {target} succeeded");
                return Ok(true);
            }
            Err(e) if is_not_ready(e.kind()) => {
                log::trace!("TCP connect to {target} not ready: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(false)
}

fn is_not_ready(kind: ErrorKind) -> bool {
    !matches!(
        kind,
        ErrorKind::PermissionDenied | ErrorKind::InvalidInput | ErrorKind::Unsupported
    )
}
