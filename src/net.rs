use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

// Google public DNS; reachable from anywhere the API is reachable from.
const PROBE_ADDR: &str = "8.8.8.8:53";
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// One-shot reachability probe. Any socket-level failure means "offline";
/// nothing propagates to the caller.
pub fn check_internet_connection() -> bool {
    let addr: SocketAddr = match PROBE_ADDR.parse() {
        Ok(addr) => addr,
        Err(_) => return false,
    };
    TcpStream::connect_timeout(&addr, PROBE_TIMEOUT).is_ok()
}
