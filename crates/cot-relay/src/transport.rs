/// Fire-and-forget delivery of encoded CoT events.
///
/// The relay only needs "send these bytes, tell me if it failed", captured by [`CotSink`].
/// [`UdpTransmitter`] is the real thing; [`MemorySink`] records payloads instead of sending
/// them.
use std::{
    collections::HashSet,
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{Arc, Mutex},
};

use tracing::{debug, info, warn};

use crate::{Error, RelayResult};

/// Largest datagram that fits a 1500 byte MTU without IP fragmentation (1500 - 20 IP - 8 UDP).
pub const SAFE_DATAGRAM_SIZE: usize = 1472;

/// Destination for encoded events. One call, one datagram; no retry.
pub trait CotSink: Send + Sync {
    fn send(&self, payload: &[u8]) -> RelayResult<()>;
}

/// Lets one sink be shared, e.g. between the server state and a test harness.
impl<T> CotSink for Arc<T>
where
    T: CotSink + ?Sized,
{
    fn send(&self, payload: &[u8]) -> RelayResult<()> {
        (**self).send(payload)
    }
}

/// Sends each payload as a single UDP datagram to a fixed destination.
///
/// The socket is bound once and shared by every send, so a transmitter can serve concurrent
/// batches behind an `Arc`.
#[derive(Debug)]
pub struct UdpTransmitter {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl UdpTransmitter {
    /// Resolve `host:port` and bind a local socket of the same address family.
    pub fn new(host: &str, port: u16) -> RelayResult<Self> {
        let dest = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            Error::Send(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address for {host}:{port}"),
            ))
        })?;
        Self::with_dest(dest)
    }

    pub fn with_dest(dest: SocketAddr) -> RelayResult<Self> {
        let local_ip = if dest.is_ipv4() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        };
        let socket = UdpSocket::bind(SocketAddr::new(local_ip, 0))?;
        info!("udp transmitter {} -> {}", socket.local_addr()?, dest);
        Ok(Self { socket, dest })
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }
}

impl CotSink for UdpTransmitter {
    fn send(&self, payload: &[u8]) -> RelayResult<()> {
        if payload.len() > SAFE_DATAGRAM_SIZE {
            warn!(
                "payload of {} bytes exceeds safe datagram size {}, may be fragmented or dropped",
                payload.len(),
                SAFE_DATAGRAM_SIZE
            );
        }
        let n = self.socket.send_to(payload, self.dest)?;
        if n != payload.len() {
            return Err(Error::Send(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram write: {n} of {} bytes", payload.len()),
            )));
        }
        debug!("sent {} bytes to {}", n, self.dest);
        Ok(())
    }
}

/// In-memory sink that captures every payload.
///
/// Send attempts are numbered from zero; attempts listed in `fail_on` return an error and
/// capture nothing.
#[derive(Debug, Default)]
pub struct MemorySink {
    sent: Mutex<Vec<Vec<u8>>>,
    attempts: Mutex<usize>,
    fail_on: HashSet<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(attempts: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_on: attempts.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Payloads captured so far, in send order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().map(|a| *a).unwrap_or_default()
    }
}

impl CotSink for MemorySink {
    fn send(&self, payload: &[u8]) -> RelayResult<()> {
        let attempt = {
            let mut attempts = self
                .attempts
                .lock()
                .map_err(|_| io::Error::other("memory sink lock poisoned"))?;
            *attempts += 1;
            *attempts - 1
        };
        if self.fail_on.contains(&attempt) {
            return Err(Error::Send(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("simulated failure on send {attempt}"),
            )));
        }
        self.sent
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?
            .push(payload.to_vec());
        Ok(())
    }
}
