//! UDP query client for the meter.

use crate::error::Error;
use crate::frame::{self, QueryIdentity};
use crate::meter_report::MeterReport;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout, Duration};

/// A client for one meter/battery pair.
///
/// The query frame is built once at construction and reused byte-for-byte on
/// every request. The client holds no other state: each [`fetch`] call opens
/// its own short-lived UDP socket, so independent clients can run
/// concurrently. A single client's `fetch` calls should be serialized by the
/// caller, since the protocol has no request identifier to match overlapping
/// replies.
///
/// [`fetch`]: MeterClient::fetch
pub struct MeterClient {
    host: String,
    port: u16,
    query: Vec<u8>,
    // Kept as fields rather than read from the consts so tests can shrink them.
    recv_timeout: Duration,
    retry_delay: Duration,
}

impl MeterClient {
    /// UDP port the meter listens on.
    pub const PORT: u16 = 12345;
    /// How many times one `fetch` call sends the query before giving up.
    pub const MAX_ATTEMPTS: u32 = 3;
    /// Receive window for a single attempt.
    pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);
    /// Pause between failed attempts.
    pub const RETRY_DELAY: Duration = Duration::from_millis(300);
    /// Largest datagram the meter is known to send.
    const RECV_BUFFER_SIZE: usize = 2048;

    /// Create a client for the meter at `host`.
    ///
    /// Hardware addresses must already be normalized (hex digits only, no
    /// separators). Fails if any identity string contains non-ASCII
    /// characters, since the query frame cannot be encoded.
    pub fn new(host: impl Into<String>, identity: &QueryIdentity) -> Result<Self, Error> {
        let query = frame::build_query(identity)?;
        Ok(Self {
            host: host.into(),
            port: Self::PORT,
            query,
            recv_timeout: Self::RECV_TIMEOUT,
            retry_delay: Self::RETRY_DELAY,
        })
    }

    /// Query the meter and decode its reply.
    ///
    /// Sends the query up to [`MAX_ATTEMPTS`](Self::MAX_ATTEMPTS) times,
    /// waiting [`RECV_TIMEOUT`](Self::RECV_TIMEOUT) for each reply and
    /// [`RETRY_DELAY`](Self::RETRY_DELAY) between attempts. Timeouts and
    /// transport failures are retried; once a datagram arrives its decode
    /// result is returned immediately, because a malformed reply means a
    /// protocol mismatch that retrying cannot fix.
    ///
    /// Worst case this call takes about 9.6 s. Callers polling on a shorter
    /// cadence must serialize their calls.
    pub async fn fetch(&self) -> Result<MeterReport, Error> {
        // One socket per call, released on every exit path when dropped.
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;

        log::debug!("meter query TX: {}", hex::encode(&self.query));

        let mut attempt = 1;
        loop {
            match self.exchange(&socket).await {
                Ok(data) => {
                    log::debug!("meter reply RX: {}", hex::encode(&data));
                    return MeterReport::decode(&data);
                }
                Err(err) if err.is_retryable() && attempt < Self::MAX_ATTEMPTS => {
                    log::warn!(
                        "meter query attempt {attempt}/{} failed: {err}",
                        Self::MAX_ATTEMPTS
                    );
                    attempt += 1;
                    sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One send/receive attempt. Returns the raw reply datagram.
    async fn exchange(&self, socket: &UdpSocket) -> Result<Vec<u8>, Error> {
        socket
            .send_to(&self.query, (self.host.as_str(), self.port))
            .await?;

        let mut buffer = [0u8; Self::RECV_BUFFER_SIZE];
        match timeout(self.recv_timeout, socket.recv_from(&mut buffer)).await {
            Err(_) => Err(Error::Timeout),
            Ok(Err(err)) => Err(Error::Transport(err)),
            Ok(Ok((len, _))) => Ok(buffer[..len].to_vec()),
        }
    }
}
