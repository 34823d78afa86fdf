//! Telnet liveness probe.
//!
//! Connects, drains whatever the server volunteers (banner, option
//! negotiation), sends `IAC AYT` and waits for any reply.

pub mod codec;

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, trace};

use self::codec::{Scanner, AYT, IAC};
use super::{CheckError, Checker};
use crate::target::Target;
use crate::validation::validate_tcp_target;
use crate::CheckResult;

/// How long a single read waits before the server is considered done
/// talking for now
pub const READ_POLL_INTERVAL: Duration = Duration::from_millis(500);

const READ_BUFFER_SIZE: usize = 512;

pub struct TelnetChecker {
    poll_interval: Duration,
}

impl Default for TelnetChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetChecker {
    pub fn new() -> Self {
        Self { poll_interval: READ_POLL_INTERVAL }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// One probe connection with its overall deadline
struct Session {
    stream: TcpStream,
    deadline: Instant,
    poll_interval: Duration,
    scanner: Scanner,
}

impl Session {
    /// Read until the server goes quiet for one poll interval.
    ///
    /// Returns the number of bytes received. Going quiet (or closing the
    /// connection) is the normal way out; only a server that keeps talking
    /// past the deadline is an error.
    async fn recv(&mut self) -> Result<usize, CheckError> {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut count = 0;

        loop {
            let wait = self
                .poll_interval
                .min(self.deadline.saturating_duration_since(Instant::now()));

            let n = match timeout(wait, self.stream.read(&mut buf)).await {
                Err(_elapsed) => return Ok(count),
                Ok(Ok(0)) => {
                    debug!("telnet peer closed the connection");
                    return Ok(count);
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(CheckError::Io(e)),
            };

            let scan = self.scanner.feed(&buf[..n]);
            for command in &scan.commands {
                trace!(%command, "telnet command");
            }
            if !scan.text.is_empty() {
                trace!(text = %String::from_utf8_lossy(&scan.text), "telnet text");
            }

            count += n;

            if Instant::now() > self.deadline {
                return Err(CheckError::DeadlineExceeded);
            }
        }
    }

    /// Send `IAC AYT` as one write; anything less than both bytes fails
    async fn send_ayt(&mut self) -> Result<(), CheckError> {
        let frame = [IAC, AYT];
        let remaining = self.deadline.saturating_duration_since(Instant::now());

        let written = timeout(remaining, self.stream.write(&frame))
            .await
            .map_err(|_| CheckError::DeadlineExceeded)??;

        if written != frame.len() {
            return Err(CheckError::ShortWrite { written, expected: frame.len() });
        }

        trace!("sent IAC AYT");
        Ok(())
    }
}

#[async_trait]
impl Checker for TelnetChecker {
    async fn check(&self, target: &Target) -> CheckResult {
        let deadline = Instant::now() + target.timeout;

        let stream = timeout(target.timeout, TcpStream::connect(target.url.as_str()))
            .await
            .map_err(|_| CheckError::Timeout(target.timeout))??;

        let mut session = Session {
            stream,
            deadline,
            poll_interval: self.poll_interval,
            scanner: Scanner::new(),
        };

        let banner = session.recv().await?;
        debug!(url = %target.url, bytes = banner, "drained telnet banner");

        session.send_ayt().await?;

        let reply = session.recv().await?;
        if reply == 0 {
            info!(url = %target.url, "no response to AYT");
            return Ok(false);
        }

        debug!(url = %target.url, bytes = reply, "telnet AYT answered");
        Ok(true)
    }

    fn validate(&self, target: &Target) -> Result<(), CheckError> {
        validate_tcp_target(target)
    }
}
