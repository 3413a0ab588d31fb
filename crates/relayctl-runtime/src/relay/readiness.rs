//! Deciding when a freshly launched relay may accept publishers.

use std::time::Duration;

use relayctl_core::{RelayError, Settings, duration_ms};
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

use crate::process::ProcessHandle;

/// Upper bound for the TCP readiness poll.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between connect attempts.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// How to wait for the relay after launching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Sleep a fixed warm-up period.
    FixedDelay(Duration),
    /// Poll the RTSP port with TCP connects until one succeeds or `timeout`
    /// elapses.
    Probe { timeout: Duration, interval: Duration },
}

impl Readiness {
    pub const fn from_settings(settings: &Settings) -> Self {
        if settings.relay_probe {
            Self::Probe {
                timeout: DEFAULT_PROBE_TIMEOUT,
                interval: DEFAULT_PROBE_INTERVAL,
            }
        } else {
            Self::FixedDelay(settings.relay_warmup())
        }
    }

    /// Wait until the relay is ready.
    ///
    /// Fails early with `ExitedDuringStartup` if the relay dies while we
    /// wait, and with `NotReady` if the probe gives up. The caller stops the
    /// relay on failure.
    pub async fn wait(&self, port: u16, relay: &mut ProcessHandle) -> Result<(), RelayError> {
        match *self {
            Self::FixedDelay(delay) => {
                debug!(delay_ms = duration_ms(delay), "Waiting for relay warm-up");
                sleep(delay).await;
                if let Some(code) = relay.try_exit() {
                    return Err(RelayError::ExitedDuringStartup { code });
                }
                Ok(())
            }
            Self::Probe {
                timeout: limit,
                interval,
            } => probe(port, relay, limit, interval).await,
        }
    }
}

async fn probe(
    port: u16,
    relay: &mut ProcessHandle,
    limit: Duration,
    interval: Duration,
) -> Result<(), RelayError> {
    let started = Instant::now();
    let deadline = started + limit;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        if let Some(code) = relay.try_exit() {
            return Err(RelayError::ExitedDuringStartup { code });
        }

        match timeout(interval, TcpStream::connect(("127.0.0.1", port))).await {
            Ok(Ok(_)) => {
                info!(
                    port,
                    attempt,
                    elapsed_ms = duration_ms(started.elapsed()),
                    "Relay is accepting connections"
                );
                return Ok(());
            }
            Ok(Err(e)) => debug!(port, attempt, error = %e, "Relay not ready yet"),
            Err(_) => debug!(port, attempt, "Relay connect attempt timed out"),
        }

        if Instant::now() + interval > deadline {
            return Err(RelayError::NotReady {
                port,
                waited_ms: duration_ms(started.elapsed()),
            });
        }
        sleep(interval).await;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::log::LogSink;
    use crate::process::{OutputFilter, SinkOutputHandler};
    use relayctl_core::CommandSpec;
    use std::sync::Arc;

    fn sleeper() -> ProcessHandle {
        let output = Arc::new(SinkOutputHandler::new(
            LogSink::new(),
            "Relay",
            OutputFilter::Relay,
        ));
        ProcessHandle::start("relay", &CommandSpec::new("sleep").arg("30"), output).unwrap()
    }

    fn unused_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::with_defaults();
        assert_eq!(
            Readiness::from_settings(&settings),
            Readiness::FixedDelay(Duration::from_millis(2000))
        );
        settings.relay_probe = true;
        assert!(matches!(
            Readiness::from_settings(&settings),
            Readiness::Probe { .. }
        ));
    }

    #[tokio::test]
    async fn test_probe_succeeds_when_port_listens() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut relay = sleeper();

        let readiness = Readiness::Probe {
            timeout: Duration::from_secs(2),
            interval: Duration::from_millis(50),
        };
        readiness.wait(port, &mut relay).await.unwrap();
        relay.stop(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_probe_times_out() {
        let port = unused_port();
        let mut relay = sleeper();

        let readiness = Readiness::Probe {
            timeout: Duration::from_millis(300),
            interval: Duration::from_millis(50),
        };
        let err = readiness.wait(port, &mut relay).await.unwrap_err();
        assert!(matches!(err, RelayError::NotReady { port: p, .. } if p == port));
        relay.stop(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_exit_during_warmup_detected() {
        let output = Arc::new(SinkOutputHandler::new(
            LogSink::new(),
            "Relay",
            OutputFilter::Relay,
        ));
        let mut relay = ProcessHandle::start(
            "relay",
            &CommandSpec::new("sh").arg("-c").arg("exit 2"),
            output,
        )
        .unwrap();

        let err = Readiness::FixedDelay(Duration::from_millis(300))
            .wait(unused_port(), &mut relay)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ExitedDuringStartup { code: Some(2) }));
    }
}
