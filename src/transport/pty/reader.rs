//! PTY read loop and shell exit watcher

use std::io::{self, ErrorKind, Read};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::{Child, ExitStatus};

use crate::sentinel::SentinelScanner;

use super::config::READ_CHUNK_SIZE;
use super::supervisor::SupervisorShared;

/// Poll interval while the waiter gives the reader a chance to drain
const DRAIN_POLL: Duration = Duration::from_millis(20);

/// Forward output and watch for the exit marker until end-of-stream
///
/// Output is forwarded before the marker is reported, so the bytes that
/// carried it still reach the listener. Linux reports a hung-up PTY as
/// `EIO` rather than a zero-length read; both end the session.
pub(crate) fn run_reader(mut reader: Box<dyn Read + Send>, shared: Arc<SupervisorShared>) {
    let mut buffer = [0u8; READ_CHUNK_SIZE];
    let mut scanner = SentinelScanner::new();

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => {
                shared.close("end of stream");
                break;
            }
            Ok(n) => {
                let chunk = &buffer[..n];
                if !shared.publish_output(chunk) {
                    break;
                }
                if scanner.feed(chunk) {
                    shared.publish_agent_exited();
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("[{}] PTY read ended: {}", shared.session_id, e);
                shared.close("read error");
                break;
            }
        }
    }

    log::debug!("[{}] reader loop finished", shared.session_id);
}

/// Wait for the shell, then close the session if the reader has not
///
/// Some platforms keep the master readable after the shell exits; the
/// grace period lets trailing output drain before the session is closed.
pub(crate) fn run_waiter(
    mut child: Box<dyn Child + Send + Sync>,
    shared: Arc<SupervisorShared>,
    grace: Duration,
) {
    let status = child.wait();
    settle_after_wait(status, &shared, grace);
}

/// A failed wait says nothing about the shell, so it is killed before the
/// session is reported closed.
fn settle_after_wait(status: io::Result<ExitStatus>, shared: &SupervisorShared, grace: Duration) {
    match status {
        Ok(status) => log::debug!(
            "[{}] shell exited with code {}",
            shared.session_id,
            status.exit_code()
        ),
        Err(e) => {
            log::warn!("[{}] wait failed, killing shell: {}", shared.session_id, e);
            shared.kill();
        }
    }

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if shared.state().is_closed() {
            return;
        }
        thread::sleep(DRAIN_POLL);
    }
    shared.close("shell exited");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use portable_pty::ChildKiller;
    use tokio::sync::mpsc;

    use super::*;
    use crate::bus::SessionEvent;
    use crate::types::{SessionId, SessionState};

    /// Killer that only counts how often it was used
    #[derive(Debug, Clone, Default)]
    struct CountingKiller(Arc<AtomicUsize>);

    impl ChildKiller for CountingKiller {
        fn kill(&mut self) -> io::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn clone_killer(&self) -> Box<dyn ChildKiller + Send + Sync> {
            Box::new(self.clone())
        }
    }

    fn shared_with_killer(
        killer: &CountingKiller,
    ) -> (SupervisorShared, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = SupervisorShared::new(
            SessionId::new("waiter-test"),
            Arc::new(tx),
            Some(Box::new(killer.clone())),
        );
        (shared, rx)
    }

    #[test]
    fn failed_wait_kills_shell_before_close() {
        let killer = CountingKiller::default();
        let (shared, mut events) = shared_with_killer(&killer);

        settle_after_wait(Err(io::Error::other("wait failed")), &shared, Duration::ZERO);

        assert_eq!(killer.0.load(Ordering::SeqCst), 1);
        assert_eq!(shared.state(), SessionState::Closed);
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::SessionClosed { .. })
        ));
    }

    #[test]
    fn clean_exit_closes_without_kill() {
        let killer = CountingKiller::default();
        let (shared, mut events) = shared_with_killer(&killer);

        settle_after_wait(Ok(ExitStatus::with_exit_code(0)), &shared, Duration::ZERO);

        assert_eq!(killer.0.load(Ordering::SeqCst), 0);
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::SessionClosed { .. })
        ));
    }
}
