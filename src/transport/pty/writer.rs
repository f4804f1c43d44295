//! Single-owner PTY write loop

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, SessionError};

use super::supervisor::SupervisorShared;

/// Operations executed in order by the writer thread
pub(crate) enum WriteOp {
    /// One write of raw bytes
    Write {
        data: Vec<u8>,
        response_tx: Option<oneshot::Sender<Result<()>>>,
    },
    /// Body, pause, then a lone `\r`
    Submit {
        body: Vec<u8>,
        response_tx: Option<oneshot::Sender<Result<()>>>,
    },
    /// Wait for the shell prompt, then type a launch command
    Launch {
        line: String,
        delay: Duration,
        response_tx: Option<oneshot::Sender<Result<()>>>,
    },
}

/// Drain `rx` until every sender is gone
///
/// A submit is never split by another operation because only this loop
/// touches the PTY writer. On a write failure the shell is killed and the
/// session closed; queued operations then fail with `SessionClosed`.
pub(crate) fn run_writer(
    mut writer: Box<dyn Write + Send>,
    mut rx: mpsc::UnboundedReceiver<WriteOp>,
    shared: Arc<SupervisorShared>,
    submit_delay: Duration,
) {
    while let Some(op) = rx.blocking_recv() {
        if shared.state().is_closed() {
            respond(
                op_response(op),
                Err(SessionError::session_closed(shared.session_id.as_str())),
            );
            continue;
        }

        let (result, response_tx) = match op {
            WriteOp::Write { data, response_tx } => (write_all(&mut writer, &data), response_tx),
            WriteOp::Submit { body, response_tx } => {
                (submit(&mut writer, &body, submit_delay), response_tx)
            }
            WriteOp::Launch {
                line,
                delay,
                response_tx,
            } => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                log::debug!("[{}] launching: {}", shared.session_id, line);
                let result = submit(&mut writer, line.as_bytes(), submit_delay);
                if result.is_ok() {
                    shared.mark_running();
                }
                (result, response_tx)
            }
        };

        if let Err(e) = &result {
            log::warn!("[{}] PTY write failed: {}", shared.session_id, e);
            shared.kill();
            shared.close("write failed");
        }
        respond(response_tx, result);
    }

    log::debug!("[{}] writer loop finished", shared.session_id);
}

fn op_response(op: WriteOp) -> Option<oneshot::Sender<Result<()>>> {
    match op {
        WriteOp::Write { response_tx, .. }
        | WriteOp::Submit { response_tx, .. }
        | WriteOp::Launch { response_tx, .. } => response_tx,
    }
}

fn respond(response_tx: Option<oneshot::Sender<Result<()>>>, result: Result<()>) {
    if let Some(tx) = response_tx {
        // Caller may have given up waiting
        let _ = tx.send(result);
    }
}

fn write_all(writer: &mut dyn Write, data: &[u8]) -> Result<()> {
    writer.write_all(data)?;
    writer.flush()?;
    Ok(())
}

/// Terminals treat a `\r` arriving in the same read as pasted text as part
/// of the paste, so the submit keystroke goes out as its own write.
fn submit(writer: &mut dyn Write, body: &[u8], delay: Duration) -> Result<()> {
    write_all(writer, body)?;
    thread::sleep(delay);
    write_all(writer, b"\r")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::bus::SessionEvent;
    use crate::types::SessionId;

    /// Writer that records each `write` call as a separate chunk
    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Vec<u8>>>>);

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn shared() -> (
        Arc<SupervisorShared>,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = SupervisorShared::new(SessionId::new("writer-test"), Arc::new(tx), None);
        (Arc::new(shared), rx)
    }

    #[test]
    fn submit_is_not_split_by_control_bytes() {
        let recorder = Recorder::default();
        let (shared, _events) = shared();
        let (tx, rx) = mpsc::unbounded_channel();

        let writer = Box::new(recorder.clone());
        let handle = thread::spawn(move || run_writer(writer, rx, shared, Duration::from_millis(20)));

        let (submit_tx, submit_rx) = oneshot::channel();
        tx.send(WriteOp::Submit {
            body: b"hello".to_vec(),
            response_tx: Some(submit_tx),
        })
        .unwrap();
        let (ctrl_tx, ctrl_rx) = oneshot::channel();
        tx.send(WriteOp::Write {
            data: vec![0x03],
            response_tx: Some(ctrl_tx),
        })
        .unwrap();
        drop(tx);

        handle.join().unwrap();
        assert!(submit_rx.blocking_recv().unwrap().is_ok());
        assert!(ctrl_rx.blocking_recv().unwrap().is_ok());

        let chunks = recorder.0.lock().clone();
        assert_eq!(chunks, vec![b"hello".to_vec(), b"\r".to_vec(), vec![0x03]]);
    }

    #[test]
    fn launch_marks_session_running() {
        let recorder = Recorder::default();
        let (shared, _events) = shared();
        let (tx, rx) = mpsc::unbounded_channel();

        let writer = Box::new(recorder.clone());
        let loop_shared = Arc::clone(&shared);
        let handle =
            thread::spawn(move || run_writer(writer, rx, loop_shared, Duration::from_millis(1)));

        tx.send(WriteOp::Launch {
            line: "agent --flag".to_string(),
            delay: Duration::ZERO,
            response_tx: None,
        })
        .unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(shared.state(), crate::types::SessionState::Running);
        let chunks = recorder.0.lock().clone();
        assert_eq!(chunks, vec![b"agent --flag".to_vec(), b"\r".to_vec()]);
    }

    #[test]
    fn ops_after_close_are_rejected() {
        let recorder = Recorder::default();
        let (shared, mut events) = shared();
        shared.close("test");
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::SessionClosed { .. })
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = Box::new(recorder.clone());
        let handle = thread::spawn(move || run_writer(writer, rx, shared, Duration::ZERO));

        let (resp_tx, resp_rx) = oneshot::channel();
        tx.send(WriteOp::Write {
            data: b"late".to_vec(),
            response_tx: Some(resp_tx),
        })
        .unwrap();
        drop(tx);
        handle.join().unwrap();

        assert!(matches!(
            resp_rx.blocking_recv().unwrap(),
            Err(SessionError::SessionClosed(_))
        ));
        assert!(recorder.0.lock().is_empty());
    }
}
