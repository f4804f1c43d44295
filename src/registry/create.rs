//! Session creation
//!
//! Two phases: the shell is spawned with no lock held, then the entry is
//! inserted and only afterwards are the I/O threads started. No event can
//! reach the table for an id that is not in it yet.

use std::sync::Arc;

use chrono::Utc;

use crate::bus::EventSink;
use crate::error::{Result, SessionError};
use crate::transport::{LaunchMode, ShellSpec, Supervisor, compose};
use crate::types::{CreateSessionRequest, SessionId, SessionInfo};

use super::core::SessionRegistry;
use super::entry::{SessionEntry, SessionRecord};
use super::sink::RegistrySink;

impl SessionRegistry {
    /// Create a session: spawn a shell and type the agent command into it
    ///
    /// # Errors
    /// Returns `InvalidInput` if the extra flags contain control characters,
    /// `Spawn` if the shell cannot be started. Nothing is registered in
    /// either case.
    pub async fn create(&self, request: CreateSessionRequest) -> Result<SessionInfo> {
        let options = &self.inner.options;
        let id = SessionId::generate();

        let name = match non_blank(request.name) {
            Some(name) => name,
            None => format!("Session {}", self.inner.table.read().sessions.len() + 1),
        };
        let working_dir = non_blank(request.working_dir);
        let launch_flags = request
            .extra_flags
            .map(|flags| flags.trim().to_string())
            .unwrap_or_default();
        let agent_path = options.agent_path.clone();
        let launch_line = compose(&agent_path, &launch_flags, &LaunchMode::Launch)?;

        let spec = ShellSpec {
            shell: options.resolved_shell(),
            working_dir: working_dir.clone(),
            size: options.pty_size,
        };
        let sink: Arc<dyn EventSink> = Arc::new(RegistrySink::new(&self.inner));
        let submit_delay = options.submit_delay;
        let close_grace = options.close_grace;

        let spawn_id = id.clone();
        let supervisor = tokio::task::spawn_blocking(move || {
            Supervisor::spawn(spawn_id, &spec, sink, submit_delay, close_grace)
        })
        .await
        .map_err(|e| SessionError::spawn(format!("Spawn task failed: {e}")))??;
        let supervisor = Arc::new(supervisor);

        let record = Arc::new(SessionRecord {
            name,
            working_dir,
            agent_path,
            launch_flags,
            resume_token: None,
            created_at: Utc::now(),
        });

        let info = {
            let mut table = self.inner.table.write();
            let seq = table.next_seq;
            table.next_seq += 1;
            let entry = SessionEntry {
                seq,
                record,
                supervisor: Arc::clone(&supervisor),
            };
            let info = entry.snapshot(options.busy_threshold);
            table.sessions.insert(id.clone(), entry);
            table.active = Some(id.clone());
            info
        };

        supervisor.start(launch_line, options.launch_delay);
        log::info!("Created session {} ({})", id, info.name);

        Ok(info)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
