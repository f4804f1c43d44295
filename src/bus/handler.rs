//! Routes UI commands to the session registry

use crate::error::{Result, SessionError};
use crate::registry::SessionRegistry;
use crate::types::CreateSessionRequest;

use super::messages::{UiCommand, UiReply};

/// Executes [`UiCommand`]s against a [`SessionRegistry`]
#[derive(Clone)]
pub struct CommandHandler {
    registry: SessionRegistry,
}

impl CommandHandler {
    /// Create a handler for `registry`
    #[must_use]
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Registry commands are applied to
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Execute one command; failures become [`UiReply::Error`]
    pub async fn handle(&self, command: UiCommand) -> UiReply {
        match self.dispatch(command).await {
            Ok(reply) => reply,
            Err(e) => {
                log::debug!("Command failed: {}", e);
                UiReply::from(&e)
            }
        }
    }

    /// Decode a JSON command, execute it and encode the reply
    pub async fn handle_json(&self, line: &str) -> String {
        let reply = match serde_json::from_str::<UiCommand>(line) {
            Ok(command) => self.handle(command).await,
            Err(e) => UiReply::from(&SessionError::from(e)),
        };
        encode_reply(&reply)
    }

    async fn dispatch(&self, command: UiCommand) -> Result<UiReply> {
        let registry = &self.registry;
        let reply = match command {
            UiCommand::CreateSession {
                name,
                working_dir,
                extra_flags,
            } => {
                let request = CreateSessionRequest {
                    name,
                    working_dir,
                    extra_flags,
                };
                UiReply::Session {
                    session: registry.create(request).await?,
                }
            }
            UiCommand::CloseSession { session_id } => {
                registry.close(&session_id)?;
                UiReply::Ok
            }
            UiCommand::Write { session_id, data } => {
                registry.write(&session_id, data.into_bytes()).await?;
                UiReply::Ok
            }
            UiCommand::WriteControl { session_id, bytes } => {
                registry.write_control(&session_id, bytes).await?;
                UiReply::Ok
            }
            UiCommand::SendMessage { session_id, text } => {
                registry.send_message(&session_id, text).await?;
                UiReply::Ok
            }
            UiCommand::Interrupt { session_id } => {
                registry.interrupt(&session_id).await?;
                UiReply::Ok
            }
            UiCommand::Escape { session_id } => {
                registry.escape(&session_id).await?;
                UiReply::Ok
            }
            UiCommand::CycleMode { session_id } => {
                registry.cycle_mode(&session_id).await?;
                UiReply::Ok
            }
            UiCommand::Relaunch { session_id, launch } => {
                registry.relaunch(&session_id, launch).await?;
                UiReply::Ok
            }
            UiCommand::SetResumeToken { session_id, token } => {
                registry.set_resume_token(&session_id, token)?;
                UiReply::Ok
            }
            UiCommand::Resize {
                session_id,
                rows,
                cols,
            } => {
                registry.resize(&session_id, rows, cols)?;
                UiReply::Ok
            }
            UiCommand::SetActive { session_id } => {
                registry.set_active(&session_id)?;
                UiReply::Ok
            }
            UiCommand::GetSession { session_id } => UiReply::Session {
                session: registry.get(&session_id)?,
            },
            UiCommand::GetAgentPath { session_id } => UiReply::Text {
                text: registry.get_agent_path(&session_id)?,
            },
            UiCommand::GetLaunchFlags { session_id } => UiReply::Text {
                text: registry.get_launch_flags(&session_id)?,
            },
            UiCommand::ListSessions => UiReply::Sessions {
                sessions: registry.list(),
            },
        };
        Ok(reply)
    }
}

/// Encode a reply; falls back to a hand-built error object
fn encode_reply(reply: &UiReply) -> String {
    serde_json::to_string(reply).unwrap_or_else(|e| {
        serde_json::json!({
            "reply": "error",
            "kind": "json_error",
            "message": e.to_string(),
        })
        .to_string()
    })
}
