//! Tests for the UI command/event protocol and the event bus

use std::sync::Arc;

use deckmind_session::bus::{
    CommandHandler, EventBus, EventSink, LISTENER_BACKLOG, SessionEvent, UiCommand, UiReply,
};
use deckmind_session::transport::LaunchMode;
use deckmind_session::{HostOptions, SessionError, SessionId, SessionRegistry};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn handler() -> CommandHandler {
    let options = HostOptions::builder()
        .agent_path("true")
        .shell("/bin/sh")
        .build();
    let registry = SessionRegistry::new(options, Arc::new(EventBus::new())).unwrap();
    CommandHandler::new(registry)
}

// ============================================================================
// Wire format
// ============================================================================

#[test]
fn test_command_deserialization() {
    let cmd: UiCommand = serde_json::from_str(
        r#"{"command":"create_session","name":"api","extra_flags":"--worktree"}"#,
    )
    .unwrap();
    assert_eq!(
        cmd,
        UiCommand::CreateSession {
            name: Some("api".to_string()),
            working_dir: None,
            extra_flags: Some("--worktree".to_string()),
        }
    );

    let cmd: UiCommand = serde_json::from_str(
        r#"{"command":"relaunch","session_id":"s1","launch":{"mode":"resume","resume_id":"r1"}}"#,
    )
    .unwrap();
    assert_eq!(
        cmd,
        UiCommand::Relaunch {
            session_id: SessionId::new("s1"),
            launch: LaunchMode::Resume {
                resume_id: "r1".to_string()
            },
        }
    );

    let cmd: UiCommand = serde_json::from_str(r#"{"command":"list_sessions"}"#).unwrap();
    assert_eq!(cmd, UiCommand::ListSessions);
}

#[test]
fn test_event_serialization() {
    let event = SessionEvent::AgentExited {
        session_id: SessionId::new("s1"),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "agent-exited");
    assert_eq!(json["session_id"], "s1");

    let event = SessionEvent::Output {
        session_id: SessionId::new("s1"),
        data: vec![0x1b, b'A'],
    };
    assert_eq!(event.name(), "output");
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "output");
    assert_eq!(json["data"], serde_json::json!([27, 65]));

    let closed = SessionEvent::SessionClosed {
        session_id: SessionId::new("s2"),
    };
    assert_eq!(closed.name(), "session-closed");
    assert_eq!(closed.session_id().as_str(), "s2");
}

#[test]
fn test_reply_serialization() {
    assert_eq!(serde_json::to_string(&UiReply::Ok).unwrap(), r#"{"reply":"ok"}"#);

    let reply = UiReply::from(&SessionError::not_found("s9"));
    assert!(reply.is_error());
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["reply"], "error");
    assert_eq!(json["kind"], "not_found");
}

#[test]
fn test_error_kinds_are_stable() {
    assert_eq!(SessionError::spawn("x").kind(), "spawn_error");
    assert_eq!(SessionError::session_closed("x").kind(), "session_closed");
    assert_eq!(SessionError::invalid_input("x").kind(), "invalid_input");
    assert_eq!(SessionError::agent_running("x").kind(), "agent_running");
    assert_eq!(SessionError::invalid_config("x").kind(), "invalid_config");
}

// ============================================================================
// Handler
// ============================================================================

#[tokio::test]
async fn test_unknown_session_replies_not_found() {
    init_logger();
    let handler = handler();
    let id = SessionId::new("missing");

    for cmd in [
        UiCommand::CloseSession {
            session_id: id.clone(),
        },
        UiCommand::GetAgentPath {
            session_id: id.clone(),
        },
        UiCommand::GetLaunchFlags {
            session_id: id.clone(),
        },
        UiCommand::Write {
            session_id: id.clone(),
            data: "ls".to_string(),
        },
        UiCommand::Interrupt {
            session_id: id.clone(),
        },
    ] {
        match handler.handle(cmd).await {
            UiReply::Error { kind, .. } => assert_eq!(kind, "not_found"),
            other => panic!("expected not_found, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_list_on_empty_registry() {
    init_logger();
    let handler = handler();
    let reply = handler.handle(UiCommand::ListSessions).await;
    assert_eq!(reply, UiReply::Sessions { sessions: vec![] });
}

#[tokio::test]
async fn test_malformed_json_is_an_error_reply() {
    init_logger();
    let handler = handler();
    let reply = handler.handle_json(r#"{"command":"no_such_command"}"#).await;
    let json: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(json["reply"], "error");
    assert_eq!(json["kind"], "json_error");

    let reply = handler.handle_json("not json").await;
    assert!(reply.contains("json_error"));
}

// ============================================================================
// Event bus
// ============================================================================

#[tokio::test]
async fn test_listener_attaches_once() {
    let bus = EventBus::new();
    assert!(!bus.is_attached());
    let first = bus.attach_listener();
    assert!(first.is_some());
    assert!(bus.is_attached());
    assert!(bus.attach_listener().is_none());
}

#[tokio::test]
async fn test_events_before_attach_are_delivered() {
    let bus = EventBus::new();
    let mut observer = bus.subscribe();

    bus.emit(SessionEvent::AgentExited {
        session_id: SessionId::new("early"),
    });

    let mut rx = bus.attach_listener().unwrap();
    let event = rx.recv().await.unwrap();
    assert_eq!(event.session_id().as_str(), "early");

    let seen = observer.recv().await.unwrap();
    assert_eq!(seen, event);
}

#[tokio::test]
async fn test_backlog_is_bounded_without_listener() {
    let bus = EventBus::new();
    let id = SessionId::new("chatty");

    bus.emit(SessionEvent::AgentExited {
        session_id: id.clone(),
    });
    for i in 0..(LISTENER_BACKLOG * 4) {
        bus.emit(SessionEvent::Output {
            session_id: id.clone(),
            data: vec![(i % 256) as u8; 512],
        });
        assert!(bus.backlog_len() <= LISTENER_BACKLOG);
    }
    assert_eq!(bus.backlog_len(), LISTENER_BACKLOG);

    // Lifecycle events outlive the output that overflowed the backlog
    let mut rx = bus.attach_listener().unwrap();
    assert_eq!(bus.backlog_len(), 0);
    let first = rx.recv().await.unwrap();
    assert!(matches!(first, SessionEvent::AgentExited { .. }));

    let mut delivered = 1;
    while rx.try_recv().is_ok() {
        delivered += 1;
    }
    assert_eq!(delivered, LISTENER_BACKLOG);
}

#[test]
fn test_registry_rejects_empty_agent_path() {
    let options = HostOptions::builder().agent_path("  ").build();
    let result = SessionRegistry::new(options, Arc::new(EventBus::new()));
    assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
}
