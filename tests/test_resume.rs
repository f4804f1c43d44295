//! Tests for best-effort resume id extraction

use deckmind_session::resume::{find_resume_id, resume_id_in_line};

const ID: &str = "0f8c2a1e-5b7d-4c3e-9a61-2d4b8e7f1c90";

#[test]
fn test_finds_id_after_resume_flag() {
    let line = format!("To resume this conversation, run: claude --resume {ID}");
    assert_eq!(resume_id_in_line(&line).as_deref(), Some(ID));
}

#[test]
fn test_accepts_equals_form_and_punctuation() {
    let line = format!("Resume with `claude --resume={ID}`.");
    assert_eq!(resume_id_in_line(&line).as_deref(), Some(ID));
}

#[test]
fn test_normalizes_case() {
    let line = format!("claude --resume {}", ID.to_uppercase());
    assert_eq!(resume_id_in_line(&line).as_deref(), Some(ID));
}

#[test]
fn test_ignores_lines_without_resume_hint() {
    let line = format!("Created file {ID}.txt");
    assert_eq!(resume_id_in_line(&line), None);
}

#[test]
fn test_rejects_non_uuid_tokens() {
    assert_eq!(resume_id_in_line("claude --resume not-an-id"), None);
    assert_eq!(
        resume_id_in_line("claude --resume 0f8c2a1e5b7d4c3e9a612d4b8e7f1c90"),
        None
    );
}

#[test]
fn test_prefers_most_recent_line() {
    let older = "claude --resume 11111111-1111-4111-8111-111111111111".to_string();
    let newer = format!("claude --resume {ID}");
    let lines = [older.as_str(), "$ ls", newer.as_str(), "$ "];
    assert_eq!(find_resume_id(lines).as_deref(), Some(ID));
}

#[test]
fn test_nothing_found() {
    let lines = ["$ claude", "Bye!", "$ "];
    assert_eq!(find_resume_id(lines), None);
}
