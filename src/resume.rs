//! Best-effort extraction of a conversation resume identifier
//!
//! When the agent exits it usually prints a hint such as
//! `claude --resume 2f6c...`. The UI may hand already-rendered terminal
//! lines to [`find_resume_id`] to pre-fill a resume action. Nothing in the
//! session core depends on this; a miss simply means no resume token.

use uuid::Uuid;

const RESUME_FLAG: &str = "--resume";

/// Most recent resume identifier mentioned in `lines`, newest line last
///
/// Only lines mentioning `resume` are considered, and only tokens that
/// parse as a UUID are accepted.
pub fn find_resume_id<'a, I>(lines: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: DoubleEndedIterator,
{
    lines.into_iter().rev().find_map(resume_id_in_line)
}

/// Resume identifier within a single line
pub fn resume_id_in_line(line: &str) -> Option<String> {
    if !line.to_ascii_lowercase().contains("resume") {
        return None;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();

    // Prefer the argument that directly follows the flag
    let after_flag = tokens
        .windows(2)
        .filter(|pair| pair[0] == RESUME_FLAG)
        .find_map(|pair| parse_token(pair[1]));

    after_flag.or_else(|| tokens.iter().rev().find_map(|token| parse_token(token)))
}

fn parse_token(token: &str) -> Option<String> {
    let trimmed = token.trim_matches(|c: char| !c.is_ascii_hexdigit() && c != '-');
    let trimmed = trimmed.split('=').next_back().unwrap_or(trimmed);
    Uuid::parse_str(trimmed)
        .ok()
        .filter(|_| trimmed.len() == 36)
        .map(|uuid| uuid.hyphenated().to_string())
}
