//! Tests for the agent-exit marker scanner

use deckmind_session::sentinel::{SENTINEL, SENTINEL_EMIT, SentinelScanner};

fn marker_with_noise() -> Vec<u8> {
    let mut stream = b"some agent output\r\n$ ".to_vec();
    stream.extend_from_slice(SENTINEL);
    stream.extend_from_slice(b"\r\nuser@host:~$ ");
    stream
}

#[test]
fn test_detects_marker_in_single_chunk() {
    let mut scanner = SentinelScanner::new();
    assert!(scanner.feed(&marker_with_noise()));
}

#[test]
fn test_detects_marker_across_every_split() {
    let stream = marker_with_noise();
    for split in 0..=stream.len() {
        let mut scanner = SentinelScanner::new();
        let (first, second) = stream.split_at(split);
        let hits = [scanner.feed(first), scanner.feed(second)];
        assert_eq!(
            hits.iter().filter(|hit| **hit).count(),
            1,
            "split at {split} must report exactly one marker"
        );
    }
}

#[test]
fn test_fires_on_the_chunk_that_completes_the_marker() {
    let stream = marker_with_noise();
    let marker_start = stream
        .windows(SENTINEL.len())
        .position(|w| w == SENTINEL)
        .unwrap();
    let last_byte = marker_start + SENTINEL.len() - 1;

    // Every three-way split, empty chunks included
    for a in 0..=stream.len() {
        for b in a..=stream.len() {
            let chunks = [&stream[..a], &stream[a..b], &stream[b..]];
            let completing = if last_byte < a {
                0
            } else if last_byte < b {
                1
            } else {
                2
            };

            let mut scanner = SentinelScanner::new();
            let hits: Vec<bool> = chunks.iter().map(|chunk| scanner.feed(chunk)).collect();
            let expected: Vec<bool> = (0..chunks.len()).map(|i| i == completing).collect();
            assert_eq!(hits, expected, "splits at {a} and {b}");
        }
    }
}

#[test]
fn test_fires_on_completing_chunk_with_many_splits() {
    let stream = marker_with_noise();
    let marker_end = stream
        .windows(SENTINEL.len())
        .position(|w| w == SENTINEL)
        .unwrap()
        + SENTINEL.len();

    for size in 1..=stream.len() {
        let mut scanner = SentinelScanner::new();
        let mut fired_at = Vec::new();
        for (index, chunk) in stream.chunks(size).enumerate() {
            if scanner.feed(chunk) {
                fired_at.push(index);
            }
        }
        assert_eq!(fired_at, vec![(marker_end - 1) / size], "chunk size {size}");
    }
}

#[test]
fn test_detects_marker_fed_byte_by_byte() {
    let mut scanner = SentinelScanner::new();
    let hits = marker_with_noise()
        .iter()
        .filter(|byte| scanner.feed(std::slice::from_ref(*byte)))
        .count();
    assert_eq!(hits, 1);
}

#[test]
fn test_tail_is_bounded() {
    let mut scanner = SentinelScanner::new();
    let big = vec![b'x'; 64 * 1024];
    for _ in 0..8 {
        scanner.feed(&big);
        assert!(scanner.retained_len() <= SENTINEL.len() - 1);
    }
}

#[test]
fn test_no_false_positive_on_partial_marker() {
    let mut scanner = SentinelScanner::new();
    // Every proper prefix, followed by unrelated bytes
    for len in 1..SENTINEL.len() {
        assert!(!scanner.feed(&SENTINEL[..len]));
        assert!(!scanner.feed(b"plain text"));
    }
    // Other OSC sequences look similar but are not the marker
    assert!(!scanner.feed(b"\x1b]0;window title\x07"));
    assert!(!scanner.feed(b"\x1b]66;\x07"));
}

#[test]
fn test_typed_command_echo_is_not_a_marker() {
    let mut scanner = SentinelScanner::new();
    let echo = format!("claude --dangerously-skip-permissions; {SENTINEL_EMIT}\r\n");
    assert!(!scanner.feed(echo.as_bytes()));
}

#[test]
fn test_each_marker_reported_once() {
    let mut scanner = SentinelScanner::new();
    assert!(scanner.feed(SENTINEL));
    assert!(!scanner.feed(b"\r\n$ "));

    // Relaunch, second exit
    assert!(scanner.feed(SENTINEL));
    assert!(!scanner.feed(b""));
}

#[test]
fn test_two_markers_in_one_chunk() {
    let mut scanner = SentinelScanner::new();
    let mut chunk = SENTINEL.to_vec();
    chunk.extend_from_slice(b"$ ");
    chunk.extend_from_slice(SENTINEL);
    assert!(scanner.feed(&chunk));
    assert_eq!(scanner.retained_len(), 0);
}

#[test]
fn test_reset_forgets_partial_match() {
    let mut scanner = SentinelScanner::new();
    let half = SENTINEL.len() / 2;
    assert!(!scanner.feed(&SENTINEL[..half]));
    scanner.reset();
    assert!(!scanner.feed(&SENTINEL[half..]));
}
