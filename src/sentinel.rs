//! Invisible agent-exit marker and the scanner that finds it
//!
//! The marker is a private-use OSC sequence (`ESC ] 666 ; BEL`). Terminal
//! renderers parse and discard OSC sequences they do not understand, so the
//! user never sees it, but it survives verbatim in the raw PTY byte stream.

/// Raw marker bytes as they appear in PTY output
pub const SENTINEL: &[u8] = b"\x1b]666;\x07";

/// Shell fragment that writes exactly [`SENTINEL`] and nothing else
///
/// Kept as escaped text so the shell's echo of the typed command line never
/// contains the raw marker.
pub const SENTINEL_EMIT: &str = r"printf '\033]666;\007'";

/// Rolling matcher for [`SENTINEL`] across arbitrarily split reads
///
/// Between calls only the last `SENTINEL.len() - 1` bytes are retained,
/// which is exactly enough to complete a marker that straddles a boundary.
#[derive(Debug, Default, Clone)]
pub struct SentinelScanner {
    tail: Vec<u8>,
}

impl SentinelScanner {
    /// Create an empty scanner
    #[must_use]
    pub fn new() -> Self {
        Self {
            tail: Vec::with_capacity(SENTINEL.len() - 1),
        }
    }

    /// Feed the next chunk of output
    ///
    /// Returns `true` when this chunk completes a marker. Bytes up to the end
    /// of the last marker found are dropped, so a marker is reported once.
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        if chunk.is_empty() {
            return false;
        }

        let mut window = std::mem::take(&mut self.tail);
        window.extend_from_slice(chunk);

        let matched_end = last_match_end(&window);
        let rest = match matched_end {
            Some(end) => &window[end..],
            None => &window[..],
        };

        let keep = rest.len().min(SENTINEL.len() - 1);
        self.tail = window.split_off(window.len() - keep);

        matched_end.is_some()
    }

    /// Forget any partially matched bytes
    pub fn reset(&mut self) {
        self.tail.clear();
    }

    /// Number of bytes carried into the next call
    #[must_use]
    pub fn retained_len(&self) -> usize {
        self.tail.len()
    }
}

fn last_match_end(haystack: &[u8]) -> Option<usize> {
    if haystack.len() < SENTINEL.len() {
        return None;
    }
    haystack
        .windows(SENTINEL.len())
        .rposition(|w| w == SENTINEL)
        .map(|start| start + SENTINEL.len())
}
