//! Client identity rotation.
//!
//! Cycles through a fixed pool of realistic browser User-Agent strings so
//! consecutive requests from one provider do not share a fingerprint.

use std::sync::Mutex;

/// Realistic browser User-Agent strings, rotated per request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/131.0.6778.73 Mobile/15E148 Safari/604.1",
];

/// Round-robin rotation over a pool of identities.
#[derive(Debug)]
pub struct IdentityRotator {
    pool: Vec<String>,
    cursor: Mutex<usize>,
}

impl Default for IdentityRotator {
    fn default() -> Self {
        Self::new(USER_AGENTS.iter().map(|ua| (*ua).to_string()).collect())
    }
}

impl IdentityRotator {
    /// Create a rotator over `pool`. Blank entries are discarded; an empty
    /// pool falls back to the built-in list.
    pub fn new(pool: Vec<String>) -> Self {
        let pool: Vec<String> = pool
            .into_iter()
            .filter(|ua| !ua.trim().is_empty())
            .collect();
        if pool.is_empty() {
            return Self::default();
        }
        Self {
            pool,
            cursor: Mutex::new(0),
        }
    }

    /// Return the next identity and advance the cursor.
    pub fn next_identity(&self) -> String {
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let identity = self.pool[*cursor % self.pool.len()].clone();
        *cursor = (*cursor + 1) % self.pool.len();
        identity
    }

    /// Number of identities in the pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether the pool is empty. Always `false` after construction.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
