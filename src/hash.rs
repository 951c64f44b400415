use std::fmt;

use sha2::{Digest, Sha256};

/// Running accumulator used to fingerprint context contents.
///
/// Every variable-length item is length-prefixed so that adjacent
/// appends cannot alias (`"ab" + "c"` differs from `"a" + "bc"`).
#[derive(Clone, Default)]
pub struct ContextHasher {
    inner: Sha256,
}

impl ContextHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_tag(&mut self, tag: u8) {
        self.inner.update([tag]);
    }

    pub fn append_u64(&mut self, v: u64) {
        self.inner.update(v.to_le_bytes());
    }

    pub fn append_i64(&mut self, v: i64) {
        self.inner.update(v.to_le_bytes());
    }

    pub fn append_f64(&mut self, v: f64) {
        // -0.0 and 0.0 compare equal as JSON numbers, so they must hash equal too.
        let v = if v == 0.0 { 0.0 } else { v };
        self.inner.update(v.to_bits().to_le_bytes());
    }

    pub fn append_str(&mut self, s: &str) {
        self.append_u64(s.len() as u64);
        self.inner.update(s.as_bytes());
    }

    pub fn finish(self) -> ContextHash {
        ContextHash(self.inner.finalize().into())
    }
}

/// Content fingerprint of a context, suitable as a memoization key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextHash([u8; 32]);

impl ContextHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContextHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContextHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextHash({})", self.to_hex())
    }
}
