//! SHA-256 digests over rendered output.
//!
//! Frames are hashed from their raw pixels, so two renders of the same props
//! can be compared without decoding the encoded video.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::frame::FrameBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// First 16 hex digits, enough to name cache entries.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn digest(hasher: Sha256) -> ContentHash {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    ContentHash(bytes)
}

/// Hash a sequence of byte slices as one message, each prefixed by its length.
pub fn hash_parts(parts: &[&[u8]]) -> ContentHash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    digest(hasher)
}

/// Running hash over the frames of one render, fed in frame order.
///
/// Each frame contributes its size and format as well as its pixels, and the
/// final digest covers the frame count.
#[derive(Default)]
pub struct StreamHasher {
    hasher: Sha256,
    frames: u64,
}

impl StreamHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, frame: &FrameBuffer) {
        self.hasher.update(frame.width.to_le_bytes());
        self.hasher.update(frame.height.to_le_bytes());
        self.hasher.update([frame.format as u8]);
        self.hasher.update(&frame.data);
        self.frames += 1;
    }

    pub fn finalize(mut self) -> ContentHash {
        self.hasher.update(self.frames.to_le_bytes());
        digest(self.hasher)
    }
}
