//! HMAC-SHA256 keyed hash (RFC 2104) built directly on the SHA-256 compression core
//!
//! The key is absorbed into the inner and outer chaining values once, so a
//! keyed instance can be cloned cheaply for every message under the same key.
//! Chaining values and buffered input are as sensitive as the key itself and
//! are wiped whenever a context is dropped. This is the PRF that drives PBKDF2
//! in `keystretch_key`.

use sha2::digest::generic_array::GenericArray;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// SHA-256 input block size in bytes
pub const BLOCK_SIZE: usize = 64;

/// HMAC-SHA256 output size in bytes
pub const OUTPUT_SIZE: usize = 32;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

// FIPS 180-4 §5.3.3
const H0: [u32; 8] = [
    0x6a09_e667,
    0xbb67_ae85,
    0x3c6e_f372,
    0xa54f_f53a,
    0x510e_527f,
    0x9b05_688c,
    0x1f83_d9ab,
    0x5be0_cd19,
];

fn compress(state: &mut [u32; 8], block: &[u8]) {
    sha2::compress256(state, std::slice::from_ref(GenericArray::from_slice(block)));
}

/// Streaming SHA-256 over a raw chaining value
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct Sha256State {
    h: [u32; 8],
    buffer: [u8; BLOCK_SIZE],
    buffered: usize,
    length: u64,
}

impl Sha256State {
    fn new() -> Self {
        Self::resume(H0, 0)
    }

    /// Continue from a chaining value after `length` bytes of whole blocks
    fn resume(h: [u32; 8], length: u64) -> Self {
        Self {
            h,
            buffer: [0u8; BLOCK_SIZE],
            buffered: 0,
            length,
        }
    }

    fn update(&mut self, mut data: &[u8]) {
        self.length = self.length.wrapping_add(data.len() as u64);

        if self.buffered > 0 {
            let take = (BLOCK_SIZE - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
            if self.buffered < BLOCK_SIZE {
                return;
            }
            compress(&mut self.h, &self.buffer);
            self.buffered = 0;
        }

        let mut blocks = data.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            compress(&mut self.h, block);
        }
        let rest = blocks.remainder();
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.buffered = rest.len();
    }

    /// Pad, produce the digest and wipe the state
    fn finish(&mut self) -> [u8; OUTPUT_SIZE] {
        let bit_len = self.length.wrapping_mul(8);

        self.buffer[self.buffered] = 0x80;
        self.buffer[self.buffered + 1..].fill(0);
        if self.buffered >= BLOCK_SIZE - 8 {
            compress(&mut self.h, &self.buffer);
            self.buffer.fill(0);
        }
        self.buffer[BLOCK_SIZE - 8..].copy_from_slice(&bit_len.to_be_bytes());
        compress(&mut self.h, &self.buffer);

        let mut out = [0u8; OUTPUT_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.h.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        self.zeroize();
        out
    }
}

/// Keyed HMAC-SHA256 state
///
/// Cloning yields an independent context bound to the same key with no
/// message absorbed yet, as long as the clone is taken before `update`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacSha256 {
    inner: Sha256State,
    outer: [u32; 8],
}

impl HmacSha256 {
    /// Bind a new context to `key`
    ///
    /// Keys longer than one block are hashed first; shorter keys are zero-padded.
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        let mut block = Zeroizing::new([0u8; BLOCK_SIZE]);
        if key.len() > BLOCK_SIZE {
            let mut hasher = Sha256State::new();
            hasher.update(key);
            let digest = Zeroizing::new(hasher.finish());
            block[..OUTPUT_SIZE].copy_from_slice(digest.as_slice());
        } else {
            block[..key.len()].copy_from_slice(key);
        }

        let mut pad = Zeroizing::new([0u8; BLOCK_SIZE]);

        for (p, k) in pad.iter_mut().zip(block.iter()) {
            *p = k ^ IPAD;
        }
        let mut inner = H0;
        compress(&mut inner, pad.as_slice());

        for (p, k) in pad.iter_mut().zip(block.iter()) {
            *p = k ^ OPAD;
        }
        let mut outer = H0;
        compress(&mut outer, pad.as_slice());

        let ctx = Self {
            inner: Sha256State::resume(inner, BLOCK_SIZE as u64),
            outer,
        };
        inner.zeroize();
        ctx
    }

    /// Absorb message bytes
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Consume the context and produce the 32-byte tag
    #[must_use]
    pub fn finalize(mut self) -> [u8; OUTPUT_SIZE] {
        let inner_digest = Zeroizing::new(self.inner.finish());
        let mut outer = Sha256State::resume(self.outer, BLOCK_SIZE as u64);
        outer.update(inner_digest.as_slice());
        outer.finish()
    }

    /// Tag `message` with a clone of this context, leaving `self` reusable
    #[must_use]
    pub fn tag(&self, message: &[u8]) -> [u8; OUTPUT_SIZE] {
        let mut ctx = self.clone();
        ctx.update(message);
        ctx.finalize()
    }
}

impl std::fmt::Debug for HmacSha256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256").finish_non_exhaustive()
    }
}

/// One-shot PRF: `HMAC-SHA256(key, message)`
#[must_use]
pub fn prf(key: &[u8], message: &[u8]) -> [u8; OUTPUT_SIZE] {
    HmacSha256::new(key).tag(message)
}
