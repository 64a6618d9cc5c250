//! Random salt generation

use rand::RngCore;
use zeroize::Zeroizing;

/// Salt length used when none is specified (128 bits)
pub const DEFAULT_SALT_LEN: usize = 16;

/// Generate `len` cryptographically secure random bytes
#[must_use]
pub fn generate_salt(len: usize) -> Zeroizing<Vec<u8>> {
    let mut salt = Zeroizing::new(vec![0u8; len]);
    rand::rng().fill_bytes(&mut salt);
    salt
}
