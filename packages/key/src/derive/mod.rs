//! PBKDF2 key derivation (RFC 8018 §5.2) with HMAC-SHA256 as the PRF

pub mod config;
pub mod core;
pub mod params;
pub mod utils;

pub use config::KdfConfig;
pub use self::core::{KeyDerivation, MAX_OUTPUT_LEN, pbkdf2_hmac_sha256};
pub use params::{
    PBKDF2_ALGORITHM, PBKDF2_HASH, PBKDF2_ITER_DEFAULT, PBKDF2_ITER_MAX, Pbkdf2Params,
};
pub use utils::constant_time_compare;
