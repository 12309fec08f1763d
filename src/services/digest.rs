// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password digest: lowercase hex SHA-256.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// Deterministic one-way digest of a password.
pub fn digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Byte-exact, case-sensitive comparison of two hex digests.
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.as_bytes().ct_eq(actual.as_bytes()).into()
}
