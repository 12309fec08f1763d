// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod digest;
pub mod entries;

pub use credentials::{CredentialLedger, RemoteWrite, SaveReport};
pub use digest::digest;
pub use entries::{EntryLedger, UpsertOutcome};
