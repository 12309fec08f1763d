// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod credential;
pub mod entry;

pub use credential::{CredentialMap, CredentialRecord};
pub use entry::{EntryRecord, Metrics};
