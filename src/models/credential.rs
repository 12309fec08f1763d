//! Credential records and their two persisted representations.
//!
//! The structured JSON map is the source of truth; the tabular export is
//! derived from it and regenerated wholesale on every save.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header of the tabular user export.
pub const TABULAR_HEADER: &str = "Username,PasswordHash,CreatedAt";

/// Stored credential for one username. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Hex SHA-256 of the password
    #[serde(rename = "password", alias = "passwordDigest")]
    pub password_digest: String,
    /// RFC 3339 creation time
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

/// Username → record. Keys are unique and case-sensitive.
pub type CredentialMap = BTreeMap<String, CredentialRecord>;

/// Why `username` cannot be stored, if it cannot.
///
/// The tabular export is not escaped, so a username must never contain the
/// field delimiter or a line break (or any other control character).
pub fn username_problem(username: &str) -> Option<&'static str> {
    if username.is_empty() {
        Some("username must not be empty")
    } else if username.contains(',') {
        Some("username must not contain commas")
    } else if username.chars().any(char::is_control) {
        Some("username must not contain control characters")
    } else {
        None
    }
}

/// Decode the structured JSON map. Blank text is an empty map.
pub fn parse_structured(text: &str) -> Result<CredentialMap, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(CredentialMap::new());
    }
    serde_json::from_str(text)
}

/// Encode the structured JSON map (pretty, two-space indent).
pub fn to_structured(map: &CredentialMap) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(map)
}

/// Decode the tabular export.
///
/// Column order is username, digest, created-at. The header is skipped and
/// rows with fewer than two columns are discarded.
pub fn parse_tabular(text: &str) -> CredentialMap {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < 2 {
                return None;
            }
            Some((
                fields[0].to_string(),
                CredentialRecord {
                    password_digest: fields[1].to_string(),
                    created_at: fields.get(2).copied().unwrap_or_default().to_string(),
                },
            ))
        })
        .collect()
}

/// Regenerate the tabular export from the full map.
///
/// Records without a creation time are stamped with `now`. Embedded commas
/// are not escaped.
pub fn to_tabular(map: &CredentialMap, now: &str) -> String {
    let mut csv = String::from(TABULAR_HEADER);
    csv.push('\n');
    for (username, record) in map {
        let created_at = if record.created_at.is_empty() {
            now
        } else {
            record.created_at.as_str()
        };
        csv.push_str(&format!(
            "{},{},{}\n",
            username, record.password_digest, created_at
        ));
    }
    csv
}

/// Overlay `remote` on `local`: remote wins per key, local-only keys stay.
pub fn merge(mut local: CredentialMap, remote: CredentialMap) -> CredentialMap {
    local.extend(remote);
    local
}
