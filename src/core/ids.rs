//! Identifier namespaces.
//!
//! Offline ids are minted on the device and always start with [`OFFLINE_ID_PREFIX`].
//! Cloud ids are UUIDs assigned by the remote store. The two never overlap, so the id
//! of a family alone decides which tier owns it and everything below it.

use chrono::Utc;
use uuid::Uuid;

/// Leading marker of every offline-minted id
pub const OFFLINE_ID_PREFIX: &str = "offline_";

/// Which storage tier owns a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    /// On-device database only
    Local,
    /// Cloud backend
    Cloud,
}

/// Mints a new offline id: `offline_[<prefix>_]<unix millis>_<12 hex chars>`.
///
/// The timestamp keeps ids roughly ordered; the random suffix keeps ids minted in the
/// same millisecond apart.
#[must_use]
pub fn generate_offline_id(prefix: Option<&str>) -> String {
    let millis = Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    let suffix = &random[..12];
    match prefix {
        Some(prefix) if !prefix.is_empty() => {
            format!("{OFFLINE_ID_PREFIX}{prefix}_{millis}_{suffix}")
        }
        _ => format!("{OFFLINE_ID_PREFIX}{millis}_{suffix}"),
    }
}

/// Returns true for ids minted by [`generate_offline_id`] and ids derived from them.
#[must_use]
pub fn is_offline_id(id: &str) -> bool {
    id.starts_with(OFFLINE_ID_PREFIX)
}

/// Mints a cloud id the way the backend does.
#[must_use]
pub fn generate_cloud_id() -> String {
    Uuid::new_v4().to_string()
}

/// Tier owning a family with this id.
#[must_use]
pub fn tier_of(family_id: &str) -> StorageTier {
    if is_offline_id(family_id) {
        StorageTier::Local
    } else {
        StorageTier::Cloud
    }
}

/// Month ids embed their family id so migration can rewrite them deterministically.
#[must_use]
pub fn month_id(family_id: &str, year: i32, month: i32) -> String {
    format!("{family_id}-{year}-{month:02}")
}

/// Rewrites a month id for a migrated family by substituting the family id inside it.
///
/// Returns `None` when the old id does not embed the old family id; the backend then
/// assigns a fresh id.
#[must_use]
pub fn rewrite_month_id(old_month_id: &str, old_family_id: &str, new_family_id: &str) -> Option<String> {
    if old_family_id.is_empty() || !old_month_id.contains(old_family_id) {
        return None;
    }
    Some(old_month_id.replacen(old_family_id, new_family_id, 1))
}
