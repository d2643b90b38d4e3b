//! Instance identity resolution — a stable per-host UUID.
//!
//! Every report from a host must carry the same instance id, otherwise the
//! server sees one machine as many. Resolution order: an externally supplied
//! id wins, then the host's own machine identifier, then a fresh random
//! UUID. The state store persists whatever was resolved so later runs reuse
//! it instead of resolving again.

use tracing::debug;
use uuid::Uuid;

/// Host identity sources probed in order, most stable first. The DMI product
/// UUID needs root; boot_id changes on every boot, so it is the last resort
/// before a random id.
#[cfg(target_os = "linux")]
const HOST_ID_SOURCES: &[&str] = &[
    "/sys/class/dmi/id/product_uuid",
    "/etc/machine-id",
    "/var/lib/dbus/machine-id",
    "/proc/sys/kernel/random/boot_id",
];

/// Returns true if `s` has the 8-4-4-4-12 hex UUID shape, case-insensitive.
pub fn is_valid_instance_id(s: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    let mut parts = s.split('-');
    for expected in GROUPS {
        match parts.next() {
            Some(p) if p.len() == expected && p.chars().all(|c| c.is_ascii_hexdigit()) => {}
            _ => return false,
        }
    }
    parts.next().is_none()
}

/// Resolve the stable instance identifier for this host.
///
/// A well-formed externally supplied id is used verbatim. Otherwise the
/// host's machine identifier is used; if no source yields one, a fresh
/// random UUID is generated. This never fails — the worst case is a random
/// id, which the caller persists for future runs.
pub fn resolve_instance_id(supplied: Option<&str>) -> String {
    if let Some(id) = supplied {
        let id = id.trim();
        if is_valid_instance_id(id) {
            return id.to_string();
        }
        debug!(supplied = id, "supplied instance id is not UUID-shaped, ignoring");
    }

    if let Some(id) = host_instance_id() {
        return id;
    }

    let id = Uuid::new_v4().to_string();
    debug!(%id, "no host identity source available, generated random instance id");
    id
}

#[cfg(target_os = "linux")]
fn host_instance_id() -> Option<String> {
    for source in HOST_ID_SOURCES {
        match std::fs::read_to_string(source) {
            Ok(raw) => {
                if let Some(id) = normalize_host_id(&raw) {
                    debug!(source, "resolved instance id from host");
                    return Some(id);
                }
                debug!(source, "host id source has unusable content");
            }
            Err(e) => debug!(source, error = %e, "host id source unavailable"),
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn host_instance_id() -> Option<String> {
    None
}

/// Accepts either a hyphenated UUID or a bare 32-hex machine-id, lowercased.
#[cfg(any(target_os = "linux", test))]
fn normalize_host_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_ascii_lowercase();
    if is_valid_instance_id(&trimmed) {
        return Some(trimmed);
    }
    // machine-id files carry 32 hex chars with no hyphens
    if trimmed.len() == 32 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Some(format!(
            "{}-{}-{}-{}-{}",
            &trimmed[..8],
            &trimmed[8..12],
            &trimmed[12..16],
            &trimmed[16..20],
            &trimmed[20..]
        ));
    }
    None
}
