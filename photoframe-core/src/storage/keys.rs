use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::foundation::core::TemplateRole;
use crate::storage::blob::BlobEntry;

/// Namespace every settings record lives under.
pub const SETTINGS_PREFIX: &str = "settings/";

const LAYOUT_NAME: &str = "config";
const LAYOUT_EXT: &str = ".json";

/// A single-value settings slot. Each slot holds at most one live record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Template image for a role.
    Template(TemplateRole),
    /// The user photo layout record.
    Layout,
}

impl Slot {
    fn name(self) -> &'static str {
        match self {
            Self::Template(role) => role.as_str(),
            Self::Layout => LAYOUT_NAME,
        }
    }

    /// Listing prefix covering every record of this slot.
    pub fn prefix(self) -> String {
        format!("{SETTINGS_PREFIX}{}", self.name())
    }

    /// Key of the record with `version` in this slot.
    pub fn key(self, version: u64) -> String {
        match self {
            Self::Template(_) => format!("{SETTINGS_PREFIX}{}_{version:020}", self.name()),
            Self::Layout => format!("{SETTINGS_PREFIX}{LAYOUT_NAME}_{version:020}{LAYOUT_EXT}"),
        }
    }
}

/// Parsed identity of a settings key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotKey {
    /// Slot the key belongs to.
    pub slot: Slot,
    /// Monotonic version; higher wins.
    pub version: u64,
}

fn parse_version(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a store key into its slot and version.
///
/// Accepts `settings/<role>_<digits>`, `settings/config_<digits>.json` and the
/// unversioned `settings/config.json` (version 0). Anything else is `None`.
pub fn parse_key(key: &str) -> Option<SlotKey> {
    let rest = key.strip_prefix(SETTINGS_PREFIX)?;
    if rest.contains('/') {
        return None;
    }

    if let Some(stem) = rest.strip_suffix(LAYOUT_EXT) {
        if stem == LAYOUT_NAME {
            return Some(SlotKey {
                slot: Slot::Layout,
                version: 0,
            });
        }
        let version = parse_version(stem.strip_prefix(LAYOUT_NAME)?.strip_prefix('_')?)?;
        return Some(SlotKey {
            slot: Slot::Layout,
            version,
        });
    }

    TemplateRole::ALL.into_iter().find_map(|role| {
        let version = parse_version(rest.strip_prefix(role.as_str())?.strip_prefix('_')?)?;
        Some(SlotKey {
            slot: Slot::Template(role),
            version,
        })
    })
}

/// A blob entry together with its parsed slot key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedEntry {
    /// Parsed slot and version.
    pub id: SlotKey,
    /// Underlying store entry.
    pub entry: BlobEntry,
}

/// Latest record per slot, built from a single listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotIndex {
    /// Latest background template.
    pub background: Option<VersionedEntry>,
    /// Latest overlay template.
    pub overlay: Option<VersionedEntry>,
    /// Latest layout record.
    pub layout: Option<VersionedEntry>,
    /// Superseded records still present in the store.
    pub stale: Vec<VersionedEntry>,
}

impl SlotIndex {
    /// Classify `entries`; the highest version per slot wins, ties go to the greatest key.
    pub fn from_entries(entries: impl IntoIterator<Item = BlobEntry>) -> Self {
        let mut out = Self::default();
        for entry in entries {
            let Some(id) = parse_key(&entry.key) else {
                continue;
            };
            let candidate = VersionedEntry { id, entry };
            let cell = match id.slot {
                Slot::Template(TemplateRole::Background) => &mut out.background,
                Slot::Template(TemplateRole::Overlay) => &mut out.overlay,
                Slot::Layout => &mut out.layout,
            };
            match cell.take() {
                None => *cell = Some(candidate),
                Some(current) => {
                    let newer = (candidate.id.version, &candidate.entry.key)
                        > (current.id.version, &current.entry.key);
                    if newer {
                        out.stale.push(current);
                        *cell = Some(candidate);
                    } else {
                        out.stale.push(candidate);
                        *cell = Some(current);
                    }
                }
            }
        }
        out
    }

    /// Latest record of `slot`.
    pub fn get(&self, slot: Slot) -> Option<&VersionedEntry> {
        match slot {
            Slot::Template(TemplateRole::Background) => self.background.as_ref(),
            Slot::Template(TemplateRole::Overlay) => self.overlay.as_ref(),
            Slot::Layout => self.layout.as_ref(),
        }
    }
}

static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

/// Issue a version for a new record: wall-clock milliseconds, strictly above
/// `floor` and above every version this process issued before.
pub fn next_version(floor: Option<u64>) -> u64 {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0);
    let candidate = match floor {
        Some(f) => now_ms.max(f.saturating_add(1)),
        None => now_ms,
    };

    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let next = candidate.max(last.saturating_add(1));
        match LAST_ISSUED.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/keys.rs"]
mod tests;
