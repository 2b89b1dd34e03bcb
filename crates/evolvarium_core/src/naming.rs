//! Procedural display names for emergent species.
//!
//! Names are built from syllable tables keyed off a hash of the founding
//! label and the species id, so they are deterministic per species and
//! never the raw configured string verbatim.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const PREFIX: [&str; 25] = [
    "Aethel", "Bel", "Cor", "Dag", "Eld", "Fin", "Grom", "Had", "Ith", "Jor", "Kael", "Luv",
    "Mor", "Nar", "Oth", "Pyr", "Quas", "Rhun", "Syl", "Tor", "Val", "Wun", "Xer", "Yor", "Zan",
];

const SYLLABLES: [&str; 25] = [
    "ae", "ba", "co", "da", "el", "fa", "go", "ha", "id", "jo", "ka", "lu", "ma", "na", "os",
    "pe", "qu", "ri", "sa", "tu", "vi", "wu", "xi", "yo", "ze",
];

/// Generates the display name for a species founded under `label`.
///
/// The same `(label, species_id)` pair always yields the same name, and the
/// result is never equal to `label` itself.
#[must_use]
pub fn species_display_name(label: &str, species_id: u64) -> String {
    let mut hasher = DefaultHasher::new();
    label.hash(&mut hasher);
    species_id.hash(&mut hasher);
    let h = hasher.finish();

    let bytes = h.to_le_bytes();
    let p = PREFIX[bytes[0] as usize % PREFIX.len()];
    let s1 = SYLLABLES[bytes[1] as usize % SYLLABLES.len()];
    let s2 = SYLLABLES[bytes[2] as usize % SYLLABLES.len()];
    let mut name = format!("{p}{s1}{s2}");
    if name.eq_ignore_ascii_case(label) {
        let s3 = SYLLABLES[bytes[3] as usize % SYLLABLES.len()];
        name.push_str(s3);
    }
    name
}
