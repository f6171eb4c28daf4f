//! Storage Classifier
//!
//! Decides the storage tier of a disk from the operator-supplied free-text
//! description of its backing storage. There is no structured field to fall
//! back on, so a descriptor that never mentions "ssd" is treated as spinning.

/// Token looked for in storage descriptions, compared case-insensitively
pub const SOLID_STATE_TOKEN: &str = "ssd";

/// Storage tier of a disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    Ssd,
    Hdd,
}

impl StorageTier {
    /// Classify an optional storage description. Absent descriptions are HDD.
    pub fn classify(description: Option<&str>) -> Self {
        match description {
            Some(d) if is_solid_state(d) => StorageTier::Ssd,
            _ => StorageTier::Hdd,
        }
    }
}

/// True when the description contains "ssd" in any letter case
pub fn is_solid_state(description: &str) -> bool {
    description.to_lowercase().contains(SOLID_STATE_TOKEN)
}
