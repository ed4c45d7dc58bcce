// Partition-table corruption engine
//
// Applies one of five named byte-level mutations to a copy of the primary
// MBR. Corruption is local to sector 0: backup MBRs and boot sectors
// elsewhere on the disk are never touched, which is exactly what makes the
// recovery strategies viable.

use std::str::FromStr;

use log::warn;

use crate::error::RescueError;
use crate::mbr::{Mbr, PARTITION_TABLE_OFFSET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    /// Set the LBA-start low two bytes to 0xFFFF (implausible start).
    WrongLba,
    /// Zero the sector-count low two bytes.
    WrongSize,
    /// Set the partition-type byte to 0x00 (unknown).
    WrongType,
    /// Zero both signature bytes.
    NoSignature,
    /// Zero the entire 64-byte partition-entry table.
    AllZero,
}

impl CorruptionKind {
    pub const ALL: [CorruptionKind; 5] = [
        CorruptionKind::WrongLba,
        CorruptionKind::WrongSize,
        CorruptionKind::WrongType,
        CorruptionKind::NoSignature,
        CorruptionKind::AllZero,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CorruptionKind::WrongLba => "wrong_lba",
            CorruptionKind::WrongSize => "wrong_size",
            CorruptionKind::WrongType => "wrong_type",
            CorruptionKind::NoSignature => "no_signature",
            CorruptionKind::AllZero => "all_zero",
        }
    }
}

impl FromStr for CorruptionKind {
    type Err = RescueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wrong_lba" => Ok(CorruptionKind::WrongLba),
            "wrong_size" => Ok(CorruptionKind::WrongSize),
            "wrong_type" => Ok(CorruptionKind::WrongType),
            "no_signature" => Ok(CorruptionKind::NoSignature),
            "all_zero" => Ok(CorruptionKind::AllZero),
            other => Err(RescueError::InvalidInput(format!(
                "unknown corruption kind: '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CorruptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply the selected corruption to a copy of `mbr`. The input is never
/// modified; a `None` kind is an error so callers cannot apply a silent
/// no-op. Any PartitionInfo previously derived from the primary MBR is
/// stale after this and must be re-derived.
pub fn corrupt(mbr: &Mbr, kind: Option<CorruptionKind>) -> Result<Mbr, RescueError> {
    let kind = kind.ok_or(RescueError::NoKindSelected)?;

    let mut sector = *mbr.as_bytes();
    match kind {
        CorruptionKind::WrongLba => {
            sector[PARTITION_TABLE_OFFSET + 8] = 0xFF;
            sector[PARTITION_TABLE_OFFSET + 9] = 0xFF;
        }
        CorruptionKind::WrongSize => {
            sector[PARTITION_TABLE_OFFSET + 12] = 0x00;
            sector[PARTITION_TABLE_OFFSET + 13] = 0x00;
        }
        CorruptionKind::WrongType => {
            sector[PARTITION_TABLE_OFFSET + 4] = 0x00;
        }
        CorruptionKind::NoSignature => {
            sector[510] = 0x00;
            sector[511] = 0x00;
        }
        CorruptionKind::AllZero => {
            // 0x1BE..0x1FE: all four partition entries
            for byte in &mut sector[PARTITION_TABLE_OFFSET..PARTITION_TABLE_OFFSET + 64] {
                *byte = 0x00;
            }
        }
    }

    warn!("Applied corruption '{}' to the primary MBR", kind);
    Ok(Mbr::from_sector_unchecked(sector))
}
