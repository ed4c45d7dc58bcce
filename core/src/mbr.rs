// Master Boot Record codec
//
// The MBR is the first 512-byte sector of a disk: boot code at [0, 446),
// four 16-byte partition entries at 0x1BE, and the 55AA signature at
// [510, 512). This module encodes and decodes that layout; it never touches
// the disk itself.

use serde::Serialize;

use crate::error::RescueError;
use crate::image::SECTOR_SIZE;

/// Byte offset of the first partition entry.
pub const PARTITION_TABLE_OFFSET: usize = 0x1BE;
/// Size of one partition entry.
pub const PARTITION_ENTRY_SIZE: usize = 16;
/// Maximum entries an MBR can hold.
pub const MAX_PARTITIONS: usize = 4;
/// Boot-flag byte marking the active partition.
pub const BOOT_FLAG_ACTIVE: u8 = 0x80;
/// CHS sentinel written when LBA addressing is in use.
pub const CHS_LBA_SENTINEL: [u8; 3] = [0xFE, 0xFF, 0xFF];
/// The two signature bytes at offsets 510 and 511.
pub const MBR_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// One decoded partition entry. CHS fields are not modeled; this system
/// always writes the LBA-mode sentinel in their place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MbrPartitionEntry {
    pub bootable: bool,
    pub partition_type: u8,
    pub lba_start: u32,
    pub sector_count: u32,
}

impl MbrPartitionEntry {
    /// Parse a 16-byte entry slot.
    fn parse(slot: &[u8]) -> Self {
        Self {
            bootable: slot[0] == BOOT_FLAG_ACTIVE,
            partition_type: slot[4],
            lba_start: u32::from_le_bytes([slot[8], slot[9], slot[10], slot[11]]),
            sector_count: u32::from_le_bytes([slot[12], slot[13], slot[14], slot[15]]),
        }
    }

    /// Write this entry into a 16-byte slot, CHS fields as LBA sentinels.
    fn write_to(&self, slot: &mut [u8]) {
        slot[0] = if self.bootable { BOOT_FLAG_ACTIVE } else { 0x00 };
        slot[1..4].copy_from_slice(&CHS_LBA_SENTINEL); // CHS start
        slot[4] = self.partition_type;
        slot[5..8].copy_from_slice(&CHS_LBA_SENTINEL); // CHS end
        slot[8..12].copy_from_slice(&self.lba_start.to_le_bytes());
        slot[12..16].copy_from_slice(&self.sector_count.to_le_bytes());
    }

    /// An all-zero slot decodes to an empty entry.
    pub fn is_empty(&self) -> bool {
        self.partition_type == 0 && self.lba_start == 0 && self.sector_count == 0
    }
}

/// Human-facing view of a partition entry. Derived on demand, never stored:
/// it goes stale the moment the underlying MBR changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PartitionInfo {
    pub bootable: bool,
    pub partition_type: u8,
    pub lba_start: u32,
    pub sector_count: u32,
    pub size_mb: f64,
}

impl From<MbrPartitionEntry> for PartitionInfo {
    fn from(entry: MbrPartitionEntry) -> Self {
        Self {
            bootable: entry.bootable,
            partition_type: entry.partition_type,
            lba_start: entry.lba_start,
            sector_count: entry.sector_count,
            size_mb: entry.sector_count as f64 * SECTOR_SIZE as f64 / (1024.0 * 1024.0),
        }
    }
}

/// A full MBR sector, held verbatim so a backup found elsewhere on the disk
/// can be restored bit-identically, boot code included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mbr {
    sector: [u8; SECTOR_SIZE],
}

impl Mbr {
    /// Decode a sector, requiring the 55AA signature.
    pub fn decode(data: &[u8]) -> Result<Self, RescueError> {
        if data.len() < SECTOR_SIZE {
            return Err(RescueError::BufferTooSmall {
                needed: SECTOR_SIZE,
                actual: data.len(),
            });
        }
        let mut sector = [0u8; SECTOR_SIZE];
        sector.copy_from_slice(&data[..SECTOR_SIZE]);
        let mbr = Self { sector };
        if !mbr.has_valid_signature() {
            return Err(RescueError::InvalidSignature {
                found: [sector[510], sector[511]],
            });
        }
        Ok(mbr)
    }

    /// Wrap a sector without checking the signature. The scanner reads
    /// fields from unverified sectors opportunistically; callers must treat
    /// such an MBR as untrusted until `has_valid_signature` says otherwise.
    pub fn from_sector_unchecked(sector: [u8; SECTOR_SIZE]) -> Self {
        Self { sector }
    }

    /// Encode up to four entries into a fresh MBR: zeroed boot code, fixed
    /// entry offsets, signature written unconditionally. Pure function.
    pub fn encode(entries: &[MbrPartitionEntry]) -> Self {
        let mut sector = [0u8; SECTOR_SIZE];
        for (i, entry) in entries.iter().take(MAX_PARTITIONS).enumerate() {
            let offset = PARTITION_TABLE_OFFSET + i * PARTITION_ENTRY_SIZE;
            entry.write_to(&mut sector[offset..offset + PARTITION_ENTRY_SIZE]);
        }
        sector[510] = MBR_SIGNATURE[0];
        sector[511] = MBR_SIGNATURE[1];
        Self { sector }
    }

    pub fn has_valid_signature(&self) -> bool {
        self.sector[510] == MBR_SIGNATURE[0] && self.sector[511] == MBR_SIGNATURE[1]
    }

    /// Decode the partition entry in slot `index` (0..=3).
    pub fn entry(&self, index: usize) -> MbrPartitionEntry {
        assert!(index < MAX_PARTITIONS);
        let offset = PARTITION_TABLE_OFFSET + index * PARTITION_ENTRY_SIZE;
        MbrPartitionEntry::parse(&self.sector[offset..offset + PARTITION_ENTRY_SIZE])
    }

    /// Decode all four entry slots.
    pub fn entries(&self) -> [MbrPartitionEntry; MAX_PARTITIONS] {
        [self.entry(0), self.entry(1), self.entry(2), self.entry(3)]
    }

    /// Partition info derived from the first entry, if it is populated.
    pub fn partition_info(&self) -> Option<PartitionInfo> {
        let first = self.entry(0);
        if first.is_empty() {
            None
        } else {
            Some(first.into())
        }
    }

    pub fn as_bytes(&self) -> &[u8; SECTOR_SIZE] {
        &self.sector
    }
}
