// FAT boot sector codec
//
// Decodes the BIOS Parameter Block subset needed to identify a FAT volume
// (type, geometry, total sectors) and encodes the minimal synthetic FAT32
// header the disk builder writes. This is not a full FAT implementation:
// FAT tables, directories and file data are out of scope.

use log::debug;
use serde::Serialize;

use crate::image::SECTOR_SIZE;

/// Jump opcodes a real x86 boot sector starts with (short/near jump).
const JUMP_OPCODES: [u8; 2] = [0xEB, 0xE9];

/// OEM substrings accepted by the detection heuristic. Boot sectors written
/// by other tools will be missed; this matches the known common formatters
/// and is kept deliberately narrow to avoid false positives on random data.
const KNOWN_OEM_TAGS: [&str; 3] = ["MSWIN", "MSDOS", "mkfs"];

const VALID_BYTES_PER_SECTOR: [u16; 4] = [512, 1024, 2048, 4096];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilesystemType {
    Fat16,
    Fat32,
    Unknown,
}

impl FilesystemType {
    /// MBR partition-type byte used when reconstructing an entry for a
    /// volume of this type.
    pub fn partition_type(&self) -> u8 {
        match self {
            FilesystemType::Fat32 => 0x0C,   // FAT32 (LBA)
            FilesystemType::Fat16 => 0x0E,   // FAT16 (LBA)
            FilesystemType::Unknown => 0x0B, // FAT32 (CHS)
        }
    }
}

impl std::fmt::Display for FilesystemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilesystemType::Fat16 => write!(f, "FAT16"),
            FilesystemType::Fat32 => write!(f, "FAT32"),
            FilesystemType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A boot sector discovered on (or synthesized into) a disk image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootSectorRecord {
    /// LBA of this boot sector within the disk.
    pub sector_number: u64,
    /// OEM tag, NUL-stripped and trimmed.
    pub oem_id: String,
    pub filesystem_type: FilesystemType,
    pub total_sectors: u32,
    pub sectors_per_cluster: u8,
    pub bytes_per_sector: u16,
}

/// Try to decode a FAT boot-sector header at a known LBA.
///
/// Returns `None` unless the sector passes the layered heuristic:
/// 55AA signature, jump opcode, known OEM tag, sane bytes-per-sector, and a
/// nonzero resolved total-sector count. FAT32 is indicated by a zero
/// root-entry count (FAT32 has no fixed root directory); FAT16 reads the
/// 16-bit total-sector field, falling back to the 32-bit field when zero.
pub fn decode_header(sector: &[u8], sector_number: u64) -> Option<BootSectorRecord> {
    if sector.len() < SECTOR_SIZE {
        return None;
    }

    if sector[510] != 0x55 || sector[511] != 0xAA {
        return None;
    }

    if !JUMP_OPCODES.contains(&sector[0]) {
        return None;
    }

    // OEM field at 0x03, 8 ASCII bytes. NULs are stripped anywhere in the
    // field before substring matching, matching how loosely real tools pad it.
    let oem: String = sector[3..11]
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| b as char)
        .collect();
    if !KNOWN_OEM_TAGS.iter().any(|tag| oem.contains(tag)) {
        debug!(
            "Sector {}: signature and jump present but OEM {:?} not recognized",
            sector_number, oem
        );
        return None;
    }

    let bytes_per_sector = u16::from_le_bytes([sector[0x0B], sector[0x0C]]);
    if !VALID_BYTES_PER_SECTOR.contains(&bytes_per_sector) {
        return None;
    }

    let sectors_per_cluster = sector[0x0D];
    let root_entries = u16::from_le_bytes([sector[0x11], sector[0x12]]);
    let total_16 = u16::from_le_bytes([sector[0x13], sector[0x14]]);
    let total_32 = u32::from_le_bytes([sector[0x20], sector[0x21], sector[0x22], sector[0x23]]);

    let (filesystem_type, total_sectors) = if root_entries == 0 {
        (FilesystemType::Fat32, total_32)
    } else if total_16 != 0 {
        (FilesystemType::Fat16, total_16 as u32)
    } else {
        (FilesystemType::Fat16, total_32)
    };

    if total_sectors == 0 {
        return None;
    }

    Some(BootSectorRecord {
        sector_number,
        oem_id: oem.trim().to_string(),
        filesystem_type,
        total_sectors,
        sectors_per_cluster,
        bytes_per_sector,
    })
}

/// Encode the minimal synthetic FAT32 header used by the disk builder.
///
/// The field set is just enough for this system's own detection logic plus
/// the conventional FAT32 constants (32 reserved sectors, 2 FATs, root
/// cluster 2, FSInfo at 1, backup boot sector at 6). It is not a complete,
/// mountable filesystem.
pub fn encode_minimal_fat32_header(
    total_sectors: u32,
    sectors_per_cluster: u8,
    oem_id: &str,
) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];

    // Jump instruction
    sector[0] = 0xEB;
    sector[1] = 0x58;
    sector[2] = 0x90;

    // OEM name, space-padded to 8 bytes
    let mut oem = [b' '; 8];
    for (dst, src) in oem.iter_mut().zip(oem_id.bytes()) {
        *dst = src;
    }
    sector[3..11].copy_from_slice(&oem);

    sector[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes()); // Bytes per sector
    sector[0x0D] = sectors_per_cluster;
    sector[0x0E..0x10].copy_from_slice(&32u16.to_le_bytes()); // Reserved sectors
    sector[0x10] = 2; // Number of FATs
    sector[0x11..0x13].copy_from_slice(&0u16.to_le_bytes()); // Root entries (0: FAT32)
    sector[0x13..0x15].copy_from_slice(&0u16.to_le_bytes()); // Total sectors (16-bit, unused)
    sector[0x15] = 0xF8; // Media descriptor (fixed disk)
    sector[0x16..0x18].copy_from_slice(&0u16.to_le_bytes()); // Sectors per FAT (FAT16 only)
    sector[0x20..0x24].copy_from_slice(&total_sectors.to_le_bytes()); // Total sectors (32-bit)
    sector[0x24..0x28].copy_from_slice(&0xEFu32.to_le_bytes()); // Sectors per FAT (FAT32)
    sector[0x2C..0x30].copy_from_slice(&2u32.to_le_bytes()); // Root directory cluster
    sector[0x30..0x32].copy_from_slice(&1u16.to_le_bytes()); // FSInfo sector
    sector[0x32..0x34].copy_from_slice(&6u16.to_le_bytes()); // Backup boot sector

    sector[510] = 0x55;
    sector[511] = 0xAA;

    sector
}
