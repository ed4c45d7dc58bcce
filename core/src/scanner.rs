// Recovery scanner
//
// Two independent search algorithms over a (possibly corrupted) disk image:
// a backup-MBR locator that probes a short list of conventional offsets, and
// a boot-sector locator that sweeps candidate LBAs with the layered FAT
// heuristic. Both are read-only.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::boot_sector::{self, BootSectorRecord};
use crate::image::{DiskImage, SECTOR_SIZE};
use crate::mbr::{Mbr, PARTITION_TABLE_OFFSET};

/// LBAs that commonly hold a filesystem boot sector: the legacy DOS start
/// (63) and the 1 MiB-aligned starts partitioning tools use today.
const COMMON_BOOT_SECTOR_LBAS: [u64; 4] = [63, 2048, 4096, 8192];

/// A backup MBR found somewhere on the disk.
#[derive(Debug, Clone)]
pub struct BackupMbrHit {
    pub mbr: Mbr,
    pub sector_number: u64,
}

/// Scan the conventional backup locations for a sector that looks like an
/// MBR: valid signature, plausible boot-flag byte, nonzero partition type.
///
/// The last sector is probed first because that is where partitioning tools
/// conventionally stash a backup; first match wins. An unrelated partition
/// table sitting at one of these offsets will be accepted as a backup
/// (known accepted-risk heuristic, kept for behavioral fidelity).
pub fn find_backup_mbr(disk: &DiskImage) -> Option<BackupMbrHit> {
    let disk_size = disk.len();
    let candidates = [
        disk_size - SECTOR_SIZE, // last sector
        SECTOR_SIZE,             // sector 1
        2 * SECTOR_SIZE,         // sector 2
        2048 * SECTOR_SIZE,      // sector 2048
    ];

    for offset in candidates {
        if offset + SECTOR_SIZE > disk_size {
            continue;
        }
        let sector = match disk.read_sector_at(offset) {
            Ok(sector) => sector,
            Err(_) => continue,
        };

        if sector[510] != 0x55 || sector[511] != 0xAA {
            continue;
        }
        let boot_flag = sector[PARTITION_TABLE_OFFSET];
        let partition_type = sector[PARTITION_TABLE_OFFSET + 4];
        if (boot_flag == 0x00 || boot_flag == 0x80) && partition_type != 0x00 {
            let sector_number = (offset / SECTOR_SIZE) as u64;
            info!("Found backup MBR at sector {}", sector_number);
            return Some(BackupMbrHit {
                mbr: Mbr::from_sector_unchecked(sector),
                sector_number,
            });
        }
    }

    debug!("No backup MBR at any of the scanned offsets");
    None
}

/// Sweep the disk for surviving FAT boot sectors.
///
/// Candidates are the common start LBAs plus every multiple of 2048 below
/// the sector count, deduplicated and scanned in ascending order. All
/// matches are returned: a disk may hold several partitions and every one
/// of them is needed to reconstruct the MBR.
pub fn find_boot_sectors(disk: &DiskImage) -> Vec<BootSectorRecord> {
    let total_sectors = disk.total_sectors();

    let mut candidates: BTreeSet<u64> = COMMON_BOOT_SECTOR_LBAS.iter().copied().collect();
    candidates.extend((0..total_sectors).step_by(2048));

    let mut found = Vec::new();
    for lba in candidates {
        let sector = match disk.read_sector(lba) {
            Ok(sector) => sector,
            Err(_) => continue, // candidate beyond the end of the image
        };
        if let Some(record) = boot_sector::decode_header(&sector, lba) {
            info!(
                "Found {} boot sector at sector {} ({} sectors)",
                record.filesystem_type, lba, record.total_sectors
            );
            found.push(record);
        }
    }

    if found.is_empty() {
        debug!("No boot sectors found in {} candidate positions", total_sectors / 2048 + 4);
    }
    found
}
