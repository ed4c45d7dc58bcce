// Repair orchestrator
//
// Sequences the two recovery strategies into one operation. A backup MBR is
// bit-identical to the original (boot code included) and is strictly
// preferred; reconstruction from boot sectors only recovers start, size and
// type. When both fail the disk is unrecoverable by this system.

use log::{info, warn};
use serde::Serialize;

use crate::boot_sector::BootSectorRecord;
use crate::error::RescueError;
use crate::image::DiskImage;
use crate::mbr::Mbr;
use crate::reconstruct::reconstruct_mbr;
use crate::scanner::{find_backup_mbr, find_boot_sectors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RepairMethod {
    BackupRestore,
    Reconstruction,
}

/// Where the restored MBR came from.
#[derive(Debug, Clone, Serialize)]
pub enum RepairSource {
    /// Sector number where the backup MBR was found.
    BackupSector(u64),
    /// Boot-sector records the MBR was rebuilt from.
    BootSectors(Vec<BootSectorRecord>),
}

#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// New disk image with sector 0 replaced. The input disk is untouched.
    pub disk: DiskImage,
    /// The MBR now at sector 0.
    pub mbr: Mbr,
    pub method: RepairMethod,
    pub source: RepairSource,
}

/// Attempt recovery of the disk's partition table, strictly ordered and
/// with no retries within a method:
///
/// 1. restore a backup MBR found elsewhere on the disk, verbatim;
/// 2. otherwise rebuild the MBR from surviving FAT boot sectors;
/// 3. otherwise fail with `RepairImpossible`.
pub fn repair(disk: &DiskImage) -> Result<RepairOutcome, RescueError> {
    if let Some(hit) = find_backup_mbr(disk) {
        info!(
            "Restoring MBR from backup at sector {}",
            hit.sector_number
        );
        let repaired = disk.with_sector(0, hit.mbr.as_bytes())?;
        return Ok(RepairOutcome {
            disk: repaired,
            mbr: hit.mbr,
            method: RepairMethod::BackupRestore,
            source: RepairSource::BackupSector(hit.sector_number),
        });
    }

    warn!("No backup MBR found, falling back to boot-sector reconstruction");
    let records = find_boot_sectors(disk);
    if records.is_empty() {
        return Err(RescueError::RepairImpossible);
    }

    let mbr = reconstruct_mbr(&records)?;
    let repaired = disk.with_sector(0, mbr.as_bytes())?;
    info!(
        "Reconstructed MBR from {} boot sector(s)",
        records.len().min(4)
    );
    Ok(RepairOutcome {
        disk: repaired,
        mbr,
        method: RepairMethod::Reconstruction,
        source: RepairSource::BootSectors(records),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use crate::corruption::{corrupt, CorruptionKind};

    fn corrupted_disk(with_backup: bool, kind: CorruptionKind) -> (builder::BuiltDisk, DiskImage) {
        let built = builder::build(builder::DEFAULT_DISK_SIZE, with_backup).unwrap();
        let bad_mbr = corrupt(&built.mbr, Some(kind)).unwrap();
        let disk = built.disk.with_sector(0, bad_mbr.as_bytes()).unwrap();
        (built, disk)
    }

    #[test]
    fn test_backup_restore_is_bit_identical() {
        let (built, disk) = corrupted_disk(true, CorruptionKind::NoSignature);

        let outcome = repair(&disk).unwrap();
        assert_eq!(outcome.method, RepairMethod::BackupRestore);

        let last = outcome.disk.len() - 512;
        assert_eq!(
            &outcome.disk.as_bytes()[..512],
            &outcome.disk.as_bytes()[last..]
        );
        assert_eq!(&outcome.disk.as_bytes()[..512], &built.mbr.as_bytes()[..]);
        match outcome.source {
            RepairSource::BackupSector(sector) => {
                assert_eq!(sector, disk.total_sectors() - 1)
            }
            _ => panic!("expected backup source"),
        }
    }

    #[test]
    fn test_reconstruction_fallback_without_backup() {
        let (_, disk) = corrupted_disk(false, CorruptionKind::AllZero);

        let outcome = repair(&disk).unwrap();
        assert_eq!(outcome.method, RepairMethod::Reconstruction);

        let entry = outcome.mbr.entry(0);
        assert!(entry.bootable);
        assert_eq!(entry.partition_type, 0x0C);
        assert_eq!(entry.lba_start, 2048);
        assert_eq!(entry.sector_count, 61440);

        match &outcome.source {
            RepairSource::BootSectors(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].sector_number, 2048);
            }
            _ => panic!("expected boot-sector source"),
        }
    }

    #[test]
    fn test_repair_impossible_on_blank_disk() {
        let disk = DiskImage::zeroed(builder::DEFAULT_DISK_SIZE).unwrap();
        assert!(matches!(
            repair(&disk),
            Err(RescueError::RepairImpossible)
        ));
    }

    #[test]
    fn test_repair_leaves_input_disk_untouched() {
        let (_, disk) = corrupted_disk(true, CorruptionKind::AllZero);
        let before = disk.as_bytes().to_vec();
        let _ = repair(&disk).unwrap();
        assert_eq!(disk.as_bytes(), &before[..]);
    }
}
