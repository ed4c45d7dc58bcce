// Virtual disk builder
//
// Synthesizes a complete boot region into a fresh image: an MBR with one
// fixed FAT32 partition, the matching FAT32 boot sector, and optionally an
// exact backup copy of the MBR at the last sector (where partitioning tools
// conventionally place one). This is a simulator with fixed constants, not
// a general partitioner.

use log::info;

use crate::boot_sector::{self, BootSectorRecord, FilesystemType};
use crate::error::RescueError;
use crate::image::{DiskImage, SECTOR_SIZE};
use crate::mbr::{Mbr, MbrPartitionEntry};

/// Default virtual disk size: 32 MiB.
pub const DEFAULT_DISK_SIZE: u64 = 32 * 1024 * 1024;
/// First partition starts at 1 MiB, the modern alignment convention.
pub const PARTITION_START_LBA: u32 = 2048;
/// Fixed partition length in sectors (30 MiB).
pub const PARTITION_SECTOR_COUNT: u32 = 61440;
/// Partition type byte: FAT32 (LBA).
pub const PARTITION_TYPE_FAT32_LBA: u8 = 0x0C;
/// OEM tag written into the synthetic boot sector.
pub const DEFAULT_OEM_ID: &str = "MSWIN4.1";
/// Cluster size written into the synthetic boot sector.
pub const DEFAULT_SECTORS_PER_CLUSTER: u8 = 8;

/// Everything the builder hands back. Each buffer is independently owned;
/// none aliases another's storage.
#[derive(Debug, Clone)]
pub struct BuiltDisk {
    pub disk: DiskImage,
    pub mbr: Mbr,
    pub backup_mbr: Option<Mbr>,
    pub boot_sector: BootSectorRecord,
}

/// Build a boot region into a zeroed image of `total_size` bytes.
pub fn build(total_size: u64, with_backup: bool) -> Result<BuiltDisk, RescueError> {
    let layout_end = (PARTITION_START_LBA as u64 + PARTITION_SECTOR_COUNT as u64)
        * SECTOR_SIZE as u64;
    if total_size < layout_end {
        return Err(RescueError::InvalidInput(format!(
            "disk size {} too small for the fixed layout ({} bytes required)",
            total_size, layout_end
        )));
    }

    let disk = DiskImage::zeroed(total_size)?;

    let mbr = Mbr::encode(&[MbrPartitionEntry {
        bootable: true,
        partition_type: PARTITION_TYPE_FAT32_LBA,
        lba_start: PARTITION_START_LBA,
        sector_count: PARTITION_SECTOR_COUNT,
    }]);
    let disk = disk.with_sector(0, mbr.as_bytes())?;

    let boot = boot_sector::encode_minimal_fat32_header(
        PARTITION_SECTOR_COUNT,
        DEFAULT_SECTORS_PER_CLUSTER,
        DEFAULT_OEM_ID,
    );
    let disk = disk.with_sector(PARTITION_START_LBA as u64, &boot)?;

    let (disk, backup_mbr) = if with_backup {
        let last_sector = disk.total_sectors() - 1;
        let disk = disk.with_sector(last_sector, mbr.as_bytes())?;
        info!("Created disk with backup MBR at sector {}", last_sector);
        (disk, Some(mbr.clone()))
    } else {
        info!("Created disk without a backup MBR");
        (disk, None)
    };

    let boot_sector = BootSectorRecord {
        sector_number: PARTITION_START_LBA as u64,
        oem_id: DEFAULT_OEM_ID.to_string(),
        filesystem_type: FilesystemType::Fat32,
        total_sectors: PARTITION_SECTOR_COUNT,
        sectors_per_cluster: DEFAULT_SECTORS_PER_CLUSTER,
        bytes_per_sector: 512,
    };

    info!(
        "Partition: LBA={}, sectors={}, type=0x{:02X} (FAT32)",
        PARTITION_START_LBA, PARTITION_SECTOR_COUNT, PARTITION_TYPE_FAT32_LBA
    );

    Ok(BuiltDisk {
        disk,
        mbr,
        backup_mbr,
        boot_sector,
    })
}
