// MBR reconstruction from discovered boot sectors
//
// A surviving FAT boot sector pins down everything a partition entry needs
// except the boot code: start LBA (where it was found), length (its total
// sector count) and type (FAT variant). The rebuilt MBR is therefore an
// approximation of the original, not a bit-identical copy.

use log::info;

use crate::boot_sector::BootSectorRecord;
use crate::error::RescueError;
use crate::mbr::{Mbr, MbrPartitionEntry, MAX_PARTITIONS};

/// Rebuild an MBR from up to four discovered boot-sector records, in scan
/// order. The first record becomes the active partition; records beyond the
/// fourth are dropped (MBR format hard limit).
pub fn reconstruct_mbr(records: &[BootSectorRecord]) -> Result<Mbr, RescueError> {
    if records.is_empty() {
        return Err(RescueError::NoBootSectorsFound);
    }

    let mut entries = Vec::with_capacity(records.len().min(MAX_PARTITIONS));
    for (i, record) in records.iter().take(MAX_PARTITIONS).enumerate() {
        // An MBR entry addresses at most 32 bits of LBA; refuse rather
        // than truncate a start sector that cannot be represented.
        let lba_start = u32::try_from(record.sector_number).map_err(|_| {
            RescueError::InvalidInput(format!(
                "boot sector LBA {} exceeds the 32-bit limit of an MBR entry",
                record.sector_number
            ))
        })?;
        let entry = MbrPartitionEntry {
            bootable: i == 0,
            partition_type: record.filesystem_type.partition_type(),
            lba_start,
            sector_count: record.total_sectors,
        };
        info!(
            "Partition {}: {} at LBA {}, {} sectors",
            i + 1,
            record.filesystem_type,
            entry.lba_start,
            entry.sector_count
        );
        entries.push(entry);
    }

    Ok(Mbr::encode(&entries))
}
