pub mod boot_sector;
pub mod builder;
pub mod corruption;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod mbr;
pub mod reconstruct;
pub mod repair;
pub mod scanner;

#[cfg(test)]
mod recovery_tests;

pub use boot_sector::{decode_header, encode_minimal_fat32_header, BootSectorRecord, FilesystemType};
pub use builder::{build, BuiltDisk, DEFAULT_DISK_SIZE};
pub use corruption::{corrupt, CorruptionKind};
pub use diagnostics::{checksum, hex_dump};
pub use error::RescueError;
pub use image::{export_file_name, DiskImage, SECTOR_SIZE};
pub use mbr::{Mbr, MbrPartitionEntry, PartitionInfo};
pub use reconstruct::reconstruct_mbr;
pub use repair::{repair, RepairMethod, RepairOutcome, RepairSource};
pub use scanner::{find_backup_mbr, find_boot_sectors, BackupMbrHit};
