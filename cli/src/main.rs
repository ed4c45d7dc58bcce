use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use partrescue_core::{
    builder, checksum, corrupt, diagnostics, export_file_name, find_backup_mbr,
    find_boot_sectors, repair, CorruptionKind, DiskImage, Mbr, RepairMethod, RepairSource,
};

#[derive(Parser)]
#[command(name = "partrescue")]
#[command(about = "MBR corruption simulator and boot-region recovery tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a virtual disk image with a single FAT32 partition
    Create {
        /// Output image path
        output: PathBuf,
        /// Disk size in bytes (multiple of 512)
        #[arg(short, long, default_value_t = builder::DEFAULT_DISK_SIZE)]
        size: u64,
        /// Do not write a backup MBR at the last sector
        #[arg(long)]
        no_backup: bool,
    },
    /// Show partition info and checksum for an image
    Info {
        /// Disk image path
        image: PathBuf,
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Corrupt the image's partition table
    Corrupt {
        /// Disk image path
        image: PathBuf,
        /// Corruption kind (wrong_lba, wrong_size, wrong_type, no_signature, all_zero)
        #[arg(short, long)]
        kind: String,
        /// Output path (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scan for a backup MBR and surviving boot sectors
    Scan {
        /// Disk image path
        image: PathBuf,
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Attempt automated recovery of the partition table
    Repair {
        /// Disk image path
        image: PathBuf,
        /// Output path (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Hex-dump a window of the image
    Hexdump {
        /// Disk image path
        image: PathBuf,
        /// Byte offset (defaults to the partition table at 0x1BE)
        #[arg(long, default_value_t = 0x1BE)]
        offset: usize,
        /// Window length in bytes
        #[arg(long, default_value_t = 66)]
        length: usize,
    },
}

fn load_image(path: &Path) -> anyhow::Result<DiskImage> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    info!("Loaded {} ({} bytes)", path.display(), bytes.len());
    DiskImage::from_bytes(bytes)
        .with_context(|| format!("Not a usable disk image: {}", path.display()))
}

fn save_image(path: &Path, disk: &DiskImage) -> anyhow::Result<()> {
    fs::write(path, disk.as_bytes())
        .with_context(|| format!("Failed to write image: {}", path.display()))?;
    info!("Wrote {} ({} bytes)", path.display(), disk.len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            output,
            size,
            no_backup,
        } => {
            let built = builder::build(size, !no_backup)?;
            save_image(&output, &built.disk)?;
            println!("Created {} ({} bytes)", output.display(), built.disk.len());
            println!(
                "  Partition: LBA={}, sectors={}, type=0x{:02X} (FAT32)",
                builder::PARTITION_START_LBA,
                builder::PARTITION_SECTOR_COUNT,
                builder::PARTITION_TYPE_FAT32_LBA
            );
            println!(
                "  Backup MBR: {}",
                if built.backup_mbr.is_some() {
                    "yes (last sector)"
                } else {
                    "no"
                }
            );
        }
        Commands::Info { image, json } => {
            let disk = load_image(&image)?;
            let sector = disk.read_sector(0)?;
            let mbr = Mbr::from_sector_unchecked(sector);
            let sum = checksum(disk.as_bytes());

            if json {
                let report = serde_json::json!({
                    "size": disk.len(),
                    "total_sectors": disk.total_sectors(),
                    "valid_signature": mbr.has_valid_signature(),
                    "checksum": format!("0x{:08x}", sum),
                    "partition": mbr.partition_info(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Image: {} ({} bytes, {} sectors)", image.display(), disk.len(), disk.total_sectors());
                println!("Checksum (first 1 KiB): 0x{:08x}", sum);
                if !mbr.has_valid_signature() {
                    println!("Warning: invalid MBR signature in sector 0");
                }
                match mbr.partition_info() {
                    Some(info) => {
                        println!("Partition 1:");
                        println!("  Bootable: {}", if info.bootable { "Yes (0x80)" } else { "No (0x00)" });
                        println!("  Type: 0x{:02X}", info.partition_type);
                        println!("  LBA start: {}", info.lba_start);
                        println!("  Sectors: {}", info.sector_count);
                        println!("  Size: {:.2} MB", info.size_mb);
                    }
                    None => println!("No partition entry in slot 1"),
                }
            }
        }
        Commands::Corrupt {
            image,
            kind,
            output,
        } => {
            let kind: CorruptionKind = kind.parse()?;
            let disk = load_image(&image)?;
            let mbr = Mbr::from_sector_unchecked(disk.read_sector(0)?);
            let corrupted = corrupt(&mbr, Some(kind))?;
            let disk = disk.with_sector(0, corrupted.as_bytes())?;

            let output = output.unwrap_or(image);
            save_image(&output, &disk)?;
            println!("Applied '{}' to {}", kind, output.display());
            println!("The partition table no longer reflects the disk contents.");
        }
        Commands::Scan { image, json } => {
            let disk = load_image(&image)?;
            let backup = find_backup_mbr(&disk);
            let records = find_boot_sectors(&disk);

            if json {
                let report = serde_json::json!({
                    "backup_mbr_sector": backup.as_ref().map(|hit| hit.sector_number),
                    "boot_sectors": records,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                match &backup {
                    Some(hit) => println!("Backup MBR: found at sector {}", hit.sector_number),
                    None => println!("Backup MBR: not found"),
                }
                if records.is_empty() {
                    println!("Boot sectors: none found");
                } else {
                    println!("Boot sectors:");
                    for record in &records {
                        println!(
                            "  sector {}: {} '{}', {} sectors ({:.2} MB), {} bytes/sector, {} sectors/cluster",
                            record.sector_number,
                            record.filesystem_type,
                            record.oem_id,
                            record.total_sectors,
                            record.total_sectors as f64 * 512.0 / 1024.0 / 1024.0,
                            record.bytes_per_sector,
                            record.sectors_per_cluster
                        );
                    }
                }
            }
        }
        Commands::Repair { image, output } => {
            let disk = load_image(&image)?;
            let outcome = repair(&disk)?;

            let suggested = export_file_name(image.file_name().and_then(|n| n.to_str()));
            let output = output.unwrap_or_else(|| image.with_file_name(suggested));
            save_image(&output, &outcome.disk)?;

            match outcome.method {
                RepairMethod::BackupRestore => println!("Repaired via backup MBR restore"),
                RepairMethod::Reconstruction => {
                    println!("Repaired via MBR reconstruction from boot sectors")
                }
            }
            match &outcome.source {
                RepairSource::BackupSector(sector) => {
                    println!("  Source: backup at sector {}", sector)
                }
                RepairSource::BootSectors(records) => {
                    println!("  Source: {} boot sector(s)", records.len());
                    for record in records {
                        println!(
                            "    sector {}: {} ({} sectors)",
                            record.sector_number, record.filesystem_type, record.total_sectors
                        );
                    }
                }
            }
            if let Some(info) = outcome.mbr.partition_info() {
                println!(
                    "  Partition 1: type=0x{:02X}, LBA={}, {} sectors ({:.2} MB)",
                    info.partition_type, info.lba_start, info.sector_count, info.size_mb
                );
            }
            println!("Wrote {}", output.display());
        }
        Commands::Hexdump {
            image,
            offset,
            length,
        } => {
            let disk = load_image(&image)?;
            print!("{}", diagnostics::hex_dump(disk.as_bytes(), offset, length));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");

        let built = builder::build(builder::DEFAULT_DISK_SIZE, true).unwrap();
        save_image(&path, &built.disk).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.as_bytes(), built.disk.as_bytes());
    }

    #[test]
    fn test_load_rejects_tiny_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.img");
        fs::write(&path, [0u8; 100]).unwrap();
        assert!(load_image(&path).is_err());
    }

    #[test]
    fn test_corrupt_and_repair_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");

        let built = builder::build(builder::DEFAULT_DISK_SIZE, true).unwrap();
        save_image(&path, &built.disk).unwrap();

        // Corrupt in place the way the subcommand does
        let disk = load_image(&path).unwrap();
        let mbr = Mbr::from_sector_unchecked(disk.read_sector(0).unwrap());
        let corrupted = corrupt(&mbr, Some(CorruptionKind::NoSignature)).unwrap();
        let disk = disk.with_sector(0, corrupted.as_bytes()).unwrap();
        save_image(&path, &disk).unwrap();

        let disk = load_image(&path).unwrap();
        let outcome = repair(&disk).unwrap();
        assert_eq!(outcome.method, RepairMethod::BackupRestore);
        assert_eq!(&outcome.disk.as_bytes()[..512], &built.mbr.as_bytes()[..]);
    }
}
