// Disk image byte-buffer model
//
// A DiskImage is an owned, immutable-by-convention byte buffer. Every
// operation that "modifies" the disk returns a new DiskImage; no component
// holds a mutable alias into another's buffer.

use crate::error::RescueError;

/// Sector size used throughout. MBR and FAT boot sectors are always 512 bytes.
pub const SECTOR_SIZE: usize = 512;

/// Default name suggested for exporting a disk image that was not loaded
/// from an external file.
pub const DEFAULT_EXPORT_NAME: &str = "fat32_disk.img";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskImage {
    data: Vec<u8>,
}

impl DiskImage {
    /// Create a zero-filled image. Size must be a positive multiple of 512.
    pub fn zeroed(size: u64) -> Result<Self, RescueError> {
        if size < SECTOR_SIZE as u64 {
            return Err(RescueError::BufferTooSmall {
                needed: SECTOR_SIZE,
                actual: size as usize,
            });
        }
        if size % SECTOR_SIZE as u64 != 0 {
            return Err(RescueError::InvalidInput(format!(
                "disk size {} is not a multiple of {}",
                size, SECTOR_SIZE
            )));
        }
        Ok(Self {
            data: vec![0u8; size as usize],
        })
    }

    /// Wrap an externally supplied byte sequence. Any length is accepted as
    /// long as at least one full sector is present; sector-aligned reads are
    /// bounds-checked individually.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RescueError> {
        if data.len() < SECTOR_SIZE {
            return Err(RescueError::BufferTooSmall {
                needed: SECTOR_SIZE,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of complete 512-byte sectors in the image.
    pub fn total_sectors(&self) -> u64 {
        (self.data.len() / SECTOR_SIZE) as u64
    }

    /// The full buffer, byte-for-byte. Export contract: no transformation,
    /// no partial view.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Read one sector by LBA into an owned copy.
    pub fn read_sector(&self, lba: u64) -> Result<[u8; SECTOR_SIZE], RescueError> {
        let offset = lba as usize * SECTOR_SIZE;
        self.read_sector_at(offset)
    }

    /// Read one sector by byte offset into an owned copy.
    pub fn read_sector_at(&self, offset: usize) -> Result<[u8; SECTOR_SIZE], RescueError> {
        let end = offset
            .checked_add(SECTOR_SIZE)
            .ok_or(RescueError::BufferTooSmall {
                needed: usize::MAX,
                actual: self.data.len(),
            })?;
        if end > self.data.len() {
            return Err(RescueError::BufferTooSmall {
                needed: end,
                actual: self.data.len(),
            });
        }
        let mut sector = [0u8; SECTOR_SIZE];
        sector.copy_from_slice(&self.data[offset..end]);
        Ok(sector)
    }

    /// Copy-on-write sector update: returns a new image with the given
    /// sector replaced. The original image is untouched.
    pub fn with_sector(&self, lba: u64, sector: &[u8; SECTOR_SIZE]) -> Result<Self, RescueError> {
        let offset = lba as usize * SECTOR_SIZE;
        let end = offset + SECTOR_SIZE;
        if end > self.data.len() {
            return Err(RescueError::BufferTooSmall {
                needed: end,
                actual: self.data.len(),
            });
        }
        let mut data = self.data.clone();
        data[offset..end].copy_from_slice(sector);
        Ok(Self { data })
    }
}

/// Suggested filename for exporting the current buffer. External
/// collaborators preserve an originally-loaded file's name so extensions
/// like .vhd survive the round trip.
pub fn export_file_name(loaded_name: Option<&str>) -> String {
    match loaded_name {
        Some(name) => name.to_string(),
        None => DEFAULT_EXPORT_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_requires_sector_multiple() {
        assert!(DiskImage::zeroed(4096).is_ok());
        assert!(matches!(
            DiskImage::zeroed(1000),
            Err(RescueError::InvalidInput(_))
        ));
        assert!(matches!(
            DiskImage::zeroed(256),
            Err(RescueError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_from_bytes_rejects_short_buffers() {
        assert!(matches!(
            DiskImage::from_bytes(vec![0u8; 511]),
            Err(RescueError::BufferTooSmall {
                needed: 512,
                actual: 511
            })
        ));
        assert!(DiskImage::from_bytes(vec![0u8; 512]).is_ok());
    }

    #[test]
    fn test_read_sector_out_of_range() {
        let disk = DiskImage::zeroed(1024).unwrap();
        assert!(disk.read_sector(1).is_ok());
        assert!(matches!(
            disk.read_sector(2),
            Err(RescueError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_with_sector_is_copy_on_write() {
        let disk = DiskImage::zeroed(1024).unwrap();
        let sector = [0xABu8; SECTOR_SIZE];
        let updated = disk.with_sector(1, &sector).unwrap();

        assert_eq!(&disk.as_bytes()[512..], &[0u8; 512][..]);
        assert_eq!(&updated.as_bytes()[512..], &[0xABu8; 512][..]);
        assert_eq!(disk.total_sectors(), 2);
    }

    #[test]
    fn test_export_file_name_preserves_loaded_name() {
        assert_eq!(export_file_name(Some("backup.vhd")), "backup.vhd");
        assert_eq!(export_file_name(None), DEFAULT_EXPORT_NAME);
    }
}
