use thiserror::Error;

#[derive(Debug, Error)]
pub enum RescueError {
    #[error("Invalid MBR signature: {:02X}{:02X} (should be 55AA)", .found[0], .found[1])]
    InvalidSignature { found: [u8; 2] },

    #[error("No corruption kind selected")]
    NoKindSelected,

    #[error("No boot sectors found on disk")]
    NoBootSectorsFound,

    #[error("Repair impossible: no backup MBR and no surviving boot sectors")]
    RepairImpossible,

    #[error("Buffer too small: {actual} bytes (need at least {needed})")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
