use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Device not recognized: {0:?}")]
    UnrecognizedDevice(String),

    #[error("No '{process}' process maps {device}")]
    ProcessNotFound { process: String, device: String },

    #[error("Required tool not found on the device: {0}")]
    MissingTool(String),

    #[error("Decompressed frame is {actual} bytes, expected {expected}")]
    FrameLengthMismatch { expected: usize, actual: usize },

    #[error("Screenshot contains no drawn content")]
    EmptyContent,

    #[error("Unsupported framebuffer depth: {0} bytes per pixel")]
    UnsupportedPixelFormat(u32),

    #[error("Malformed memory map line {line}: {reason}")]
    MalformedMemoryMap { line: usize, reason: String },

    #[error("Process {pid} has no display device mapping")]
    DisplayMappingNotFound { pid: u32 },

    #[error("Process {pid} has no region after its display device mapping")]
    NoRegionAfterDisplay { pid: u32 },

    #[error("Invalid command argument: {0}")]
    InvalidCommandArgument(String),

    #[error("Remote command `{command}` failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Failed to decompress frame: {0}")]
    Decompress(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the run was stopped by a missing precondition on the device
    /// rather than by a transport or local failure.
    pub fn is_device_precondition(&self) -> bool {
        matches!(
            self,
            Error::UnrecognizedDevice(_)
                | Error::ProcessNotFound { .. }
                | Error::MissingTool(_)
                | Error::DisplayMappingNotFound { .. }
                | Error::NoRegionAfterDisplay { .. }
        )
    }
}
