pub mod layout;
mod locator;
mod maps;

pub use locator::*;
pub use maps::{MemoryMap, MemoryRegion, Permissions};
