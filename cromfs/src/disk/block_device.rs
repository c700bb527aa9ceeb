use crate::CromixErrorConvertible;
use alloc::string::String;
use alloc::vec::Vec;

/// Implementors wrap one disk image format. Block numbers are absolute on the media.
pub trait BlockDevice<E: CromixErrorConvertible> {
    /// Read the 512 byte super-block.
    fn super_block(&self) -> Result<Vec<u8>, E>;

    /// Read a whole block. The returned vector must be exactly one block long.
    fn read_block(&self, number: u32) -> Result<Vec<u8>, E>;

    /// Overwrite a whole block.
    fn write_block(&mut self, number: u32, bytes: &[u8]) -> Result<(), E>;

    /// Overwrite the super-block.
    fn flush_super_block(&mut self, bytes: &[u8]) -> Result<(), E>;

    /// A short name of the image format, e.g. "flat".
    fn format_label(&self) -> String;

    /// The number of blocks the media can hold.
    fn block_count(&self) -> u32;

    /// Write the entire media out to wherever it is backed.
    fn persist(&mut self) -> Result<(), E>;
}
