use crate::disk::Timestamp;
use alloc::string::String;
use core::fmt::{Display, Formatter};

/// A summary of a mounted filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilesystemInfo {
    pub format_label: String,
    pub version: (u8, u8),
    pub block_size: u32,
    pub block_count: u32,
    pub inode_count: u16,
    pub first_inode_block: u32,
    pub first_data_block: u32,
    pub data_block_count: u32,
    pub free_blocks: u32,
    pub free_inodes: u32,
    pub last_modified: Timestamp,
}

impl Display for FilesystemInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Format:            {}", self.format_label)?;
        writeln!(f, "Version:           {}.{}", self.version.0, self.version.1)?;
        writeln!(f, "Block size:        {}", self.block_size)?;
        writeln!(f, "Blocks:            {}", self.block_count)?;
        writeln!(f, "Inodes:            {}", self.inode_count)?;
        writeln!(f, "First inode block: {}", self.first_inode_block)?;
        writeln!(f, "First data block:  {}", self.first_data_block)?;
        writeln!(f, "Data blocks:       {}", self.data_block_count)?;
        writeln!(f, "Free blocks:       {}", self.free_blocks)?;
        writeln!(f, "Free inodes:       {}", self.free_inodes)?;
        return writeln!(f, "Last modified:     {}", self.last_modified);
    }
}
