mod directory;
mod free_block;
mod inode;
mod pointer_block;
mod super_block;
mod timestamp;

/// The only block size the engine handles.
pub const BLOCK_SIZE: usize = 512;

pub use directory::{DirectoryBlock, DirectoryEntry, ENTRIES_PER_BLOCK};
pub use free_block::FreeBlockRecord;
pub use inode::{AccessFlags, Inode, InodeBlocks, InodeType, DIRECT_BLOCKS};
pub use pointer_block::{PointerBlock, POINTERS_PER_BLOCK};
pub use super_block::{SuperBlock, INODES_PER_BLOCK, INODE_CACHE_SLOTS};
pub use timestamp::Timestamp;
