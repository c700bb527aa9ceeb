// Disk layout:
// block 0 boot, block 1 super-block, inode table from first_inode_block (4 inodes per block),
// data blocks from first_data_block up to block_count.

mod block_device;
mod block_usage;
mod check;
mod disk_blocks;
mod file_system;
mod filesystem_info;
mod free_list;
mod geometry;
mod host;
mod inode_manager;

pub use block_device::BlockDevice;
pub use block_usage::{BlockStats, BlockUsage, InodeStats};
pub use check::CheckReport;
pub use disk_blocks::{
    AccessFlags, DirectoryBlock, DirectoryEntry, FreeBlockRecord, Inode, InodeBlocks, InodeType,
    PointerBlock, SuperBlock, Timestamp, BLOCK_SIZE, DIRECT_BLOCKS, ENTRIES_PER_BLOCK,
    POINTERS_PER_BLOCK,
};
pub use file_system::{ExtractReport, FileSystem, ListEntry, Listing, ROOT_INODE};
pub use filesystem_info::FilesystemInfo;
pub use free_list::FreeBlockList;
pub use geometry::Geometry;
pub use host::{ExtractSink, HostEntry, HostSource};
pub use inode_manager::InodeManager;
