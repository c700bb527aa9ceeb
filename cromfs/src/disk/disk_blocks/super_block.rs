use super::{FreeBlockRecord, Inode, Timestamp, BLOCK_SIZE};
use crate::disk::Geometry;
use crate::utils::div_round_up;
use crate::ByteSerializable;
use byteorder::{BigEndian, ByteOrder};
use core::ops::Range;

const MAGIC: [u8; 6] = *b"cromix";
const CURRENT_VERSION: (u8, u8) = (0x01, 0x00);

pub const INODES_PER_BLOCK: u32 = (BLOCK_SIZE / Inode::SIZE) as u32;
pub const INODE_CACHE_SLOTS: usize = 80;

const FREE_BLOCKS_OFFSET: usize = 0x1c;
const FREE_INODE_COUNT_OFFSET: usize = 0x15e;
const FREE_INODES_OFFSET: usize = 0x160;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SuperBlock {
    version: (u8, u8),
    /// Must read "cromix".
    magic: [u8; 6],
    first_inode_block: u16,
    inode_count: u16,
    /// Total blocks on the media, including boot, super-block and inode table.
    block_count: u32,
    pub last_modified: Timestamp,
    block_size: u32,

    /// Head of the free block chain, stored inline.
    pub free_blocks: FreeBlockRecord,

    free_inode_count: u16,
    free_inodes: [u16; INODE_CACHE_SLOTS],
}

impl SuperBlock {
    /// Builds the canonical super-block for a geometry. The free block chain is left empty.
    pub fn initialise(geometry: &Geometry, now: Timestamp) -> Self {
        return Self {
            version: CURRENT_VERSION,
            magic: MAGIC,
            first_inode_block: geometry.first_inode_block(),
            inode_count: geometry.inode_count(),
            block_count: geometry.block_count(),
            last_modified: now,
            block_size: BLOCK_SIZE as u32,
            free_blocks: FreeBlockRecord::terminator(),
            free_inode_count: 0,
            free_inodes: [0u16; INODE_CACHE_SLOTS],
        };
    }

    pub fn validate(&self) -> bool {
        return self.magic == MAGIC;
    }

    pub fn version(&self) -> (u8, u8) {
        return self.version;
    }

    pub fn first_inode_block(&self) -> u32 {
        return self.first_inode_block as u32;
    }

    pub fn inode_count(&self) -> u16 {
        return self.inode_count;
    }

    pub fn block_count(&self) -> u32 {
        return self.block_count;
    }

    pub fn block_size(&self) -> u32 {
        return self.block_size;
    }

    pub fn inode_blocks(&self) -> u32 {
        return div_round_up(self.inode_count as u32, INODES_PER_BLOCK);
    }

    pub fn first_data_block(&self) -> u32 {
        return self.inode_blocks() + self.first_inode_block();
    }

    pub fn data_block_count(&self) -> u32 {
        return self.block_count.saturating_sub(self.first_data_block());
    }

    pub fn data_area(&self) -> Range<u32> {
        return self.first_data_block()..self.block_count;
    }

    pub fn is_data_block(&self, block: u32) -> bool {
        return self.data_area().contains(&block);
    }

    pub fn free_inode_count(&self) -> u16 {
        return self.free_inode_count;
    }

    pub fn cached_free_inodes(&self) -> &[u16] {
        let count = (self.free_inode_count as usize).min(INODE_CACHE_SLOTS);
        return &self.free_inodes[..count];
    }

    pub fn pop_free_inode(&mut self) -> Option<u16> {
        if self.free_inode_count == 0 {
            return None;
        }

        let count = (self.free_inode_count as usize).min(INODE_CACHE_SLOTS) - 1;
        self.free_inode_count = count as u16;

        let inode = self.free_inodes[count];
        self.free_inodes[count] = 0;

        return Some(inode);
    }

    /// Returns false when the cache is full and the inode was not recorded.
    pub fn push_free_inode(&mut self, inode: u16) -> bool {
        if self.free_inode_count as usize >= INODE_CACHE_SLOTS {
            return false;
        }

        self.free_inodes[self.free_inode_count as usize] = inode;
        self.free_inode_count += 1;

        return true;
    }

    pub fn clear_free_inodes(&mut self) {
        self.free_inode_count = 0;
        self.free_inodes = [0u16; INODE_CACHE_SLOTS];
    }

    pub const fn size() -> usize {
        return 512;
    }
}

impl ByteSerializable for SuperBlock {
    type BytesArrayType = [u8; 512];

    fn to_bytes(&self) -> Self::BytesArrayType {
        let mut bytes = [0u8; 512];

        bytes[0x00] = self.version.0;
        bytes[0x01] = self.version.1;
        bytes[0x02..0x08].copy_from_slice(&self.magic);
        BigEndian::write_u16(&mut bytes[0x08..], self.first_inode_block);
        BigEndian::write_u16(&mut bytes[0x0a..], self.inode_count);
        BigEndian::write_u32(&mut bytes[0x0c..], self.block_count);
        bytes[0x10..0x16].copy_from_slice(&self.last_modified.raw());
        BigEndian::write_u32(&mut bytes[0x16..], self.block_size);

        bytes[FREE_BLOCKS_OFFSET..FREE_BLOCKS_OFFSET + FreeBlockRecord::size()]
            .copy_from_slice(&self.free_blocks.to_bytes());

        BigEndian::write_u16(&mut bytes[FREE_INODE_COUNT_OFFSET..], self.free_inode_count);
        BigEndian::write_u16_into(
            &self.free_inodes,
            &mut bytes[FREE_INODES_OFFSET..FREE_INODES_OFFSET + INODE_CACHE_SLOTS * 2],
        );

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self>
    where
        Self: core::marker::Sized,
    {
        if bytes.len() < Self::size() {
            return None;
        }

        let mut magic = [0u8; 6];
        magic.copy_from_slice(&bytes[0x02..0x08]);

        let free_blocks = FreeBlockRecord::from_bytes(&bytes[FREE_BLOCKS_OFFSET..])?;

        let mut free_inodes = [0u16; INODE_CACHE_SLOTS];
        BigEndian::read_u16_into(
            &bytes[FREE_INODES_OFFSET..FREE_INODES_OFFSET + INODE_CACHE_SLOTS * 2],
            &mut free_inodes,
        );

        return Some(Self {
            version: (bytes[0x00], bytes[0x01]),
            magic,
            first_inode_block: BigEndian::read_u16(&bytes[0x08..]),
            inode_count: BigEndian::read_u16(&bytes[0x0a..]),
            block_count: BigEndian::read_u32(&bytes[0x0c..]),
            last_modified: Timestamp::from_raw(&bytes[0x10..]),
            block_size: BigEndian::read_u32(&bytes[0x16..]),
            free_blocks,
            free_inode_count: BigEndian::read_u16(&bytes[FREE_INODE_COUNT_OFFSET..]),
            free_inodes,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_geometry() -> Geometry {
        return Geometry::from_label("small-ss").unwrap();
    }

    #[test]
    fn create_new() {
        let block = SuperBlock::initialise(&small_geometry(), Timestamp::from_raw(&[85, 1, 2, 3, 4, 5]));

        assert!(block.validate());
        assert_eq!(block.first_inode_block(), 2);
        assert_eq!(block.inode_count(), 64);
        assert_eq!(block.first_data_block(), 18);
        assert_eq!(block.data_block_count(), 400 - 18);
        assert_eq!(block.free_blocks, FreeBlockRecord::terminator());
    }

    #[test]
    fn test_first_data_block_rounds_up() {
        let mut block = SuperBlock::initialise(&small_geometry(), Timestamp::default());
        block.inode_count = 65;

        assert_eq!(block.inode_blocks(), 17);
        assert_eq!(block.first_data_block(), 19);
    }

    #[test]
    fn test_to_bytes() {
        let mut block = SuperBlock::initialise(&small_geometry(), Timestamp::from_raw(&[85, 1, 2, 3, 4, 5]));
        block.free_blocks.push(0x0190);
        block.push_free_inode(7);

        let bytes = block.to_bytes();

        assert_eq!(bytes[0x00..0x02], [0x01, 0x00]);
        assert_eq!(&bytes[0x02..0x08], b"cromix");
        assert_eq!(bytes[0x08..0x0a], [0x00, 0x02]);
        assert_eq!(bytes[0x0a..0x0c], [0x00, 0x40]);
        assert_eq!(bytes[0x0c..0x10], [0x00, 0x00, 0x01, 0x90]);
        assert_eq!(bytes[0x10..0x16], [85, 1, 2, 3, 4, 5]);
        assert_eq!(bytes[0x16..0x1a], [0x00, 0x00, 0x02, 0x00]);
        assert_eq!(bytes[0x1c..0x1e], [0x00, 0x02]);
        assert_eq!(bytes[0x22..0x26], [0x00, 0x00, 0x01, 0x90]);
        assert_eq!(bytes[0x15e..0x160], [0x00, 0x01]);
        assert_eq!(bytes[0x160..0x162], [0x00, 0x07]);
    }

    #[test]
    fn test_to_from_bytes() {
        let mut block = SuperBlock::initialise(&small_geometry(), Timestamp::from_raw(&[99, 12, 31, 23, 59, 59]));

        for i in 0..30 {
            block.free_blocks.push(100 + i);
        }

        for i in 0..INODE_CACHE_SLOTS as u16 {
            block.push_free_inode(i + 2);
        }

        assert_eq!(SuperBlock::from_bytes(&block.to_bytes()).unwrap(), block);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = SuperBlock::initialise(&small_geometry(), Timestamp::default()).to_bytes();
        bytes[0x02] = b'C';

        assert!(!SuperBlock::from_bytes(&bytes).unwrap().validate());
    }

    #[test]
    fn test_inode_cache() {
        let mut block = SuperBlock::initialise(&small_geometry(), Timestamp::default());

        for i in 0..INODE_CACHE_SLOTS as u16 {
            assert!(block.push_free_inode(i + 1));
        }

        assert!(!block.push_free_inode(99));
        assert_eq!(block.pop_free_inode(), Some(INODE_CACHE_SLOTS as u16));
        assert_eq!(block.free_inode_count(), INODE_CACHE_SLOTS as u16 - 1);
    }
}
