use crate::disk::disk_blocks::{INODES_PER_BLOCK, INODE_CACHE_SLOTS};
use crate::disk::{BlockDevice, Inode, SuperBlock, BLOCK_SIZE};
use crate::{ByteSerializable, CromixError, CromixErrorConvertible};
use alloc::vec::Vec;
use log::debug;

/// The in-memory inode table. Inodes are numbered from 1; inode `n` lives in block
/// `first_inode_block + (n - 1) / 4`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InodeManager {
    first_inode_block: u32,
    inodes: Vec<Inode>,
}

impl InodeManager {
    /// Reads the whole inode table.
    pub fn load<E: CromixErrorConvertible>(
        super_block: &SuperBlock,
        device: &dyn BlockDevice<E>,
    ) -> Result<Self, CromixError<E>> {
        let count = super_block.inode_count() as usize;
        let mut inodes = Vec::with_capacity(count);

        for i in 0..super_block.inode_blocks() {
            let block = super_block.first_inode_block() + i;
            let bytes = match device.read_block(block) {
                Ok(b) => b,
                Err(e) => return Err(e.into_cromix_error()),
            };

            for j in 0..INODES_PER_BLOCK as usize {
                if inodes.len() >= count {
                    break;
                }

                let offset = j * Inode::SIZE;

                inodes.push(match Inode::from_bytes(&bytes[offset..]) {
                    Some(inode) => inode,
                    None => return Err(CromixError::StructuralCorruption(block)),
                });
            }
        }

        debug!("loaded {} inodes", inodes.len());

        return Ok(Self {
            first_inode_block: super_block.first_inode_block(),
            inodes,
        });
    }

    /// A table with every inode unused.
    pub fn empty(super_block: &SuperBlock) -> Self {
        return Self {
            first_inode_block: super_block.first_inode_block(),
            inodes: vec![Inode::unused(); super_block.inode_count() as usize],
        };
    }

    pub fn count(&self) -> u16 {
        return self.inodes.len() as u16;
    }

    pub fn contains(&self, number: u16) -> bool {
        return number >= 1 && (number as usize) <= self.inodes.len();
    }

    pub fn get(&self, number: u16) -> Option<&Inode> {
        if !self.contains(number) {
            return None;
        }

        return Some(&self.inodes[number as usize - 1]);
    }

    pub fn get_mut(&mut self, number: u16) -> Option<&mut Inode> {
        if !self.contains(number) {
            return None;
        }

        return Some(&mut self.inodes[number as usize - 1]);
    }

    /// Every inode with its number, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Inode)> {
        return self
            .inodes
            .iter()
            .enumerate()
            .map(|(i, inode)| (i as u16 + 1, inode));
    }

    /// Takes an inode number from the super-block's free inode cache, refilling the cache from
    /// the table when it runs dry. Cached numbers that turn out to be in use are skipped.
    pub fn get_available_inode<E: CromixErrorConvertible>(
        &self,
        super_block: &mut SuperBlock,
    ) -> Result<u16, CromixError<E>> {
        loop {
            if super_block.free_inode_count() == 0 {
                self.refill_free_inodes(super_block);
            }

            let number = match super_block.pop_free_inode() {
                Some(n) => n,
                None => return Err(CromixError::NoFreeInode),
            };

            match self.get(number) {
                Some(inode) if !inode.is_allocated() => {
                    debug!("inode {} taken from the free cache", number);
                    return Ok(number);
                }
                _ => debug!("skipping stale free cache entry {}", number),
            }
        }
    }

    /// Marks an inode unused and offers it to the free inode cache.
    pub fn release_inode(&mut self, number: u16, super_block: &mut SuperBlock) {
        if let Some(inode) = self.get_mut(number) {
            *inode = Inode::unused();
            super_block.push_free_inode(number);
        }
    }

    /// Rescans the table for unused inodes and fills the free inode cache with up to 80 of them.
    pub fn refill_free_inodes(&self, super_block: &mut SuperBlock) {
        super_block.clear_free_inodes();

        let free: Vec<u16> = self
            .iter()
            .filter(|(_, inode)| !inode.is_allocated())
            .map(|(n, _)| n)
            .take(INODE_CACHE_SLOTS)
            .collect();

        // Pushed highest first so the lowest numbers come out first.
        for n in free.iter().rev() {
            super_block.push_free_inode(*n);
        }

        debug!("free inode cache refilled with {} entries", free.len());
    }

    /// The block and byte offset holding an inode.
    pub fn location(&self, number: u16) -> (u32, usize) {
        let index = number as u32 - 1;

        return (
            self.first_inode_block + index / INODES_PER_BLOCK,
            (index % INODES_PER_BLOCK) as usize * Inode::SIZE,
        );
    }

    /// Writes one inode back to its home block.
    pub fn flush<E: CromixErrorConvertible>(
        &self,
        number: u16,
        device: &mut dyn BlockDevice<E>,
    ) -> Result<(), CromixError<E>> {
        let inode = match self.get(number) {
            Some(i) => i,
            None => return Err(CromixError::InodeOutOfBounds(number)),
        };

        let (block, offset) = self.location(number);

        let mut bytes = match device.read_block(block) {
            Ok(b) => b,
            Err(e) => return Err(e.into_cromix_error()),
        };

        bytes[offset..offset + Inode::SIZE].copy_from_slice(&inode.to_bytes());

        match device.write_block(block, &bytes) {
            Ok(_) => (),
            Err(e) => return Err(e.into_cromix_error()),
        }

        return Ok(());
    }

    /// Writes the whole table.
    pub fn flush_all<E: CromixErrorConvertible>(
        &self,
        device: &mut dyn BlockDevice<E>,
    ) -> Result<(), CromixError<E>> {
        for (i, chunk) in self.inodes.chunks(INODES_PER_BLOCK as usize).enumerate() {
            let mut bytes = [0u8; BLOCK_SIZE];

            for (j, inode) in chunk.iter().enumerate() {
                bytes[j * Inode::SIZE..(j + 1) * Inode::SIZE].copy_from_slice(&inode.to_bytes());
            }

            match device.write_block(self.first_inode_block + i as u32, &bytes) {
                Ok(_) => (),
                Err(e) => return Err(e.into_cromix_error()),
            }
        }

        return Ok(());
    }
}
