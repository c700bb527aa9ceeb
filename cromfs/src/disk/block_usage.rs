use crate::disk::{InodeManager, InodeType};
use crate::Diagnostic;
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};
use core::ops::Range;
use log::warn;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Claims {
    file: u32,
    directory: u32,
    free: u32,
}

/// Who claims each data block. Every data block should be claimed exactly once, by a file, a
/// directory or the free list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockUsage {
    data_area: Range<u32>,
    claims: Vec<Claims>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockStats {
    pub data_blocks: u32,
    pub file_blocks: u32,
    pub directory_blocks: u32,
    pub free_blocks: u32,
    /// Free blocks as the chain's record counts describe them.
    pub free_list_total: u32,
    pub orphaned: u32,
    pub duplicate: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InodeStats {
    pub inodes: u32,
    pub files: u32,
    pub directories: u32,
    pub character_devices: u32,
    pub block_devices: u32,
    pub pipes: u32,
    pub shared_text: u32,
    pub unknown: u32,
    pub unused: u32,
}

impl Claims {
    fn total(&self) -> u32 {
        return self.file + self.directory + self.free;
    }
}

impl BlockUsage {
    pub fn new(data_area: Range<u32>) -> Self {
        let count = data_area.end.saturating_sub(data_area.start) as usize;

        return Self {
            data_area,
            claims: vec![Claims::default(); count],
        };
    }

    fn claims_mut(&mut self, block: u32) -> Option<&mut Claims> {
        if !self.data_area.contains(&block) {
            return None;
        }

        let index = (block - self.data_area.start) as usize;
        return self.claims.get_mut(index);
    }

    pub fn claim_file(&mut self, block: u32) {
        if let Some(c) = self.claims_mut(block) {
            c.file += 1;
        }
    }

    pub fn claim_directory(&mut self, block: u32) {
        if let Some(c) = self.claims_mut(block) {
            c.directory += 1;
        }
    }

    pub fn claim_free(&mut self, block: u32) {
        if let Some(c) = self.claims_mut(block) {
            c.free += 1;
        }
    }

    /// Totals the claims. Unclaimed and multiply claimed blocks are reported in block order.
    pub fn summarize(&self) -> (BlockStats, Vec<Diagnostic>) {
        let mut stats = BlockStats {
            data_blocks: self.claims.len() as u32,
            ..BlockStats::default()
        };
        let mut diagnostics = Vec::new();

        for (i, c) in self.claims.iter().enumerate() {
            let block = self.data_area.start + i as u32;

            if c.file > 0 {
                stats.file_blocks += 1;
            }

            if c.directory > 0 {
                stats.directory_blocks += 1;
            }

            if c.free > 0 {
                stats.free_blocks += 1;
            }

            match c.total() {
                0 => {
                    warn!("block {} orphaned", block);
                    stats.orphaned += 1;
                    diagnostics.push(Diagnostic::OrphanedBlock(block));
                }
                1 => (),
                claims => {
                    warn!("block {} claimed {} times", block, claims);
                    stats.duplicate += 1;
                    diagnostics.push(Diagnostic::DuplicateBlock { block, claims });
                }
            }
        }

        return (stats, diagnostics);
    }
}

impl InodeStats {
    pub fn tally(inodes: &InodeManager) -> Self {
        let mut stats = Self::default();

        for (_, inode) in inodes.iter() {
            stats.inodes += 1;

            match inode.kind() {
                InodeType::Unused => stats.unused += 1,
                InodeType::File => stats.files += 1,
                InodeType::Directory => stats.directories += 1,
                InodeType::CharacterDevice => stats.character_devices += 1,
                InodeType::BlockDevice => stats.block_devices += 1,
                InodeType::Pipe => stats.pipes += 1,
                InodeType::SharedText => stats.shared_text += 1,
                InodeType::Unknown(_) => stats.unknown += 1,
            }
        }

        return stats;
    }
}

impl Display for InodeStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Inodes:            {:>6}", self.inodes)?;
        writeln!(f, "  files            {:>6}", self.files)?;
        writeln!(f, "  directories      {:>6}", self.directories)?;
        writeln!(f, "  character devices{:>6}", self.character_devices)?;
        writeln!(f, "  block devices    {:>6}", self.block_devices)?;
        writeln!(f, "  pipes            {:>6}", self.pipes)?;
        writeln!(f, "  shared text      {:>6}", self.shared_text)?;

        if self.unknown > 0 {
            writeln!(f, "  unknown type     {:>6}", self.unknown)?;
        }

        return writeln!(f, "  unused           {:>6}", self.unused);
    }
}

impl Display for BlockStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Data blocks:       {:>6}", self.data_blocks)?;
        writeln!(f, "  file             {:>6}", self.file_blocks)?;
        writeln!(f, "  directory        {:>6}", self.directory_blocks)?;
        writeln!(f, "  free             {:>6}", self.free_blocks)?;
        writeln!(f, "  free list total  {:>6}", self.free_list_total)?;
        writeln!(f, "  orphaned         {:>6}", self.orphaned)?;
        return writeln!(f, "  duplicate        {:>6}", self.duplicate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        let mut usage = BlockUsage::new(10..14);
        usage.claim_file(10);
        usage.claim_directory(11);
        usage.claim_free(12);
        usage.claim_free(13);

        let (stats, diagnostics) = usage.summarize();

        assert!(diagnostics.is_empty());
        assert_eq!(stats.data_blocks, 4);
        assert_eq!(stats.file_blocks, 1);
        assert_eq!(stats.directory_blocks, 1);
        assert_eq!(stats.free_blocks, 2);
    }

    #[test]
    fn test_orphan_and_duplicate() {
        let mut usage = BlockUsage::new(10..13);
        usage.claim_file(10);
        usage.claim_free(10);
        usage.claim_directory(12);

        let (stats, diagnostics) = usage.summarize();

        assert_eq!(stats.orphaned, 1);
        assert_eq!(stats.duplicate, 1);
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::DuplicateBlock {
                    block: 10,
                    claims: 2
                },
                Diagnostic::OrphanedBlock(11),
            ]
        );
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut usage = BlockUsage::new(10..11);
        usage.claim_file(9);
        usage.claim_file(11);
        usage.claim_file(10);

        assert!(usage.summarize().1.is_empty());
    }
}
