use crate::disk::{
    BlockDevice, BlockStats, BlockUsage, DirectoryBlock, FreeBlockList, InodeManager, InodeStats,
    SuperBlock,
};
use crate::{ByteSerializable, CromixErrorConvertible, Diagnostic};
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};
use log::{error, info, warn};

/// Result of a consistency check. Nothing in it has been corrected on the media.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub inode_stats: InodeStats,
    pub block_stats: BlockStats,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn inode_defects(&self) -> impl Iterator<Item = &Diagnostic> {
        return self.diagnostics.iter().filter(|d| !d.is_block_defect());
    }

    pub fn block_defects(&self) -> impl Iterator<Item = &Diagnostic> {
        return self.diagnostics.iter().filter(|d| d.is_block_defect());
    }

    pub fn is_clean(&self) -> bool {
        return self.diagnostics.is_empty();
    }
}

impl Display for CheckReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.inode_stats)?;
        write!(f, "{}", self.block_stats)?;

        if self.is_clean() {
            return writeln!(f, "No defects found.");
        }

        writeln!(f, "{} defects:", self.diagnostics.len())?;

        for d in &self.diagnostics {
            writeln!(f, "  {}", d)?;
        }

        return Ok(());
    }
}

pub(crate) fn check<E: CromixErrorConvertible>(
    super_block: &SuperBlock,
    inodes: &InodeManager,
    device: &dyn BlockDevice<E>,
) -> CheckReport {
    let (mut block_stats, mut diagnostics) = block_sweep(super_block, inodes, device);
    diagnostics.append(&mut inode_sweep(super_block, inodes, device));

    block_stats.free_list_total =
        FreeBlockList::count_chain(&super_block.free_blocks, &super_block.data_area(), device);

    let report = CheckReport {
        inode_stats: InodeStats::tally(inodes),
        block_stats,
        diagnostics,
    };

    info!("check finished with {} defects", report.diagnostics.len());

    return report;
}

/// Classifies every data block by walking each inode's pointers and the free chain.
fn block_sweep<E: CromixErrorConvertible>(
    super_block: &SuperBlock,
    inodes: &InodeManager,
    device: &dyn BlockDevice<E>,
) -> (BlockStats, Vec<Diagnostic>) {
    let data_area = super_block.data_area();
    let mut usage = BlockUsage::new(data_area.clone());
    let mut diagnostics = Vec::new();

    for (number, inode) in inodes.iter() {
        if !inode.is_allocated() || inode.is_device() {
            continue;
        }

        let walk = inode.data_blocks(number, &data_area, device);

        for block in walk.data().iter().chain(walk.pointers().iter()) {
            if inode.is_directory() {
                usage.claim_directory(*block);
            } else {
                usage.claim_file(*block);
            }
        }

        if walk.is_complete() && walk.total() != inode.used_blocks() {
            warn!(
                "inode {}: records {} blocks, {} counted",
                number,
                inode.used_blocks(),
                walk.total()
            );
            diagnostics.push(Diagnostic::BadBlockCount {
                inode: number,
                recorded: inode.used_blocks(),
                counted: walk.total(),
            });
        }

        diagnostics.append(&mut walk.into_diagnostics());
    }

    let mut free_diagnostics = FreeBlockList::visit_chain(
        &super_block.free_blocks,
        &data_area,
        device,
        &mut |block: u32| usage.claim_free(block),
    );
    diagnostics.append(&mut free_diagnostics);

    let (stats, mut usage_diagnostics) = usage.summarize();
    diagnostics.append(&mut usage_diagnostics);

    return (stats, diagnostics);
}

/// Pass 1 counts the references each inode receives from directory entries and records the
/// directories they come from. Pass 2 compares those against every inode's own fields.
fn inode_sweep<E: CromixErrorConvertible>(
    super_block: &SuperBlock,
    inodes: &InodeManager,
    device: &dyn BlockDevice<E>,
) -> Vec<Diagnostic> {
    let data_area = super_block.data_area();
    let slots = inodes.count() as usize + 1;

    let mut links = vec![0u32; slots];
    let mut parents: Vec<Vec<u16>> = vec![Vec::new(); slots];
    let mut entry_counts: Vec<Option<u32>> = vec![None; slots];
    let mut diagnostics = Vec::new();

    // The root is its own parent.
    if slots > 1 {
        links[1] = 1;
        parents[1].push(1);
    }

    for (directory, inode) in inodes.iter() {
        if !inode.is_directory() {
            continue;
        }

        let walk = inode.data_blocks(directory, &data_area, device);
        let mut count = 0;

        for block in walk.data() {
            let bytes = match device.read_block(*block) {
                Ok(b) => b,
                Err(e) => {
                    error!("directory {}: reading block {}: {:?}", directory, block, e);
                    diagnostics.push(Diagnostic::BlockUnavailable {
                        block: *block,
                        inode: Some(directory),
                    });
                    continue;
                }
            };

            let entries = match DirectoryBlock::from_bytes(&bytes) {
                Some(e) => e,
                None => continue,
            };

            for (_, entry) in entries.allocated_entries() {
                count += 1;
                let target = entry.inode();

                if !inodes.contains(target) {
                    diagnostics.push(Diagnostic::InodeOutOfBounds {
                        directory,
                        name: entry.name(),
                        inode: target,
                    });
                    continue;
                }

                links[target as usize] += 1;

                if !parents[target as usize].contains(&directory) {
                    parents[target as usize].push(directory);
                }
            }
        }

        entry_counts[directory as usize] = Some(count);
    }

    for (number, inode) in inodes.iter() {
        let i = number as usize;
        let computed = links[i];

        if !inode.is_allocated() {
            if computed > 0 {
                diagnostics.push(Diagnostic::UnallocatedReferenced {
                    inode: number,
                    references: computed,
                });
            }

            continue;
        }

        if inode.links() == 0 {
            diagnostics.push(Diagnostic::ZeroLinks(number));
        } else if inode.links() as u32 != computed {
            diagnostics.push(Diagnostic::BadLinkCount {
                inode: number,
                recorded: inode.links(),
                computed,
            });
        }

        if inode.number() != number {
            diagnostics.push(Diagnostic::BadInodeNumber {
                inode: number,
                recorded: inode.number(),
            });
        }

        if let Some(observed) = entry_counts[i] {
            if inode.dir_count() as u32 != observed {
                diagnostics.push(Diagnostic::BadDirectoryCount {
                    inode: number,
                    recorded: inode.dir_count(),
                    observed,
                });
            }
        }

        let observed_parents = &parents[i];

        if observed_parents.len() > 1 {
            diagnostics.push(Diagnostic::ManyParents {
                inode: number,
                parents: observed_parents.clone(),
            });
        } else if !observed_parents.is_empty() && observed_parents[0] != inode.parent() {
            diagnostics.push(Diagnostic::WrongParent {
                inode: number,
                recorded: inode.parent(),
                observed: observed_parents[0],
            });
        }
    }

    for d in diagnostics.iter() {
        warn!("{}", d);
    }

    return diagnostics;
}
