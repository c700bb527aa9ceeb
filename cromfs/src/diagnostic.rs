use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};

/// A defect found while walking a mounted filesystem. Diagnostics are collected into a report and
/// never stop the walk that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The device could not supply a block.
    BlockUnavailable { block: u32, inode: Option<u16> },
    /// A directory entry names an inode outside the inode table.
    InodeOutOfBounds { directory: u16, name: String, inode: u16 },
    /// A pointer was seen twice while walking one inode's blocks.
    StructuralCorruption { inode: u16, block: u32 },
    /// A pointer lies outside the data area.
    BlockOutOfRange { inode: u16, block: u32 },
    /// The free block chain is malformed at this record.
    FreeListCorrupt { block: u32 },
    /// A data block that is neither in use nor free.
    OrphanedBlock(u32),
    /// A data block claimed more than once.
    DuplicateBlock { block: u32, claims: u32 },
    /// An allocated inode with a zero link count.
    ZeroLinks(u16),
    BadLinkCount { inode: u16, recorded: u8, computed: u32 },
    BadDirectoryCount { inode: u16, recorded: u16, observed: u32 },
    WrongParent { inode: u16, recorded: u16, observed: u16 },
    ManyParents { inode: u16, parents: Vec<u16> },
    BadInodeNumber { inode: u16, recorded: u16 },
    UnallocatedReferenced { inode: u16, references: u32 },
    BadBlockCount { inode: u16, recorded: u32, counted: u32 },
    /// Only part of a file could be read back.
    PartialExtract { path: String, salvaged: u64, expected: u64 },
    HostWriteFailed { path: String, message: String },
}

impl Diagnostic {
    /// Whether this diagnostic belongs to the block sweep rather than the inode sweep.
    pub fn is_block_defect(&self) -> bool {
        use Diagnostic::*;

        return match self {
            BlockUnavailable { .. }
            | StructuralCorruption { .. }
            | BlockOutOfRange { .. }
            | FreeListCorrupt { .. }
            | OrphanedBlock(_)
            | DuplicateBlock { .. }
            | BadBlockCount { .. } => true,
            _ => false,
        };
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        use Diagnostic::*;

        match self {
            BlockUnavailable { block, inode } => match inode {
                Some(i) => write!(f, "inode {}: block {} unavailable", i, block),
                None => write!(f, "block {} unavailable", block),
            },
            InodeOutOfBounds {
                directory,
                name,
                inode,
            } => write!(
                f,
                "directory {}: entry \"{}\" references inode {} out of bounds",
                directory, name, inode
            ),
            StructuralCorruption { inode, block } => {
                write!(f, "inode {}: block {} referenced twice", inode, block)
            }
            BlockOutOfRange { inode, block } => {
                write!(f, "inode {}: block {} out of range", inode, block)
            }
            FreeListCorrupt { block } => write!(f, "free list corrupt at block {}", block),
            OrphanedBlock(block) => write!(f, "block {} orphaned", block),
            DuplicateBlock { block, claims } => {
                write!(f, "block {} duplicate ({} claims)", block, claims)
            }
            ZeroLinks(inode) => write!(f, "inode {}: allocated with zero links", inode),
            BadLinkCount {
                inode,
                recorded,
                computed,
            } => write!(
                f,
                "inode {}: bad link count {} should be {}",
                inode, recorded, computed
            ),
            BadDirectoryCount {
                inode,
                recorded,
                observed,
            } => write!(
                f,
                "inode {}: bad directory count {} should be {}",
                inode, recorded, observed
            ),
            WrongParent {
                inode,
                recorded,
                observed,
            } => write!(
                f,
                "inode {}: wrong parent {} should be {}",
                inode, recorded, observed
            ),
            ManyParents { inode, parents } => {
                write!(f, "inode {}: many parents", inode)?;

                for p in parents {
                    write!(f, " {}", p)?;
                }

                Ok(())
            }
            BadInodeNumber { inode, recorded } => {
                write!(f, "inode {}: bad inode number {}", inode, recorded)
            }
            UnallocatedReferenced { inode, references } => write!(
                f,
                "inode {}: unallocated with {} references",
                inode, references
            ),
            BadBlockCount {
                inode,
                recorded,
                counted,
            } => write!(
                f,
                "inode {}: bad block count {} should be {}",
                inode, recorded, counted
            ),
            PartialExtract {
                path,
                salvaged,
                expected,
            } => write!(
                f,
                "{}: salvaged {} of {} bytes",
                path, salvaged, expected
            ),
            HostWriteFailed { path, message } => write!(f, "{}: {}", path, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_many_parents() {
        let d = Diagnostic::ManyParents {
            inode: 7,
            parents: vec![1, 4],
        };

        assert_eq!("inode 7: many parents 1 4", format!("{}", d));
    }

    #[test]
    fn test_block_defect() {
        assert!(Diagnostic::OrphanedBlock(40).is_block_defect());
        assert!(!Diagnostic::ZeroLinks(3).is_block_defect());
    }
}
