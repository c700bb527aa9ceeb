use super::BLOCK_SIZE;
use crate::ByteSerializable;
use alloc::string::String;
use byteorder::{BigEndian, ByteOrder};

pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / DirectoryEntry::SIZE;

const NAME_LENGTH: usize = 24;
const ALLOCATED: u16 = 0x8000;

/// A 32 byte directory slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Padded with null bytes
    name: [u8; NAME_LENGTH],
    /// 0x8000 when the slot is in use
    status: u16,
    inode: u16,
}

/// One block of a directory: 16 fixed slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DirectoryBlock {
    entries: [DirectoryEntry; ENTRIES_PER_BLOCK],
}

impl DirectoryEntry {
    pub const SIZE: usize = 32;

    /// An allocated entry. None when the name cannot be stored.
    pub fn new(name: &str, inode: u16) -> Option<Self> {
        if !Self::is_valid_name(name) {
            return None;
        }

        let mut raw = [0u8; NAME_LENGTH];
        raw[..name.len()].copy_from_slice(name.as_bytes());

        return Some(Self {
            name: raw,
            status: ALLOCATED,
            inode,
        });
    }

    /// Names are 1 to 24 printable ASCII characters without a slash.
    pub fn is_valid_name(name: &str) -> bool {
        return !name.is_empty()
            && name.len() <= NAME_LENGTH
            && name.bytes().all(|b| b.is_ascii_graphic() && b != b'/');
    }

    pub fn name(&self) -> String {
        return self
            .name
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| *b as char)
            .collect();
    }

    pub fn inode(&self) -> u16 {
        return self.inode;
    }

    pub fn is_allocated(&self) -> bool {
        return self.status & ALLOCATED != 0;
    }

    pub fn set_allocated(&mut self, allocated: bool) {
        if allocated {
            self.status |= ALLOCATED;
        } else {
            self.status &= !ALLOCATED;
        }
    }

    /// Case-folded comparison.
    pub fn matches(&self, name: &str) -> bool {
        return self.name().eq_ignore_ascii_case(name);
    }
}

impl ByteSerializable for DirectoryEntry {
    type BytesArrayType = [u8; DirectoryEntry::SIZE];

    fn to_bytes(&self) -> Self::BytesArrayType {
        let mut bytes = [0u8; DirectoryEntry::SIZE];

        bytes[..NAME_LENGTH].copy_from_slice(&self.name);
        // bytes 0x18 to 0x1b are unused
        BigEndian::write_u16(&mut bytes[0x1c..], self.status);
        BigEndian::write_u16(&mut bytes[0x1e..], self.inode);

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < DirectoryEntry::SIZE {
            return None;
        }

        let mut name = [0u8; NAME_LENGTH];
        name.copy_from_slice(&bytes[..NAME_LENGTH]);

        return Some(Self {
            name,
            status: BigEndian::read_u16(&bytes[0x1c..]),
            inode: BigEndian::read_u16(&bytes[0x1e..]),
        });
    }
}

impl DirectoryBlock {
    pub fn empty() -> Self {
        return Self {
            entries: [DirectoryEntry::default(); ENTRIES_PER_BLOCK],
        };
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        return &self.entries;
    }

    pub fn entry(&self, slot: usize) -> &DirectoryEntry {
        return &self.entries[slot];
    }

    pub fn set_entry(&mut self, slot: usize, entry: DirectoryEntry) {
        self.entries[slot] = entry;
    }

    /// Marks a slot unused. The rest of the slot is left in place.
    pub fn release_entry(&mut self, slot: usize) {
        self.entries[slot].set_allocated(false);
    }

    /// The slot of the allocated entry with this name, compared case-folded.
    pub fn find_entry(&self, name: &str) -> Option<usize> {
        return self
            .entries
            .iter()
            .position(|e| e.is_allocated() && e.matches(name));
    }

    pub fn first_unused_entry(&self) -> Option<usize> {
        return self.entries.iter().position(|e| !e.is_allocated());
    }

    /// Byte offset just past the highest allocated slot, zero when no slot is allocated.
    pub fn extent(&self) -> u32 {
        return match self.entries.iter().rposition(|e| e.is_allocated()) {
            Some(slot) => ((slot + 1) * DirectoryEntry::SIZE) as u32,
            None => 0,
        };
    }

    pub fn allocated_count(&self) -> u32 {
        return self.entries.iter().filter(|e| e.is_allocated()).count() as u32;
    }

    /// Allocated entries with their slot numbers, in slot order.
    pub fn allocated_entries(&self) -> impl Iterator<Item = (usize, &DirectoryEntry)> {
        return self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_allocated());
    }
}

impl ByteSerializable for DirectoryBlock {
    type BytesArrayType = [u8; BLOCK_SIZE];

    fn to_bytes(&self) -> Self::BytesArrayType {
        let mut bytes = [0u8; BLOCK_SIZE];

        for (i, entry) in self.entries.iter().enumerate() {
            let offset = i * DirectoryEntry::SIZE;
            bytes[offset..offset + DirectoryEntry::SIZE].copy_from_slice(&entry.to_bytes());
        }

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < BLOCK_SIZE {
            return None;
        }

        let mut entries = [DirectoryEntry::default(); ENTRIES_PER_BLOCK];

        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = DirectoryEntry::from_bytes(&bytes[i * DirectoryEntry::SIZE..])?;
        }

        return Some(Self { entries });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entry {
        use super::*;

        #[test]
        fn test_new() {
            let entry = DirectoryEntry::new("startup.cmd", 12).unwrap();

            assert!(entry.is_allocated());
            assert_eq!(entry.name(), "startup.cmd");
            assert_eq!(entry.inode(), 12);
        }

        #[test]
        fn test_invalid_names() {
            assert!(DirectoryEntry::new("", 2).is_none());
            assert!(DirectoryEntry::new("a/b", 2).is_none());
            assert!(DirectoryEntry::new("abcdefghijklmnopqrstuvwxy", 2).is_none());
            assert!(DirectoryEntry::new("abcdefghijklmnopqrstuvwx", 2).is_some());
        }

        #[test]
        fn test_to_bytes() {
            let bytes = DirectoryEntry::new("bin", 0x0102).unwrap().to_bytes();

            assert_eq!(bytes[..4], [b'b', b'i', b'n', 0]);
            assert_eq!(bytes[0x1c..0x1e], [0x80, 0x00]);
            assert_eq!(bytes[0x1e..0x20], [0x01, 0x02]);
        }

        #[test]
        fn test_matches_case_folded() {
            let entry = DirectoryEntry::new("Shell.Bin", 3).unwrap();

            assert!(entry.matches("shell.bin"));
            assert!(entry.matches("SHELL.BIN"));
            assert!(!entry.matches("shell"));
        }
    }

    mod block {
        use super::*;

        #[test]
        fn test_find_entry() {
            let mut block = DirectoryBlock::empty();
            block.set_entry(0, DirectoryEntry::new("one", 2).unwrap());
            block.set_entry(3, DirectoryEntry::new("two", 3).unwrap());

            assert_eq!(block.find_entry("TWO"), Some(3));
            assert_eq!(block.find_entry("three"), None);
        }

        #[test]
        fn test_released_entry_is_not_found() {
            let mut block = DirectoryBlock::empty();
            block.set_entry(0, DirectoryEntry::new("one", 2).unwrap());
            block.release_entry(0);

            assert_eq!(block.find_entry("one"), None);
        }

        #[test]
        fn test_first_unused_entry_reuses_released_slot() {
            let mut block = DirectoryBlock::empty();

            for i in 0..ENTRIES_PER_BLOCK {
                block.set_entry(i, DirectoryEntry::new("x", i as u16 + 2).unwrap());
            }

            assert_eq!(block.first_unused_entry(), None);

            block.release_entry(5);
            assert_eq!(block.first_unused_entry(), Some(5));
        }

        #[test]
        fn test_extent() {
            let mut block = DirectoryBlock::empty();
            assert_eq!(block.extent(), 0);

            block.set_entry(0, DirectoryEntry::new("a", 2).unwrap());
            block.set_entry(6, DirectoryEntry::new("b", 3).unwrap());
            assert_eq!(block.extent(), 7 * 32);

            block.release_entry(6);
            assert_eq!(block.extent(), 32);
        }

        #[test]
        fn test_to_from_bytes() {
            let mut block = DirectoryBlock::empty();
            block.set_entry(2, DirectoryEntry::new("usr", 9).unwrap());

            let bytes = block.to_bytes();
            assert_eq!(bytes[0x40..0x43], [b'u', b's', b'r']);
            assert_eq!(DirectoryBlock::from_bytes(&bytes).unwrap(), block);
        }
    }
}
