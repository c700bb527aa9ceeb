use super::BLOCK_SIZE;
use crate::ByteSerializable;
use byteorder::{BigEndian, ByteOrder};

pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;

/// A block holding nothing but block numbers, used for indirect addressing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PointerBlock {
    pointers: [u32; POINTERS_PER_BLOCK],
}

impl PointerBlock {
    pub fn zeroed() -> Self {
        return Self {
            pointers: [0u32; POINTERS_PER_BLOCK],
        };
    }

    pub fn pointers(&self) -> &[u32] {
        return &self.pointers;
    }

    pub fn pointer_at(&self, index: usize) -> u32 {
        return self.pointers[index];
    }

    /// Stores the pointer in the first zero slot. Returns false when the block is full.
    pub fn add_pointer(&mut self, pointer: u32) -> bool {
        for slot in self.pointers.iter_mut() {
            if *slot == 0 {
                *slot = pointer;
                return true;
            }
        }

        return false;
    }

    /// The last non-zero pointer.
    pub fn last_pointer(&self) -> Option<u32> {
        return self.pointers.iter().rev().find(|p| **p != 0).copied();
    }

    pub fn is_full(&self) -> bool {
        return self.pointers.iter().all(|p| *p != 0);
    }
}

impl ByteSerializable for PointerBlock {
    type BytesArrayType = [u8; BLOCK_SIZE];

    fn to_bytes(&self) -> Self::BytesArrayType {
        let mut bytes = [0u8; BLOCK_SIZE];

        BigEndian::write_u32_into(&self.pointers, &mut bytes);

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < BLOCK_SIZE {
            return None;
        }

        let mut pointers = [0u32; POINTERS_PER_BLOCK];
        BigEndian::read_u32_into(&bytes[..BLOCK_SIZE], &mut pointers);

        return Some(Self { pointers });
    }
}
