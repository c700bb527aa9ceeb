use super::BLOCK_SIZE;
use crate::ByteSerializable;
use byteorder::{BigEndian, ByteOrder};

pub const FREE_RECORD_SLOTS: usize = 80;

/// One link of the free block chain: a count followed by 80 block numbers. Slot 0 holds the
/// address of the next record in the chain, zero in the last record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FreeBlockRecord {
    count: u16,
    blocks: [u32; FREE_RECORD_SLOTS],
}

impl FreeBlockRecord {
    /// A record that ends the chain and holds no free blocks.
    pub fn terminator() -> Self {
        return Self::linked_to(0);
    }

    /// A record holding only the link to the next record.
    pub fn linked_to(next: u32) -> Self {
        let mut blocks = [0u32; FREE_RECORD_SLOTS];
        blocks[0] = next;

        return Self { count: 1, blocks };
    }

    pub fn count(&self) -> u16 {
        return self.count;
    }

    pub fn blocks(&self) -> &[u32] {
        let count = (self.count as usize).min(FREE_RECORD_SLOTS);
        return &self.blocks[..count];
    }

    pub fn is_full(&self) -> bool {
        return self.count as usize >= FREE_RECORD_SLOTS;
    }

    /// Whether the stored count can describe a record.
    pub fn is_valid(&self) -> bool {
        return self.count as usize <= FREE_RECORD_SLOTS;
    }

    pub fn next_record(&self) -> u32 {
        return self.blocks[0];
    }

    /// Returns false when the record is full.
    pub fn push(&mut self, block: u32) -> bool {
        if self.is_full() {
            return false;
        }

        self.blocks[self.count as usize] = block;
        self.count += 1;

        return true;
    }

    pub fn pop(&mut self) -> Option<u32> {
        if self.count == 0 || !self.is_valid() {
            return None;
        }

        self.count -= 1;
        let block = self.blocks[self.count as usize];
        self.blocks[self.count as usize] = 0;

        return Some(block);
    }

    /// The record serialized into a whole block.
    pub fn to_block(&self) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];
        block[..Self::size()].copy_from_slice(&self.to_bytes());

        return block;
    }

    pub const fn size() -> usize {
        return 2 + FREE_RECORD_SLOTS * 4;
    }
}

impl ByteSerializable for FreeBlockRecord {
    type BytesArrayType = [u8; 2 + FREE_RECORD_SLOTS * 4];

    fn to_bytes(&self) -> Self::BytesArrayType {
        let mut bytes = [0u8; 2 + FREE_RECORD_SLOTS * 4];
        let mut offset = 0;

        BigEndian::write_u16(&mut bytes[offset..], self.count);
        offset += 2;

        for block in self.blocks.iter() {
            BigEndian::write_u32(&mut bytes[offset..], *block);
            offset += 4;
        }

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::size() {
            return None;
        }

        let count = BigEndian::read_u16(bytes);
        let mut blocks = [0u32; FREE_RECORD_SLOTS];

        for (i, block) in blocks.iter_mut().enumerate() {
            *block = BigEndian::read_u32(&bytes[2 + i * 4..]);
        }

        return Some(Self { count, blocks });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut record = FreeBlockRecord::terminator();

        assert!(record.push(40));
        assert!(record.push(41));
        assert_eq!(record.count(), 3);
        assert_eq!(record.pop(), Some(41));
        assert_eq!(record.pop(), Some(40));
        assert_eq!(record.pop(), Some(0));
        assert_eq!(record.pop(), None);
    }

    #[test]
    fn test_full() {
        let mut record = FreeBlockRecord::terminator();

        for i in 1..FREE_RECORD_SLOTS as u32 {
            assert!(record.push(100 + i));
        }

        assert!(record.is_full());
        assert!(!record.push(7));
    }

    #[test]
    fn test_to_bytes() {
        let mut record = FreeBlockRecord::terminator();
        record.push(0x01020304);

        let bytes = record.to_bytes();
        assert_eq!(bytes[..2], [0x00, 0x02]);
        assert_eq!(bytes[2..6], [0, 0, 0, 0]);
        assert_eq!(bytes[6..10], [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_from_bytes() {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[1] = 2;
        bytes[5] = 0x33;
        bytes[9] = 0x34;

        let record = FreeBlockRecord::from_bytes(&bytes).unwrap();
        assert_eq!(record.blocks(), &[0x33, 0x34]);
        assert_eq!(record.next_record(), 0x33);
    }
}
