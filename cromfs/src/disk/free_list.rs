use crate::disk::{BlockDevice, FreeBlockRecord, SuperBlock};
use crate::{ByteSerializable, CromixError, CromixErrorConvertible, Diagnostic};
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::ops::Range;
use log::{debug, error, warn};

/// The chained free block allocator. The head record lives in the super-block, every further
/// record occupies the free block its predecessor links to.
pub struct FreeBlockList<'a> {
    head: &'a mut FreeBlockRecord,
    data_area: Range<u32>,
}

impl<'a> FreeBlockList<'a> {
    pub fn new(super_block: &'a mut SuperBlock) -> Self {
        let data_area = super_block.data_area();

        return Self {
            head: &mut super_block.free_blocks,
            data_area,
        };
    }

    /// Takes the last block of the head record. When that empties the head, the block taken is
    /// the next record and its contents become the new head.
    pub fn allocate<E: CromixErrorConvertible>(
        &mut self,
        device: &dyn BlockDevice<E>,
    ) -> Result<u32, CromixError<E>> {
        let block = match self.head.pop() {
            Some(b) => b,
            None => return Err(CromixError::FreeListExhausted),
        };

        if block == 0 {
            self.head.push(0);
            return Err(CromixError::FreeListExhausted);
        }

        if !self.data_area.contains(&block) {
            self.head.push(block);
            return Err(CromixError::StructuralCorruption(block));
        }

        if self.head.count() == 0 {
            let bytes = match device.read_block(block) {
                Ok(b) => b,
                Err(e) => {
                    self.head.push(block);
                    return Err(e.into_cromix_error());
                }
            };

            let record = match FreeBlockRecord::from_bytes(&bytes) {
                Some(r) if r.is_valid() => r,
                _ => {
                    self.head.push(block);
                    return Err(CromixError::StructuralCorruption(block));
                }
            };

            debug!("free list: record {} becomes the head", block);
            *self.head = record;
        }

        debug!("free list: allocated block {}", block);

        return Ok(block);
    }

    /// Returns a block to the list. When the head is full the released block takes the old
    /// head's contents and a new head linking to it is started.
    pub fn release<E: CromixErrorConvertible>(
        &mut self,
        block: u32,
        device: &mut dyn BlockDevice<E>,
    ) -> Result<(), CromixError<E>> {
        if !self.data_area.contains(&block) {
            return Err(CromixError::StructuralCorruption(block));
        }

        if self.head.is_full() {
            match device.write_block(block, &self.head.to_block()) {
                Ok(_) => (),
                Err(e) => return Err(e.into_cromix_error()),
            }

            *self.head = FreeBlockRecord::linked_to(block);
        } else {
            self.head.push(block);
        }

        debug!("free list: released block {}", block);

        return Ok(());
    }

    /// Calls `f` with every free block, chain records included.
    pub fn visit<E: CromixErrorConvertible>(
        &self,
        device: &dyn BlockDevice<E>,
        f: &mut dyn FnMut(u32),
    ) -> Vec<Diagnostic> {
        return Self::visit_chain(self.head, &self.data_area, device, f);
    }

    /// Free blocks in the chain. This is the sum of the record counts less one: the final
    /// record's terminating zero is counted but is not a block.
    pub fn total_free<E: CromixErrorConvertible>(&self, device: &dyn BlockDevice<E>) -> u32 {
        return Self::count_chain(self.head, &self.data_area, device);
    }

    pub fn count_chain<E: CromixErrorConvertible>(
        head: &FreeBlockRecord,
        data_area: &Range<u32>,
        device: &dyn BlockDevice<E>,
    ) -> u32 {
        let mut sum: u32 = 0;
        Self::walk(head, data_area, device, &mut |record: &FreeBlockRecord| {
            sum += record.count() as u32
        });

        // Sum of counts less one for the zero slot ending the chain. A fresh image therefore
        // reports its data block count less the one block the root directory holds.
        return sum.saturating_sub(1);
    }

    pub fn visit_chain<E: CromixErrorConvertible>(
        head: &FreeBlockRecord,
        data_area: &Range<u32>,
        device: &dyn BlockDevice<E>,
        f: &mut dyn FnMut(u32),
    ) -> Vec<Diagnostic> {
        let mut out_of_range = Vec::new();

        let mut diagnostics = Self::walk(head, data_area, device, &mut |record: &FreeBlockRecord| {
            for block in record.blocks().iter().filter(|b| **b != 0) {
                if data_area.contains(block) {
                    f(*block);
                } else {
                    out_of_range.push(*block);
                }
            }
        });

        for block in out_of_range {
            warn!("free list: block {} out of range", block);
            diagnostics.push(Diagnostic::FreeListCorrupt { block });
        }

        return diagnostics;
    }

    /// Follows the chain from the head, calling `f` on each record. Stops at the first record
    /// that cannot be read, lies outside the data area, repeats or has an impossible count.
    fn walk<E: CromixErrorConvertible>(
        head: &FreeBlockRecord,
        data_area: &Range<u32>,
        device: &dyn BlockDevice<E>,
        f: &mut dyn FnMut(&FreeBlockRecord),
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen = BTreeSet::new();
        let mut record = *head;
        let mut address = 0;

        loop {
            if !record.is_valid() {
                warn!("free list: record at {} has count {}", address, record.count());
                diagnostics.push(Diagnostic::FreeListCorrupt { block: address });
                break;
            }

            f(&record);

            let next = record.next_record();

            if next == 0 || !data_area.contains(&next) {
                break;
            }

            if !seen.insert(next) {
                warn!("free list: record {} visited twice", next);
                diagnostics.push(Diagnostic::FreeListCorrupt { block: next });
                break;
            }

            let bytes = match device.read_block(next) {
                Ok(b) => b,
                Err(e) => {
                    error!("free list: reading record {}: {:?}", next, e);
                    diagnostics.push(Diagnostic::BlockUnavailable {
                        block: next,
                        inode: None,
                    });
                    break;
                }
            };

            record = match FreeBlockRecord::from_bytes(&bytes) {
                Some(r) => r,
                None => {
                    diagnostics.push(Diagnostic::FreeListCorrupt { block: next });
                    break;
                }
            };
            address = next;
        }

        return diagnostics;
    }
}
