use super::{PointerBlock, Timestamp, BLOCK_SIZE};
use crate::disk::{BlockDevice, FreeBlockList};
use crate::{AppendPolicy, ByteSerializable, CromixError, CromixErrorConvertible, Diagnostic};
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use byteorder::{BigEndian, ByteOrder};
use core::fmt::{Display, Formatter};
use core::ops::Range;
use log::{debug, error, warn};

pub const DIRECT_BLOCKS: usize = 16;
pub const INDIRECT_LEVELS: usize = 3;
const POINTER_SLOTS: usize = 20;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
/// One 4-bit permission mask.
pub struct AccessFlags {
    read: bool,
    execute: bool,
    write: bool,
    append: bool,
    // bits 5 - 8 are unused
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InodeType {
    Unused,
    File,
    Directory,
    CharacterDevice,
    BlockDevice,
    Pipe,
    SharedText,
    Unknown(u8),
}

/// A 128 byte inode record. Inodes are numbered from 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Inode {
    owner: u16,
    group: u16,
    owner_access: AccessFlags,
    group_access: AccessFlags,
    other_access: AccessFlags,
    kind: InodeType,
    links: u8,
    /// Byte length for files, byte extent of the entries for directories
    size: u32,
    /// The inode's own number as recorded in the record
    number: u16,
    parent: u16,
    /// Entry count for directories, major and minor for devices
    dir_count: u16,
    /// Data blocks plus pointer blocks
    used_blocks: u32,
    created: Timestamp,
    modified: Timestamp,
    accessed: Timestamp,
    dumped: Timestamp,
    /// 16 direct pointers then one pointer per indirection level
    blocks: [u32; POINTER_SLOTS],
}

/// The blocks reachable from one inode, collected by [`Inode::data_blocks`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InodeBlocks {
    inode: u16,
    data: Vec<u32>,
    pointers: Vec<u32>,
    diagnostics: Vec<Diagnostic>,
    seen: BTreeSet<u32>,
    /// Data blocks gathered before the first defect
    intact: Option<usize>,
}

impl AccessFlags {
    pub fn new(read: bool, execute: bool, write: bool, append: bool) -> Self {
        return Self {
            read,
            execute,
            write,
            append,
        };
    }

    pub fn from_u8(n: u8) -> Self {
        let read = (n & 1) == 1;
        let execute = ((n >> 1) & 1) == 1;
        let write = ((n >> 2) & 1) == 1;
        let append = ((n >> 3) & 1) == 1;

        return Self::new(read, execute, write, append);
    }

    pub fn to_u8(&self) -> u8 {
        let mut res = 0b0000_0000;

        if self.read {
            res |= 1;
        }

        if self.execute {
            res |= 1 << 1;
        }

        if self.write {
            res |= 1 << 2;
        }

        if self.append {
            res |= 1 << 3;
        }

        return res;
    }
}

impl Display for AccessFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };

        return write!(
            f,
            "{}{}{}{}",
            flag(self.read, 'r'),
            flag(self.execute, 'e'),
            flag(self.write, 'w'),
            flag(self.append, 'a')
        );
    }
}

impl InodeType {
    pub fn from_u8(n: u8) -> Self {
        return match n {
            0x00 => InodeType::Unused,
            0x80 => InodeType::File,
            0x81 => InodeType::Directory,
            0x82 => InodeType::CharacterDevice,
            0x83 => InodeType::BlockDevice,
            0x84 => InodeType::Pipe,
            0x85 => InodeType::SharedText,
            other => InodeType::Unknown(other),
        };
    }

    pub fn to_u8(&self) -> u8 {
        return match self {
            InodeType::Unused => 0x00,
            InodeType::File => 0x80,
            InodeType::Directory => 0x81,
            InodeType::CharacterDevice => 0x82,
            InodeType::BlockDevice => 0x83,
            InodeType::Pipe => 0x84,
            InodeType::SharedText => 0x85,
            InodeType::Unknown(n) => *n,
        };
    }

    /// The character used for this type in listings.
    pub fn type_char(&self) -> char {
        return match self {
            InodeType::Unused => ' ',
            InodeType::File => '-',
            InodeType::Directory => 'd',
            InodeType::CharacterDevice => 'c',
            InodeType::BlockDevice => 'b',
            InodeType::Pipe => 'p',
            InodeType::SharedText => 's',
            InodeType::Unknown(_) => '?',
        };
    }
}

impl Inode {
    pub const SIZE: usize = 0x80;

    pub fn new(
        number: u16,
        kind: InodeType,
        parent: u16,
        policy: &AppendPolicy,
        now: Timestamp,
    ) -> Self {
        return Self {
            owner: policy.owner,
            group: policy.group,
            owner_access: policy.owner_access,
            group_access: policy.group_access,
            other_access: policy.other_access,
            kind,
            links: 1,
            size: 0,
            number,
            parent,
            dir_count: 0,
            used_blocks: 0,
            created: now,
            modified: now,
            accessed: now,
            dumped: Timestamp::default(),
            blocks: [0u32; POINTER_SLOTS],
        };
    }

    /// A zeroed record, as found in a freshly made inode table.
    pub fn unused() -> Self {
        return Self {
            owner: 0,
            group: 0,
            owner_access: AccessFlags::default(),
            group_access: AccessFlags::default(),
            other_access: AccessFlags::default(),
            kind: InodeType::Unused,
            links: 0,
            size: 0,
            number: 0,
            parent: 0,
            dir_count: 0,
            used_blocks: 0,
            created: Timestamp::default(),
            modified: Timestamp::default(),
            accessed: Timestamp::default(),
            dumped: Timestamp::default(),
            blocks: [0u32; POINTER_SLOTS],
        };
    }

    #[inline]
    pub fn kind(&self) -> InodeType {
        return self.kind;
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        return self.kind != InodeType::Unused;
    }

    #[inline]
    pub fn is_directory(&self) -> bool {
        return self.kind == InodeType::Directory;
    }

    #[inline]
    pub fn is_device(&self) -> bool {
        return self.kind == InodeType::CharacterDevice || self.kind == InodeType::BlockDevice;
    }

    pub fn owner(&self) -> u16 {
        return self.owner;
    }

    pub fn group(&self) -> u16 {
        return self.group;
    }

    pub fn owner_access(&self) -> AccessFlags {
        return self.owner_access;
    }

    pub fn group_access(&self) -> AccessFlags {
        return self.group_access;
    }

    pub fn other_access(&self) -> AccessFlags {
        return self.other_access;
    }

    pub fn links(&self) -> u8 {
        return self.links;
    }

    pub fn size(&self) -> u32 {
        return self.size;
    }

    pub fn number(&self) -> u16 {
        return self.number;
    }

    pub fn parent(&self) -> u16 {
        return self.parent;
    }

    pub fn dir_count(&self) -> u16 {
        return self.dir_count;
    }

    pub fn major(&self) -> u8 {
        return (self.dir_count >> 8) as u8;
    }

    pub fn minor(&self) -> u8 {
        return (self.dir_count & 0xff) as u8;
    }

    pub fn used_blocks(&self) -> u32 {
        return self.used_blocks;
    }

    pub fn created(&self) -> Timestamp {
        return self.created;
    }

    pub fn modified(&self) -> Timestamp {
        return self.modified;
    }

    pub fn accessed(&self) -> Timestamp {
        return self.accessed;
    }

    pub fn dumped(&self) -> Timestamp {
        return self.dumped;
    }

    pub fn block_pointers(&self) -> &[u32] {
        return &self.blocks;
    }

    pub fn set_kind(&mut self, kind: InodeType) {
        self.kind = kind;
    }

    pub fn set_links(&mut self, links: u8) {
        self.links = links;
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    pub fn set_number(&mut self, number: u16) {
        self.number = number;
    }

    pub fn set_parent(&mut self, parent: u16) {
        self.parent = parent;
    }

    pub fn set_dir_count(&mut self, count: u16) {
        self.dir_count = count;
    }

    pub fn set_device(&mut self, major: u8, minor: u8) {
        self.dir_count = ((major as u16) << 8) | minor as u16;
    }

    pub fn set_used_blocks(&mut self, count: u32) {
        self.used_blocks = count;
    }

    pub fn set_modified(&mut self, time: Timestamp) {
        self.modified = time;
    }

    pub fn set_accessed(&mut self, time: Timestamp) {
        self.accessed = time;
    }

    /// Overwrites one pointer slot. Slots 16, 17 and 18 are the indirection levels.
    pub fn set_block_pointer(&mut self, slot: usize, block: u32) {
        self.blocks[slot] = block;
    }

    /// Appends a data block. The direct slots are filled first, then the single, double and
    /// triple indirect trees. Pointer blocks are taken from the free list as they are needed.
    pub fn add_block<E: CromixErrorConvertible>(
        &mut self,
        address: u32,
        free_list: &mut FreeBlockList<'_>,
        device: &mut dyn BlockDevice<E>,
    ) -> Result<(), CromixError<E>> {
        for slot in 0..DIRECT_BLOCKS {
            if self.blocks[slot] == 0 {
                self.blocks[slot] = address;
                self.used_blocks += 1;

                return Ok(());
            }
        }

        for level in 1..=INDIRECT_LEVELS {
            let slot = DIRECT_BLOCKS + level - 1;

            if self.blocks[slot] == 0 {
                self.blocks[slot] = Self::new_pointer_block(free_list, device)?;
                self.used_blocks += 1;
                debug!(
                    "inode {}: level {} pointer block {}",
                    self.number, level, self.blocks[slot]
                );
            }

            let mut allocated = 0;

            if Self::append_pointer(
                self.blocks[slot],
                level,
                address,
                free_list,
                device,
                &mut allocated,
            )? {
                self.used_blocks += 1 + allocated;

                return Ok(());
            }
        }

        return Err(CromixError::FileTooLarge);
    }

    /// Appends to a pointer tree of the given depth. Returns false when the tree is full.
    fn append_pointer<E: CromixErrorConvertible>(
        block: u32,
        depth: usize,
        address: u32,
        free_list: &mut FreeBlockList<'_>,
        device: &mut dyn BlockDevice<E>,
        allocated: &mut u32,
    ) -> Result<bool, CromixError<E>> {
        let mut pointers = Self::read_pointer_block(block, device)?;

        if depth == 1 {
            if !pointers.add_pointer(address) {
                return Ok(false);
            }
        } else {
            if let Some(child) = pointers.last_pointer() {
                if Self::append_pointer(child, depth - 1, address, free_list, device, allocated)? {
                    return Ok(true);
                }
            }

            if pointers.is_full() {
                return Ok(false);
            }

            let child = Self::new_pointer_block(free_list, device)?;
            *allocated += 1;

            if !Self::append_pointer(child, depth - 1, address, free_list, device, allocated)? {
                return Err(CromixError::StructuralCorruption(child));
            }

            pointers.add_pointer(child);
        }

        match device.write_block(block, &pointers.to_bytes()) {
            Ok(_) => (),
            Err(e) => return Err(e.into_cromix_error()),
        }

        return Ok(true);
    }

    fn read_pointer_block<E: CromixErrorConvertible>(
        block: u32,
        device: &dyn BlockDevice<E>,
    ) -> Result<PointerBlock, CromixError<E>> {
        let bytes = match device.read_block(block) {
            Ok(b) => b,
            Err(e) => return Err(e.into_cromix_error()),
        };

        return match PointerBlock::from_bytes(&bytes) {
            Some(p) => Ok(p),
            None => Err(CromixError::StructuralCorruption(block)),
        };
    }

    fn new_pointer_block<E: CromixErrorConvertible>(
        free_list: &mut FreeBlockList<'_>,
        device: &mut dyn BlockDevice<E>,
    ) -> Result<u32, CromixError<E>> {
        let block = free_list.allocate(device)?;

        match device.write_block(block, &[0u8; BLOCK_SIZE]) {
            Ok(_) => (),
            Err(e) => return Err(e.into_cromix_error()),
        }

        return Ok(block);
    }

    /// Enumerates every block this inode references, direct blocks first and then each
    /// indirection level in address order. A pointer seen twice or lying outside the data area
    /// is recorded as a defect and not followed. Device failures are recorded the same way.
    pub fn data_blocks<E: CromixErrorConvertible>(
        &self,
        inode: u16,
        data_area: &Range<u32>,
        device: &dyn BlockDevice<E>,
    ) -> InodeBlocks {
        let mut walk = InodeBlocks::new(inode);

        for slot in 0..DIRECT_BLOCKS {
            if self.blocks[slot] != 0 {
                walk.visit_data(self.blocks[slot], data_area);
            }
        }

        for level in 1..=INDIRECT_LEVELS {
            let block = self.blocks[DIRECT_BLOCKS + level - 1];

            if block != 0 {
                walk.visit_pointer(block, level, data_area, device);
            }
        }

        return walk;
    }
}

impl InodeBlocks {
    fn new(inode: u16) -> Self {
        return Self {
            inode,
            data: Vec::new(),
            pointers: Vec::new(),
            diagnostics: Vec::new(),
            seen: BTreeSet::new(),
            intact: None,
        };
    }

    /// Data blocks in logical order.
    pub fn data(&self) -> &[u32] {
        return &self.data;
    }

    /// The leading data blocks that sit at their true logical position. Everything after the
    /// first skipped pointer would be shifted, so it is left out.
    pub fn intact_data(&self) -> &[u32] {
        return match self.intact {
            Some(n) => &self.data[..n],
            None => &self.data,
        };
    }

    /// Pointer blocks of every indirection level.
    pub fn pointers(&self) -> &[u32] {
        return &self.pointers;
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        return &self.diagnostics;
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        return self.diagnostics;
    }

    /// Whether every pointer could be followed.
    pub fn is_complete(&self) -> bool {
        return self.diagnostics.is_empty();
    }

    /// Data and pointer blocks together.
    pub fn total(&self) -> u32 {
        return (self.data.len() + self.pointers.len()) as u32;
    }

    fn defect(&mut self, diagnostic: Diagnostic) {
        if self.intact.is_none() {
            self.intact = Some(self.data.len());
        }

        self.diagnostics.push(diagnostic);
    }

    fn accept(&mut self, block: u32, data_area: &Range<u32>) -> bool {
        if !data_area.contains(&block) {
            warn!("inode {}: block {} out of range", self.inode, block);
            self.defect(Diagnostic::BlockOutOfRange {
                inode: self.inode,
                block,
            });

            return false;
        }

        if !self.seen.insert(block) {
            warn!("inode {}: block {} referenced twice", self.inode, block);
            self.defect(Diagnostic::StructuralCorruption {
                inode: self.inode,
                block,
            });

            return false;
        }

        return true;
    }

    fn visit_data(&mut self, block: u32, data_area: &Range<u32>) {
        if self.accept(block, data_area) {
            self.data.push(block);
        }
    }

    fn visit_pointer<E: CromixErrorConvertible>(
        &mut self,
        block: u32,
        depth: usize,
        data_area: &Range<u32>,
        device: &dyn BlockDevice<E>,
    ) {
        if !self.accept(block, data_area) {
            return;
        }

        self.pointers.push(block);

        let bytes = match device.read_block(block) {
            Ok(b) => b,
            Err(e) => {
                error!("inode {}: reading pointer block {}: {:?}", self.inode, block, e);
                self.defect(Diagnostic::BlockUnavailable {
                    block,
                    inode: Some(self.inode),
                });

                return;
            }
        };

        let pointers = match PointerBlock::from_bytes(&bytes) {
            Some(p) => p,
            None => {
                self.defect(Diagnostic::BlockUnavailable {
                    block,
                    inode: Some(self.inode),
                });

                return;
            }
        };

        for pointer in pointers.pointers().iter().filter(|p| **p != 0) {
            if depth == 1 {
                self.visit_data(*pointer, data_area);
            } else {
                self.visit_pointer(*pointer, depth - 1, data_area, device);
            }
        }
    }
}

impl ByteSerializable for Inode {
    type BytesArrayType = [u8; Inode::SIZE];

    fn to_bytes(&self) -> Self::BytesArrayType {
        let mut bytes = [0u8; Inode::SIZE];

        BigEndian::write_u16(&mut bytes[0x00..], self.owner);
        BigEndian::write_u16(&mut bytes[0x02..], self.group);
        bytes[0x04] = self.owner_access.to_u8();
        bytes[0x05] = self.group_access.to_u8();
        bytes[0x06] = self.other_access.to_u8();
        bytes[0x07] = self.kind.to_u8();
        bytes[0x08] = self.links;
        BigEndian::write_u32(&mut bytes[0x0a..], self.size);
        BigEndian::write_u16(&mut bytes[0x0e..], self.number);
        BigEndian::write_u16(&mut bytes[0x10..], self.parent);
        BigEndian::write_u16(&mut bytes[0x12..], self.dir_count);
        BigEndian::write_u32(&mut bytes[0x14..], self.used_blocks);
        bytes[0x18..0x1e].copy_from_slice(&self.created.raw());
        bytes[0x1e..0x24].copy_from_slice(&self.modified.raw());
        bytes[0x24..0x2a].copy_from_slice(&self.accessed.raw());
        bytes[0x2a..0x30].copy_from_slice(&self.dumped.raw());
        BigEndian::write_u32_into(&self.blocks, &mut bytes[0x30..]);

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Inode::SIZE {
            return None;
        }

        let mut blocks = [0u32; POINTER_SLOTS];
        BigEndian::read_u32_into(&bytes[0x30..Inode::SIZE], &mut blocks);

        return Some(Self {
            owner: BigEndian::read_u16(&bytes[0x00..]),
            group: BigEndian::read_u16(&bytes[0x02..]),
            owner_access: AccessFlags::from_u8(bytes[0x04]),
            group_access: AccessFlags::from_u8(bytes[0x05]),
            other_access: AccessFlags::from_u8(bytes[0x06]),
            kind: InodeType::from_u8(bytes[0x07]),
            links: bytes[0x08],
            size: BigEndian::read_u32(&bytes[0x0a..]),
            number: BigEndian::read_u16(&bytes[0x0e..]),
            parent: BigEndian::read_u16(&bytes[0x10..]),
            dir_count: BigEndian::read_u16(&bytes[0x12..]),
            used_blocks: BigEndian::read_u32(&bytes[0x14..]),
            created: Timestamp::from_raw(&bytes[0x18..]),
            modified: Timestamp::from_raw(&bytes[0x1e..]),
            accessed: Timestamp::from_raw(&bytes[0x24..]),
            dumped: Timestamp::from_raw(&bytes[0x2a..]),
            blocks,
        });
    }
}
