use crate::disk::check::check;
use crate::disk::{
    BlockDevice, CheckReport, DirectoryBlock, DirectoryEntry, ExtractSink, FilesystemInfo,
    FreeBlockList, Geometry, HostEntry, HostSource, Inode, InodeManager, InodeType, SuperBlock,
    Timestamp, BLOCK_SIZE,
};
use crate::utils::{join_path, path_components};
use crate::{
    AppendPolicy, ByteSerializable, CromixError, CromixErrorConvertible, Diagnostic, OSManager,
};
use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};
use log::{debug, error, info, warn};

/// The root directory is always inode 1 and is its own parent.
pub const ROOT_INODE: u16 = 1;

macro_rules! unwrap_error_cromix_convertible {
    ($v:expr) => {
        match $v {
            Ok(val) => val,
            Err(e) => return Err(e.into_cromix_error()),
        }
    };
}

/// One line of a recursive listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub path: String,
    pub number: u16,
    pub inode: Inode,
}

impl Display for ListEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let inode = &self.inode;

        // Directories show their entry count, devices their major and minor numbers.
        let size = match inode.kind() {
            InodeType::Directory => inode.dir_count().to_string(),
            InodeType::CharacterDevice | InodeType::BlockDevice => {
                format!("{},{}", inode.major(), inode.minor())
            }
            _ => inode.size().to_string(),
        };

        return write!(
            f,
            "{} {:>3} {} {} {} {:>5} {:>5} {:>9} {} {}",
            inode.kind().type_char(),
            inode.links(),
            inode.owner_access(),
            inode.group_access(),
            inode.other_access(),
            inode.owner(),
            inode.group(),
            size,
            inode.modified(),
            self.path
        );
    }
}

/// A recursive listing of the whole tree in directory slot order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<ListEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Display for Listing {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }

        return Ok(());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub directories: u32,
    pub files: u32,
    pub bytes: u64,
    pub diagnostics: Vec<Diagnostic>,
}

impl Display for ExtractReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(
            f,
            "Extracted {} directories and {} files ({} bytes).",
            self.directories, self.files, self.bytes
        )?;

        for d in &self.diagnostics {
            writeln!(f, "  {}", d)?;
        }

        return Ok(());
    }
}

/// Where a directory entry was found.
struct EntryLocation {
    inode: u16,
}

/// A mounted CROMIX filesystem. The super-block and inode table are held in memory and written
/// through to the device as they change.
pub struct FileSystem<'a, 'b, E: CromixErrorConvertible> {
    device: &'a mut dyn BlockDevice<E>,
    manager: &'b mut dyn OSManager,

    super_block: SuperBlock,
    inodes: InodeManager,

    policy: AppendPolicy,
}

impl<'a, 'b, E: CromixErrorConvertible> FileSystem<'a, 'b, E> {
    /// Reads the super-block and the inode table of an existing filesystem.
    pub fn mount(
        device: &'a mut dyn BlockDevice<E>,
        manager: &'b mut dyn OSManager,
    ) -> Result<Self, CromixError<E>> {
        let bytes = unwrap_error_cromix_convertible!(device.super_block());

        let super_block = match SuperBlock::from_bytes(&bytes) {
            Some(sb) if sb.validate() => sb,
            _ => return Err(CromixError::InvalidFilesystem),
        };

        if super_block.block_size() as usize != BLOCK_SIZE {
            return Err(CromixError::InvalidBlockSize);
        }

        // The declared layout has to fit on the device it was read from.
        if super_block.block_count() > device.block_count()
            || super_block.first_data_block() > super_block.block_count()
        {
            error!(
                "super-block declares {} blocks with data from block {}, device holds {}",
                super_block.block_count(),
                super_block.first_data_block(),
                device.block_count()
            );
            return Err(CromixError::InvalidFilesystem);
        }

        let inodes = InodeManager::load(&super_block, &*device)?;

        info!(
            "mounted {} image: {} blocks, {} inodes, version {}.{}",
            device.format_label(),
            super_block.block_count(),
            super_block.inode_count(),
            super_block.version().0,
            super_block.version().1
        );

        return Ok(Self {
            device,
            manager,
            super_block,
            inodes,
            policy: AppendPolicy::default(),
        });
    }

    /// Lays out an empty filesystem of the named geometry: a fresh super-block, a zeroed inode
    /// table, every data block on the free chain and a root directory holding one empty block.
    pub fn initialise(
        device: &'a mut dyn BlockDevice<E>,
        manager: &'b mut dyn OSManager,
        label: &str,
    ) -> Result<Self, CromixError<E>> {
        let geometry = match Geometry::from_label(label) {
            Some(g) => g,
            None => return Err(CromixError::UnknownGeometry(label.to_string())),
        };

        if device.block_count() < geometry.block_count() {
            return Err(CromixError::DeviceTooSmall);
        }

        let now = Timestamp::from_datetime(manager.current_time());
        let super_block = SuperBlock::initialise(&geometry, now);
        let inodes = InodeManager::empty(&super_block);

        let mut fs = Self {
            device,
            manager,
            super_block,
            inodes,
            policy: AppendPolicy::default(),
        };

        fs.inodes.flush_all(&mut *fs.device)?;

        // Released highest first so allocation hands out the lowest blocks first.
        let data_area = fs.super_block.data_area();
        {
            let mut free_list = FreeBlockList::new(&mut fs.super_block);

            for block in data_area.rev() {
                free_list.release(block, &mut *fs.device)?;
            }
        }

        let root_block = FreeBlockList::new(&mut fs.super_block).allocate(&*fs.device)?;
        unwrap_error_cromix_convertible!(fs
            .device
            .write_block(root_block, &DirectoryBlock::empty().to_bytes()));

        let mut root = Inode::new(
            ROOT_INODE,
            InodeType::Directory,
            ROOT_INODE,
            &fs.policy,
            now,
        );
        {
            let mut free_list = FreeBlockList::new(&mut fs.super_block);
            root.add_block(root_block, &mut free_list, &mut *fs.device)?;
        }

        match fs.inodes.get_mut(ROOT_INODE) {
            Some(inode) => *inode = root,
            None => return Err(CromixError::InodeOutOfBounds(ROOT_INODE)),
        }

        fs.inodes.refill_free_inodes(&mut fs.super_block);
        fs.inodes.flush(ROOT_INODE, &mut *fs.device)?;
        fs.flush_super_block()?;

        info!(
            "initialised {} ({}): {} data blocks from block {}",
            geometry.label(),
            geometry.description(),
            fs.super_block.data_block_count(),
            fs.super_block.first_data_block()
        );

        return Ok(fs);
    }

    pub fn super_block(&self) -> &SuperBlock {
        return &self.super_block;
    }

    pub fn inodes(&self) -> &InodeManager {
        return &self.inodes;
    }

    pub fn inode(&self, number: u16) -> Result<&Inode, CromixError<E>> {
        return match self.inodes.get(number) {
            Some(inode) => Ok(inode),
            None => Err(CromixError::InodeOutOfBounds(number)),
        };
    }

    /// Replaces an inode and writes it through to the device.
    pub fn update_inode(&mut self, number: u16, inode: Inode) -> Result<(), CromixError<E>> {
        match self.inodes.get_mut(number) {
            Some(i) => *i = inode,
            None => return Err(CromixError::InodeOutOfBounds(number)),
        }

        return self.inodes.flush(number, &mut *self.device);
    }

    /// Ownership and permissions given to everything appended from now on.
    pub fn set_policy(&mut self, policy: AppendPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> &AppendPolicy {
        return &self.policy;
    }

    pub fn flush_super_block(&mut self) -> Result<(), CromixError<E>> {
        unwrap_error_cromix_convertible!(self
            .device
            .flush_super_block(&self.super_block.to_bytes()));

        return Ok(());
    }

    /// Asks the device to write the whole media out to its backing store.
    pub fn persist(&mut self) -> Result<(), CromixError<E>> {
        self.flush_super_block()?;
        unwrap_error_cromix_convertible!(self.device.persist());

        debug!("persisted {} image", self.device.format_label());

        return Ok(());
    }

    /// The number of blocks on the free chain.
    pub fn total_free(&self) -> u32 {
        return FreeBlockList::count_chain(
            &self.super_block.free_blocks,
            &self.super_block.data_area(),
            &*self.device,
        );
    }

    pub fn info(&self) -> FilesystemInfo {
        let free_inodes = self
            .inodes
            .iter()
            .filter(|(_, inode)| !inode.is_allocated())
            .count() as u32;

        return FilesystemInfo {
            format_label: self.device.format_label(),
            version: self.super_block.version(),
            block_size: self.super_block.block_size(),
            block_count: self.super_block.block_count(),
            inode_count: self.super_block.inode_count(),
            first_inode_block: self.super_block.first_inode_block(),
            first_data_block: self.super_block.first_data_block(),
            data_block_count: self.super_block.data_block_count(),
            free_blocks: self.total_free(),
            free_inodes,
            last_modified: self.super_block.last_modified,
        };
    }

    /// Runs both sweeps of the consistency check. The media is never modified.
    pub fn check(&self) -> CheckReport {
        return check(&self.super_block, &self.inodes, &*self.device);
    }

    /// Resolves an absolute path to an inode number. Names match case-insensitively.
    pub fn lookup(&self, path: &str) -> Result<u16, CromixError<E>> {
        let mut current = ROOT_INODE;

        for name in path_components(path) {
            if !self.inode(current)?.is_directory() {
                return Err(CromixError::NotADirectory(path.to_string()));
            }

            current = match self.find_entry(current, name)? {
                Some(location) => location.inode,
                None => return Err(CromixError::InodeNotFound(path.to_string())),
            };
        }

        return Ok(current);
    }

    /// The contents of a file, truncated to its recorded size. Any defect in the block walk or
    /// unreadable block fails the whole read.
    pub fn read_file(&self, number: u16) -> Result<Vec<u8>, CromixError<E>> {
        let inode = *self.inode(number)?;
        let walk = inode.data_blocks(number, &self.super_block.data_area(), &*self.device);

        if let Some(d) = walk.diagnostics().first() {
            return Err(self.walk_error(d));
        }

        let mut contents = Vec::with_capacity(walk.data().len() * BLOCK_SIZE);

        for block in walk.data() {
            contents.extend(unwrap_error_cromix_convertible!(self.device.read_block(*block)));
        }

        contents.truncate(inode.size() as usize);

        return Ok(contents);
    }

    pub fn read_path(&self, path: &str) -> Result<Vec<u8>, CromixError<E>> {
        let number = self.lookup(path)?;

        if self.inode(number)?.is_directory() {
            return Err(CromixError::IsADirectory(path.to_string()));
        }

        return self.read_file(number);
    }

    /// The allocated entries of a directory in slot order. Blocks that cannot be read are
    /// skipped and reported.
    pub fn directory_entries(&self, directory: u16) -> (Vec<DirectoryEntry>, Vec<Diagnostic>) {
        let inode = match self.inodes.get(directory) {
            Some(i) => i,
            None => return (Vec::new(), Vec::new()),
        };

        let walk = inode.data_blocks(directory, &self.super_block.data_area(), &*self.device);
        let mut entries = Vec::new();
        let mut diagnostics = Vec::new();

        for block in walk.data() {
            match self.read_directory_block(*block) {
                Ok(dir_block) => {
                    entries.extend(dir_block.allocated_entries().map(|(_, entry)| *entry))
                }
                Err(_) => {
                    error!("directory {}: block {} unreadable", directory, block);
                    diagnostics.push(Diagnostic::BlockUnavailable {
                        block: *block,
                        inode: Some(directory),
                    });
                }
            }
        }

        diagnostics.append(&mut walk.into_diagnostics());

        return (entries, diagnostics);
    }

    /// Lists the whole tree depth first. A directory reachable twice is only descended once.
    pub fn list(&self) -> Listing {
        let mut listing = Listing::default();
        let mut visited = BTreeSet::new();
        visited.insert(ROOT_INODE);

        self.list_directory(ROOT_INODE, "/", &mut listing, &mut visited);

        return listing;
    }

    fn list_directory(
        &self,
        directory: u16,
        path: &str,
        listing: &mut Listing,
        visited: &mut BTreeSet<u16>,
    ) {
        let (entries, mut diagnostics) = self.directory_entries(directory);
        listing.diagnostics.append(&mut diagnostics);

        for entry in entries {
            let number = entry.inode();

            let inode = match self.inodes.get(number) {
                Some(i) => *i,
                None => {
                    warn!("{}: entry {} names inode {}", path, entry.name(), number);
                    listing.diagnostics.push(Diagnostic::InodeOutOfBounds {
                        directory,
                        name: entry.name(),
                        inode: number,
                    });
                    continue;
                }
            };

            let child_path = join_path(path, &entry.name());

            listing.entries.push(ListEntry {
                path: child_path.clone(),
                number,
                inode,
            });

            if inode.is_directory() && visited.insert(number) {
                self.list_directory(number, &child_path, listing, visited);
            }
        }
    }

    /// Copies a file or a whole subtree out to the sink. Damaged files are salvaged as far as
    /// they can be read, device nodes are skipped, and nothing short of a missing start path
    /// stops the extraction.
    pub fn extract<S: ExtractSink>(
        &self,
        path: &str,
        sink: &mut S,
    ) -> Result<ExtractReport, CromixError<E>> {
        let number = self.lookup(path)?;
        let inode = *self.inode(number)?;
        let mut report = ExtractReport::default();

        if inode.is_directory() {
            let path = join_path("/", path.trim_start_matches('/'));

            match sink.create_directory(&path, &inode) {
                Ok(_) => report.directories += 1,
                Err(e) => {
                    report.diagnostics.push(Self::write_failed(&path, e));
                    return Ok(report);
                }
            }

            let mut visited = BTreeSet::new();
            visited.insert(number);

            self.extract_directory(number, &path, sink, &mut report, &mut visited);
        } else {
            self.extract_entry(number, &inode, path, sink, &mut report, &mut BTreeSet::new());
        }

        info!(
            "extracted {} directories, {} files, {} bytes with {} defects",
            report.directories,
            report.files,
            report.bytes,
            report.diagnostics.len()
        );

        return Ok(report);
    }

    fn extract_directory<S: ExtractSink>(
        &self,
        directory: u16,
        path: &str,
        sink: &mut S,
        report: &mut ExtractReport,
        visited: &mut BTreeSet<u16>,
    ) {
        let (entries, mut diagnostics) = self.directory_entries(directory);
        report.diagnostics.append(&mut diagnostics);

        for entry in entries {
            let number = entry.inode();

            let inode = match self.inodes.get(number) {
                Some(i) => *i,
                None => {
                    report.diagnostics.push(Diagnostic::InodeOutOfBounds {
                        directory,
                        name: entry.name(),
                        inode: number,
                    });
                    continue;
                }
            };

            let child_path = join_path(path, &entry.name());
            self.extract_entry(number, &inode, &child_path, sink, report, visited);
        }
    }

    fn extract_entry<S: ExtractSink>(
        &self,
        number: u16,
        inode: &Inode,
        path: &str,
        sink: &mut S,
        report: &mut ExtractReport,
        visited: &mut BTreeSet<u16>,
    ) {
        match inode.kind() {
            InodeType::Directory => {
                if !visited.insert(number) {
                    warn!("{}: directory {} already extracted", path, number);
                    return;
                }

                match sink.create_directory(path, inode) {
                    Ok(_) => report.directories += 1,
                    Err(e) => {
                        report.diagnostics.push(Self::write_failed(path, e));
                        return;
                    }
                }

                self.extract_directory(number, path, sink, report, visited);
            }
            InodeType::File | InodeType::SharedText => {
                let (contents, mut diagnostics) = self.salvage_file(number, inode, path);
                report.diagnostics.append(&mut diagnostics);

                match sink.write_file(path, &contents, inode) {
                    Ok(_) => {
                        report.files += 1;
                        report.bytes += contents.len() as u64;
                    }
                    Err(e) => report.diagnostics.push(Self::write_failed(path, e)),
                }
            }
            kind => debug!("{}: skipping {:?} inode {}", path, kind, number),
        }
    }

    /// Reads as much of a file as the device allows, stopping at the first unreadable block.
    fn salvage_file(&self, number: u16, inode: &Inode, path: &str) -> (Vec<u8>, Vec<Diagnostic>) {
        let walk = inode.data_blocks(number, &self.super_block.data_area(), &*self.device);
        let mut diagnostics = walk.diagnostics().to_vec();
        let mut contents = Vec::with_capacity(walk.intact_data().len() * BLOCK_SIZE);

        for block in walk.intact_data() {
            match self.device.read_block(*block) {
                Ok(bytes) => contents.extend(bytes),
                Err(e) => {
                    error!("{}: block {} unreadable: {:?}", path, block, e);
                    diagnostics.push(Diagnostic::BlockUnavailable {
                        block: *block,
                        inode: Some(number),
                    });
                    break;
                }
            }
        }

        contents.truncate(inode.size() as usize);

        if (contents.len() as u64) < inode.size() as u64 {
            warn!(
                "{}: salvaged {} of {} bytes",
                path,
                contents.len(),
                inode.size()
            );
            diagnostics.push(Diagnostic::PartialExtract {
                path: path.to_string(),
                salvaged: contents.len() as u64,
                expected: inode.size() as u64,
            });
        }

        return (contents, diagnostics);
    }

    fn write_failed<D: core::fmt::Debug>(path: &str, e: D) -> Diagnostic {
        let message = format!("{:?}", e);
        error!("{}: {}", path, message);

        return Diagnostic::HostWriteFailed {
            path: path.to_string(),
            message,
        };
    }

    /// Copies a host file or directory tree into the directory at `target` under `name`.
    /// Returns the inode number of the new entry.
    pub fn append<S: HostSource>(
        &mut self,
        source: &S,
        host_path: &str,
        target: &str,
        name: &str,
    ) -> Result<u16, CromixError<E>> {
        let directory = self.lookup(target)?;

        if !self.inode(directory)?.is_directory() {
            return Err(CromixError::NotADirectory(target.to_string()));
        }

        let number = self.append_entry(source, host_path, directory, name)?;
        self.flush_super_block()?;

        return Ok(number);
    }

    fn append_entry<S: HostSource>(
        &mut self,
        source: &S,
        host_path: &str,
        directory: u16,
        name: &str,
    ) -> Result<u16, CromixError<E>> {
        let entry = match source.entry(host_path) {
            Ok(e) => e,
            Err(e) => return Err(CromixError::HostError(format!("{}: {:?}", host_path, e))),
        };

        return match entry {
            HostEntry::File(contents) => self.create_file(directory, name, &contents),
            HostEntry::Directory(children) => {
                let number = self.create_directory(directory, name)?;

                for child in children.iter() {
                    if !DirectoryEntry::is_valid_name(child) {
                        warn!("{}: skipping {}, name cannot be stored", host_path, child);
                        continue;
                    }

                    let child_path = source.child(host_path, child);
                    self.append_entry(source, &child_path, number, child)?;
                }

                Ok(number)
            }
        };
    }

    /// Creates a regular file in a directory and writes its contents.
    pub fn create_file(
        &mut self,
        directory: u16,
        name: &str,
        contents: &[u8],
    ) -> Result<u16, CromixError<E>> {
        if contents.len() > u32::MAX as usize {
            return Err(CromixError::FileTooLarge);
        }

        let number = self.add_entry(directory, name, InodeType::File)?;

        for chunk in contents.chunks(BLOCK_SIZE) {
            let block = FreeBlockList::new(&mut self.super_block).allocate(&*self.device)?;

            let mut bytes = [0u8; BLOCK_SIZE];
            bytes[..chunk.len()].copy_from_slice(chunk);
            unwrap_error_cromix_convertible!(self.device.write_block(block, &bytes));

            let inode = match self.inodes.get_mut(number) {
                Some(i) => i,
                None => return Err(CromixError::InodeOutOfBounds(number)),
            };

            let mut free_list = FreeBlockList::new(&mut self.super_block);
            inode.add_block(block, &mut free_list, &mut *self.device)?;
        }

        match self.inodes.get_mut(number) {
            Some(inode) => inode.set_size(contents.len() as u32),
            None => return Err(CromixError::InodeOutOfBounds(number)),
        }

        self.inodes.flush(number, &mut *self.device)?;
        self.flush_super_block()?;

        info!("{}: {} bytes written to inode {}", name, contents.len(), number);

        return Ok(number);
    }

    /// Creates an empty directory. It holds no blocks until its first entry is added.
    pub fn create_directory(&mut self, directory: u16, name: &str) -> Result<u16, CromixError<E>> {
        let number = self.add_entry(directory, name, InodeType::Directory)?;
        self.flush_super_block()?;

        info!("{}: directory created at inode {}", name, number);

        return Ok(number);
    }

    /// Takes a free inode, initialises it and links it into a directory. The first unused slot
    /// of the directory is reused before a new block is added.
    fn add_entry(
        &mut self,
        directory: u16,
        name: &str,
        kind: InodeType,
    ) -> Result<u16, CromixError<E>> {
        if !DirectoryEntry::is_valid_name(name) {
            return Err(CromixError::InvalidFileName);
        }

        if !self.inode(directory)?.is_directory() {
            return Err(CromixError::NotADirectory(directory.to_string()));
        }

        if self.find_entry(directory, name)?.is_some() {
            return Err(CromixError::EntryExists(name.to_string()));
        }

        let number = self
            .inodes
            .get_available_inode::<E>(&mut self.super_block)?;
        let now = self.now();

        let (block, index, slot, mut dir_block) = self.free_entry_slot(directory)?;

        let entry = match DirectoryEntry::new(name, number) {
            Some(e) => e,
            None => return Err(CromixError::InvalidFileName),
        };

        match self.inodes.get_mut(number) {
            Some(inode) => *inode = Inode::new(number, kind, directory, &self.policy, now),
            None => return Err(CromixError::InodeOutOfBounds(number)),
        }

        dir_block.set_entry(slot, entry);
        unwrap_error_cromix_convertible!(self.device.write_block(block, &dir_block.to_bytes()));

        match self.inodes.get_mut(directory) {
            Some(parent) => {
                let extent = (index * BLOCK_SIZE) as u32 + dir_block.extent();

                parent.set_dir_count(parent.dir_count() + 1);
                parent.set_size(core::cmp::max(parent.size(), extent));
                parent.set_modified(now);
            }
            None => return Err(CromixError::InodeOutOfBounds(directory)),
        }

        self.inodes.flush(number, &mut *self.device)?;
        self.inodes.flush(directory, &mut *self.device)?;
        self.super_block.last_modified = now;

        debug!(
            "entry {} -> inode {} in directory {} (block {}, slot {})",
            name, number, directory, block, slot
        );

        return Ok(number);
    }

    /// The block, its position in the directory, the slot and the block contents of the first
    /// unused entry. A new zeroed block is appended to the directory when every slot is taken.
    fn free_entry_slot(
        &mut self,
        directory: u16,
    ) -> Result<(u32, usize, usize, DirectoryBlock), CromixError<E>> {
        let dir_inode = *self.inode(directory)?;
        let walk = dir_inode.data_blocks(directory, &self.super_block.data_area(), &*self.device);

        if let Some(d) = walk.diagnostics().first() {
            return Err(self.walk_error(d));
        }

        for (index, block) in walk.data().iter().enumerate() {
            let dir_block = self.read_directory_block(*block)?;

            if let Some(slot) = dir_block.first_unused_entry() {
                return Ok((*block, index, slot, dir_block));
            }
        }

        let block = FreeBlockList::new(&mut self.super_block).allocate(&*self.device)?;
        let dir_block = DirectoryBlock::empty();
        unwrap_error_cromix_convertible!(self.device.write_block(block, &dir_block.to_bytes()));

        let inode = match self.inodes.get_mut(directory) {
            Some(i) => i,
            None => return Err(CromixError::InodeOutOfBounds(directory)),
        };

        let mut free_list = FreeBlockList::new(&mut self.super_block);
        inode.add_block(block, &mut free_list, &mut *self.device)?;

        debug!("directory {} grew by block {}", directory, block);

        return Ok((block, walk.data().len(), 0, dir_block));
    }

    fn find_entry(
        &self,
        directory: u16,
        name: &str,
    ) -> Result<Option<EntryLocation>, CromixError<E>> {
        let inode = self.inode(directory)?;
        let walk = inode.data_blocks(directory, &self.super_block.data_area(), &*self.device);

        if let Some(d) = walk.diagnostics().first() {
            return Err(self.walk_error(d));
        }

        for block in walk.data() {
            let dir_block = self.read_directory_block(*block)?;

            if let Some(slot) = dir_block.find_entry(name) {
                return Ok(Some(EntryLocation {
                    inode: dir_block.entry(slot).inode(),
                }));
            }
        }

        return Ok(None);
    }

    fn read_directory_block(&self, block: u32) -> Result<DirectoryBlock, CromixError<E>> {
        let bytes = unwrap_error_cromix_convertible!(self.device.read_block(block));

        return match DirectoryBlock::from_bytes(&bytes) {
            Some(d) => Ok(d),
            None => Err(CromixError::StructuralCorruption(block)),
        };
    }

    /// Turns the first defect of a block walk into an error. An unreadable block is read once
    /// more so the device's own error is returned.
    fn walk_error(&self, diagnostic: &Diagnostic) -> CromixError<E> {
        return match diagnostic {
            Diagnostic::BlockUnavailable { block, .. } => match self.device.read_block(*block) {
                Err(e) => e.into_cromix_error(),
                Ok(_) => CromixError::StructuralCorruption(*block),
            },
            Diagnostic::StructuralCorruption { block, .. }
            | Diagnostic::BlockOutOfRange { block, .. } => CromixError::StructuralCorruption(*block),
            _ => CromixError::StructuralCorruption(0),
        };
    }

    fn now(&self) -> Timestamp {
        return Timestamp::from_datetime(self.manager.current_time());
    }
}
