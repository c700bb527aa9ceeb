use crate::disk::Inode;
use crate::utils::join_path;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

/// One object on the host side of an append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEntry {
    File(Vec<u8>),
    /// The names of the directory's children.
    Directory(Vec<String>),
}

/// Where appended files and directories come from.
pub trait HostSource {
    type Error: Debug;

    fn entry(&self, path: &str) -> Result<HostEntry, Self::Error>;

    /// The path of a child of a host directory.
    fn child(&self, directory: &str, name: &str) -> String {
        return join_path(directory, name);
    }
}

/// Where extracted files and directories go. Paths are absolute within the image.
pub trait ExtractSink {
    type Error: Debug;

    fn create_directory(&mut self, path: &str, inode: &Inode) -> Result<(), Self::Error>;

    fn write_file(&mut self, path: &str, contents: &[u8], inode: &Inode) -> Result<(), Self::Error>;
}
