#![allow(dead_code)]

extern crate cromfs;
use chrono::{DateTime, TimeZone, Utc};
use cromfs::{
    BlockDevice, CromixErrorConvertible, ExtractSink, HostEntry, HostSource, Inode, OSManager,
    BLOCK_SIZE,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, PartialEq)]
pub enum Error {
    Unavailable(u32),
    OutOfRange(u32),
}

impl CromixErrorConvertible for Error {}

pub struct Handler {
    pub disk: Vec<u8>,
    pub unavailable: BTreeSet<u32>,
}

impl Handler {
    pub fn new(blocks: u32) -> Self {
        return Self {
            disk: vec![0u8; blocks as usize * BLOCK_SIZE],
            unavailable: BTreeSet::new(),
        };
    }

    pub fn dump_block(&self, number: u32) -> Vec<u8> {
        let start = number as usize * BLOCK_SIZE;
        return self.disk[start..start + BLOCK_SIZE].to_vec();
    }

    pub fn patch(&mut self, number: u32, offset: usize, bytes: &[u8]) {
        let start = number as usize * BLOCK_SIZE + offset;
        self.disk[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl BlockDevice<Error> for Handler {
    fn super_block(&self) -> Result<Vec<u8>, Error> {
        return self.read_block(1);
    }

    fn read_block(&self, number: u32) -> Result<Vec<u8>, Error> {
        if self.unavailable.contains(&number) {
            return Err(Error::Unavailable(number));
        }

        if number >= self.block_count() {
            return Err(Error::OutOfRange(number));
        }

        return Ok(self.dump_block(number));
    }

    fn write_block(&mut self, number: u32, bytes: &[u8]) -> Result<(), Error> {
        if number >= self.block_count() {
            return Err(Error::OutOfRange(number));
        }

        let start = number as usize * BLOCK_SIZE;
        self.disk[start..start + BLOCK_SIZE].copy_from_slice(&bytes[..BLOCK_SIZE]);

        return Ok(());
    }

    fn flush_super_block(&mut self, bytes: &[u8]) -> Result<(), Error> {
        return self.write_block(1, bytes);
    }

    fn format_label(&self) -> String {
        return String::from("memory");
    }

    fn block_count(&self) -> u32 {
        return (self.disk.len() / BLOCK_SIZE) as u32;
    }

    fn persist(&mut self) -> Result<(), Error> {
        return Ok(());
    }
}

#[derive(Debug)]
pub struct Manager {}

impl Manager {
    pub fn new() -> Self {
        return Self {};
    }
}

impl OSManager for Manager {
    fn current_time(&self) -> DateTime<Utc> {
        return Utc.with_ymd_and_hms(1985, 6, 1, 12, 30, 0).unwrap();
    }
}

/// A host tree held in memory, keyed by path.
pub struct Host {
    pub entries: HashMap<String, HostEntry>,
}

impl Host {
    pub fn new() -> Self {
        return Self {
            entries: HashMap::new(),
        };
    }

    pub fn file(mut self, path: &str, contents: &[u8]) -> Self {
        self.entries
            .insert(path.to_string(), HostEntry::File(contents.to_vec()));
        return self;
    }

    pub fn directory(mut self, path: &str, children: &[&str]) -> Self {
        self.entries.insert(
            path.to_string(),
            HostEntry::Directory(children.iter().map(|c| c.to_string()).collect()),
        );
        return self;
    }
}

impl HostSource for Host {
    type Error = String;

    fn entry(&self, path: &str) -> Result<HostEntry, String> {
        return match self.entries.get(path) {
            Some(e) => Ok(e.clone()),
            None => Err(format!("{} not found", path)),
        };
    }
}

/// Collects extracted objects. Writes to `refuse` fail.
pub struct Sink {
    pub directories: Vec<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub refuse: Option<String>,
}

impl Sink {
    pub fn new() -> Self {
        return Self {
            directories: Vec::new(),
            files: BTreeMap::new(),
            refuse: None,
        };
    }
}

impl ExtractSink for Sink {
    type Error = String;

    fn create_directory(&mut self, path: &str, _inode: &Inode) -> Result<(), String> {
        if self.refuse.as_deref() == Some(path) {
            return Err(String::from("refused"));
        }

        self.directories.push(path.to_string());
        return Ok(());
    }

    fn write_file(&mut self, path: &str, contents: &[u8], _inode: &Inode) -> Result<(), String> {
        if self.refuse.as_deref() == Some(path) {
            return Err(String::from("refused"));
        }

        self.files.insert(path.to_string(), contents.to_vec());
        return Ok(());
    }
}

/// Bytes that differ from block to block so misplaced blocks show up.
pub fn pattern(len: usize) -> Vec<u8> {
    return (0..len).map(|i| ((i / BLOCK_SIZE) as u8) ^ (i as u8)).collect();
}
