use cromfs::{ExtractSink, HostEntry, HostSource, Inode};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The host filesystem. Extracted paths are placed under `root`.
pub struct HostFs {
    root: PathBuf,
}

impl HostFs {
    pub fn new(root: &str) -> Self {
        return Self {
            root: PathBuf::from(root),
        };
    }

    /// Where an image path lands on the host.
    pub fn host_path(&self, path: &str) -> PathBuf {
        let mut res = self.root.clone();

        for component in path.split('/').filter(|c| !c.is_empty()) {
            res.push(component);
        }

        return res;
    }
}

impl HostSource for HostFs {
    type Error = io::Error;

    fn entry(&self, path: &str) -> Result<HostEntry, io::Error> {
        let metadata = fs::metadata(path)?;

        if metadata.is_dir() {
            let mut children = Vec::new();

            for entry in fs::read_dir(path)? {
                match entry?.file_name().into_string() {
                    Ok(name) => children.push(name),
                    Err(name) => debug!("{}: skipping non UTF-8 name {:?}", path, name),
                }
            }

            // Directory order on the host is arbitrary.
            children.sort();

            return Ok(HostEntry::Directory(children));
        }

        return Ok(HostEntry::File(fs::read(path)?));
    }

    fn child(&self, directory: &str, name: &str) -> String {
        return Path::new(directory).join(name).to_string_lossy().into_owned();
    }
}

impl ExtractSink for HostFs {
    type Error = io::Error;

    fn create_directory(&mut self, path: &str, _inode: &Inode) -> Result<(), io::Error> {
        return fs::create_dir_all(self.host_path(path));
    }

    fn write_file(&mut self, path: &str, contents: &[u8], _inode: &Inode) -> Result<(), io::Error> {
        let target = self.host_path(path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("{}: {} bytes", target.display(), contents.len());

        return fs::write(target, contents);
    }
}

#[cfg(test)]
mod tests {
    use super::HostFs;
    use std::path::PathBuf;

    #[test]
    fn test_host_path() {
        let host = HostFs::new("out");

        assert_eq!(host.host_path("/usr/bin/ls"), PathBuf::from("out/usr/bin/ls"));
        assert_eq!(host.host_path("/"), PathBuf::from("out"));
    }
}
