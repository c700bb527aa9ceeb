extern crate cromfs;
use cromfs::{
    AccessFlags, AppendPolicy, CromixError, FileSystem, InodeType, DIRECT_BLOCKS,
    ENTRIES_PER_BLOCK, POINTERS_PER_BLOCK, ROOT_INODE,
};

mod common;
use common::*;

#[test]
fn test_create_small_file() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();
    let contents = b"Hello, CROMIX!".to_vec();

    let number = fs.create_file(ROOT_INODE, "hello", &contents).unwrap();
    assert_eq!(number, 2);

    let inode = fs.inode(number).unwrap();
    assert_eq!(inode.kind(), InodeType::File);
    assert_eq!(inode.size(), 14);
    assert_eq!(inode.used_blocks(), 1);
    assert_eq!(inode.parent(), ROOT_INODE);

    assert_eq!(fs.read_file(number).unwrap(), contents);
    assert_eq!(fs.read_path("/HELLO").unwrap(), contents);

    let root = fs.inode(ROOT_INODE).unwrap();
    assert_eq!(root.dir_count(), 1);
    assert_eq!(root.size(), 32);
}

#[test]
fn test_single_indirect() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();
    let contents = pattern(9000);

    let number = fs.create_file(ROOT_INODE, "big", &contents).unwrap();
    let inode = *fs.inode(number).unwrap();

    // Sixteen direct blocks, two more behind one pointer block.
    assert_eq!(inode.used_blocks(), 19);
    assert_ne!(inode.block_pointers()[16], 0);
    assert_eq!(inode.block_pointers()[17], 0);
    assert_eq!(fs.read_file(number).unwrap(), contents);

    let report = fs.check();
    assert!(report.is_clean(), "{}", report);
    assert_eq!(report.block_stats.file_blocks, 19);
}

#[test]
fn test_double_indirect() {
    let mut handler = Handler::new(1232);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "large-ss").unwrap();
    let free = fs.total_free();

    // One block past the direct slots and a full single indirect block.
    let contents = pattern((16 + 128 + 1) * 512);
    let number = fs.create_file(ROOT_INODE, "huge", &contents).unwrap();
    let inode = *fs.inode(number).unwrap();

    // Level one, level two and one level two child.
    assert_eq!(inode.used_blocks(), 145 + 3);
    assert_eq!(fs.total_free(), free - 148);
    assert_eq!(fs.read_file(number).unwrap(), contents);

    let report = fs.check();
    assert!(report.is_clean(), "{}", report);
    assert_eq!(report.block_stats.file_blocks, 148);
}

#[test]
fn test_second_level_two_child() {
    let mut handler = Handler::new(1232);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "large-ss").unwrap();

    // Fills the first child of the level two block and spills into a second one.
    let blocks = DIRECT_BLOCKS + 2 * POINTERS_PER_BLOCK + 1;
    let contents = pattern(blocks * 512);
    let number = fs.create_file(ROOT_INODE, "wide", &contents).unwrap();
    let inode = *fs.inode(number).unwrap();

    assert_eq!(inode.used_blocks(), blocks as u32 + 4);
    assert_eq!(inode.block_pointers()[DIRECT_BLOCKS + 2], 0);
    assert_eq!(fs.read_file(number).unwrap(), contents);

    let report = fs.check();
    assert!(report.is_clean(), "{}", report);
}

#[test]
fn test_triple_indirect() {
    let mut handler = Handler::new(20480);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "hard-disk").unwrap();
    let free = fs.total_free();

    let blocks = DIRECT_BLOCKS + POINTERS_PER_BLOCK + POINTERS_PER_BLOCK * POINTERS_PER_BLOCK + 1;
    let contents = pattern(blocks * 512);
    let number = fs.create_file(ROOT_INODE, "vast", &contents).unwrap();
    let inode = *fs.inode(number).unwrap();

    // Level one, level two with its 128 children, then level three, one level two child
    // under it and one level one child under that.
    let pointers = 1 + 1 + POINTERS_PER_BLOCK + 1 + 1 + 1;
    assert_ne!(inode.block_pointers()[DIRECT_BLOCKS + 2], 0);
    assert_eq!(inode.used_blocks(), (blocks + pointers) as u32);
    assert_eq!(fs.total_free(), free - (blocks + pointers) as u32);
    assert_eq!(fs.read_file(number).unwrap(), contents);

    let report = fs.check();
    assert!(report.is_clean(), "{}", report);
}

#[test]
fn test_directory_grows() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();

    for i in 0..ENTRIES_PER_BLOCK + 1 {
        fs.create_file(ROOT_INODE, &format!("file{}", i), &[i as u8])
            .unwrap();
    }

    let root = fs.inode(ROOT_INODE).unwrap();
    assert_eq!(root.dir_count(), 17);
    assert_eq!(root.used_blocks(), 2);
    assert_eq!(root.size(), 512 + 32);

    assert_eq!(fs.read_path("/file16").unwrap(), vec![16u8]);
    assert!(fs.check().is_clean());
}

#[test]
fn test_nested_directories() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();

    let usr = fs.create_directory(ROOT_INODE, "usr").unwrap();
    let bin = fs.create_directory(usr, "bin").unwrap();
    let ls = fs.create_file(bin, "ls", b"#!ls").unwrap();

    assert_eq!(fs.lookup("/usr/bin/ls").unwrap(), ls);
    assert_eq!(fs.lookup("/usr/bin").unwrap(), bin);
    assert_eq!(fs.lookup("/").unwrap(), ROOT_INODE);
    assert_eq!(fs.inode(bin).unwrap().parent(), usr);

    assert_eq!(
        fs.lookup("/usr/bin/ls/x").err().unwrap(),
        CromixError::NotADirectory(String::from("/usr/bin/ls/x"))
    );
    assert_eq!(
        fs.lookup("/usr/lib").err().unwrap(),
        CromixError::InodeNotFound(String::from("/usr/lib"))
    );
    assert_eq!(
        fs.read_path("/usr").err().unwrap(),
        CromixError::IsADirectory(String::from("/usr"))
    );

    let report = fs.check();
    assert!(report.is_clean(), "{}", report);
    assert_eq!(report.inode_stats.directories, 3);
    assert_eq!(report.inode_stats.files, 1);
}

#[test]
fn test_rejected_names() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();
    fs.create_file(ROOT_INODE, "README", b"x").unwrap();

    assert_eq!(
        fs.create_file(ROOT_INODE, "readme", b"y").err().unwrap(),
        CromixError::EntryExists(String::from("readme"))
    );
    assert_eq!(
        fs.create_file(ROOT_INODE, "", b"y").err().unwrap(),
        CromixError::InvalidFileName
    );
    assert_eq!(
        fs.create_file(ROOT_INODE, "a/b", b"y").err().unwrap(),
        CromixError::InvalidFileName
    );
    assert_eq!(
        fs.create_directory(ROOT_INODE, "abcdefghijklmnopqrstuvwxy")
            .err()
            .unwrap(),
        CromixError::InvalidFileName
    );

    // Nothing was consumed by the failures.
    assert_eq!(fs.inode(ROOT_INODE).unwrap().dir_count(), 1);
    assert!(fs.check().is_clean());
}

#[test]
fn test_out_of_inodes() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();

    for i in 0..63 {
        fs.create_directory(ROOT_INODE, &format!("d{}", i)).unwrap();
    }

    assert_eq!(
        fs.create_directory(ROOT_INODE, "one-more").err().unwrap(),
        CromixError::NoFreeInode
    );
}

#[test]
fn test_append_host_tree() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    let host = Host::new()
        .directory("/home/src", &["notes.txt", "lib", "this-name-is-far-too-long-to-store"])
        .file("/home/src/notes.txt", b"some notes")
        .directory("/home/src/lib", &["data"])
        .file("/home/src/lib/data", &pattern(3000));

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();
    fs.set_policy(AppendPolicy {
        owner: 3,
        group: 7,
        owner_access: AccessFlags::new(true, false, true, false),
        group_access: AccessFlags::new(true, false, false, false),
        other_access: AccessFlags::default(),
    });

    let src = fs.append(&host, "/home/src", "/", "src").unwrap();

    assert_eq!(fs.inode(src).unwrap().dir_count(), 2);
    assert_eq!(fs.read_path("/src/notes.txt").unwrap(), b"some notes".to_vec());
    assert_eq!(fs.read_path("/src/lib/data").unwrap(), pattern(3000));

    let data = fs.inode(fs.lookup("/src/lib/data").unwrap()).unwrap();
    assert_eq!(data.owner(), 3);
    assert_eq!(data.group(), 7);
    assert_eq!(data.owner_access().to_u8(), 0b0101);

    assert!(fs.check().is_clean());
}

#[test]
fn test_append_missing_host_path() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();

    match fs.append(&Host::new(), "/nowhere", "/", "x") {
        Err(CromixError::HostError(_)) => (),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_append_survives_remount() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();

    {
        let mut fs = FileSystem::initialise(&mut handler, &mut manager, "small-ss").unwrap();
        fs.create_file(ROOT_INODE, "kept", &pattern(1500)).unwrap();
    }

    let fs = FileSystem::mount(&mut handler, &mut manager).unwrap();

    assert_eq!(fs.read_path("/kept").unwrap(), pattern(1500));
    assert_eq!(fs.total_free(), 381 - 3);
}
