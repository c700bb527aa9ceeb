extern crate cromfs;
use cromfs::{CromixError, Diagnostic, FileSystem, ROOT_INODE};

mod common;
use common::*;

fn build_tree(handler: &mut Handler, manager: &mut Manager) -> (u16, u32) {
    let mut fs = FileSystem::initialise(handler, manager, "small-ss").unwrap();

    let src = fs.create_directory(ROOT_INODE, "src").unwrap();
    let lib = fs.create_directory(src, "lib").unwrap();
    fs.create_file(src, "notes.txt", b"some notes").unwrap();
    let data = fs.create_file(lib, "data", &pattern(1500)).unwrap();
    fs.create_file(ROOT_INODE, "empty", b"").unwrap();

    let second_block = fs.inode(data).unwrap().block_pointers()[1];

    return (data, second_block);
}

#[test]
fn test_extract_everything() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();
    build_tree(&mut handler, &mut manager);

    let fs = FileSystem::mount(&mut handler, &mut manager).unwrap();
    let mut sink = Sink::new();

    let report = fs.extract("/", &mut sink).unwrap();

    assert!(report.diagnostics.is_empty());
    assert_eq!(report.directories, 3);
    assert_eq!(report.files, 3);
    assert_eq!(report.bytes, 1510);

    assert_eq!(sink.directories, vec!["/", "/src", "/src/lib"]);
    assert_eq!(sink.files["/src/notes.txt"], b"some notes".to_vec());
    assert_eq!(sink.files["/src/lib/data"], pattern(1500));
    assert_eq!(sink.files["/empty"], Vec::<u8>::new());
}

#[test]
fn test_extract_one_file() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();
    build_tree(&mut handler, &mut manager);

    let fs = FileSystem::mount(&mut handler, &mut manager).unwrap();
    let mut sink = Sink::new();

    let report = fs.extract("/src/lib/data", &mut sink).unwrap();

    assert_eq!(report.files, 1);
    assert!(sink.directories.is_empty());
    assert_eq!(sink.files.len(), 1);
    assert_eq!(sink.files["/src/lib/data"], pattern(1500));
}

#[test]
fn test_extract_missing() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();
    build_tree(&mut handler, &mut manager);

    let fs = FileSystem::mount(&mut handler, &mut manager).unwrap();

    assert_eq!(
        fs.extract("/src/nothing", &mut Sink::new()).err().unwrap(),
        CromixError::InodeNotFound(String::from("/src/nothing"))
    );
}

#[test]
fn test_extract_salvages_damaged_file() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();
    let (data, second_block) = build_tree(&mut handler, &mut manager);

    handler.unavailable.insert(second_block);

    let fs = FileSystem::mount(&mut handler, &mut manager).unwrap();
    let mut sink = Sink::new();

    let report = fs.extract("/", &mut sink).unwrap();

    assert_eq!(sink.files["/src/lib/data"], pattern(512));
    assert_eq!(sink.files["/src/notes.txt"], b"some notes".to_vec());
    assert_eq!(
        report.diagnostics,
        vec![
            Diagnostic::BlockUnavailable {
                block: second_block,
                inode: Some(data)
            },
            Diagnostic::PartialExtract {
                path: String::from("/src/lib/data"),
                salvaged: 512,
                expected: 1500
            },
        ]
    );

    match fs.read_path("/src/lib/data") {
        Err(CromixError::BlockUnavailable(Error::Unavailable(b))) => assert_eq!(b, second_block),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_extract_stops_at_stray_pointer() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();
    let (data, _) = build_tree(&mut handler, &mut manager);

    let mut fs = FileSystem::mount(&mut handler, &mut manager).unwrap();

    // Block 5 lies in the inode table.
    let mut inode = *fs.inode(data).unwrap();
    inode.set_block_pointer(1, 5);
    fs.update_inode(data, inode).unwrap();

    let mut sink = Sink::new();
    let report = fs.extract("/src/lib/data", &mut sink).unwrap();

    // Only the leading block keeps its offset, the third is not shifted down.
    assert_eq!(sink.files["/src/lib/data"], pattern(512));
    assert_eq!(
        report.diagnostics,
        vec![
            Diagnostic::BlockOutOfRange {
                inode: data,
                block: 5
            },
            Diagnostic::PartialExtract {
                path: String::from("/src/lib/data"),
                salvaged: 512,
                expected: 1500
            },
        ]
    );
}

#[test]
fn test_extract_host_refuses_directory() {
    let mut handler = Handler::new(400);
    let mut manager = Manager::new();
    build_tree(&mut handler, &mut manager);

    let fs = FileSystem::mount(&mut handler, &mut manager).unwrap();
    let mut sink = Sink::new();
    sink.refuse = Some(String::from("/src"));

    let report = fs.extract("/", &mut sink).unwrap();

    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::HostWriteFailed {
            path: String::from("/src"),
            message: String::from("\"refused\"")
        }]
    );
    assert_eq!(sink.directories, vec!["/"]);
    assert_eq!(sink.files.len(), 1);
    assert!(sink.files.contains_key("/empty"));
}
