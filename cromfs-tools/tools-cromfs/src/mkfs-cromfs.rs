use clap::{App, Arg};
use cromfs::{FileSystem, Geometry, BLOCK_SIZE};
use cromfs_tool_lib::{init_logging, sized_string_to_u64, Handler, Manager};
use log::info;
use std::path::Path;
use std::process::exit;

fn main() {
    let labels: Vec<&str> = Geometry::all().iter().map(|g| g.label()).collect();

    let arguments = App::new("mkfs-cromfs")
        .version("0.1.0")
        .about("This program creates an empty CROMIX image.")
        .arg(
            Arg::with_name("image")
                .required(true)
                .takes_value(true)
                .help("The path of the image to create"),
        )
        .arg(
            Arg::with_name("geometry")
                .short("g")
                .long("geometry")
                .takes_value(true)
                .default_value("large-ss")
                .possible_values(&labels)
                .case_insensitive(true)
                .help("The disk geometry to lay out."),
        )
        .arg(
            Arg::with_name("size")
                .short("s")
                .long("size")
                .takes_value(true)
                .help("Pad the image file to this size, e.g. 1MiB."),
        )
        .arg(
            Arg::with_name("force")
                .short("f")
                .long("force")
                .takes_value(false)
                .help("Overwrite an existing file."),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .takes_value(false)
                .help("Log every step."),
        )
        .get_matches();

    init_logging(arguments.is_present("verbose"));

    let path = match arguments.value_of("image") {
        Some(p) => p,
        None => {
            eprintln!("An image is required.");
            exit(1);
        }
    };

    let label = arguments.value_of("geometry").unwrap_or("large-ss");

    let geometry = match Geometry::from_label(label) {
        Some(g) => g,
        None => {
            eprintln!("Unknown geometry \"{}\".", label);
            exit(1);
        }
    };

    let mut blocks = geometry.block_count();

    if let Some(size) = arguments.value_of("size") {
        let bytes = match sized_string_to_u64(size) {
            Some(b) => b,
            None => {
                eprintln!("Could not understand the size \"{}\".", size);
                exit(1);
            }
        };

        let requested = (bytes / BLOCK_SIZE as u64) as u32;

        if requested < blocks {
            eprintln!(
                "A {} image needs at least {} blocks.",
                geometry.label(),
                blocks
            );
            exit(1);
        }

        blocks = requested;
    }

    if Path::new(path).exists() && !arguments.is_present("force") {
        eprintln!("{} already exists. Use --force to overwrite it.", path);
        exit(1);
    }

    let mut manager = Manager::new();
    let mut handler = match Handler::new_create(path, blocks) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let mut fs = match FileSystem::initialise(&mut handler, &mut manager, label) {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("Could not create the filesystem: {}", e);
            exit(1);
        }
    };

    match fs.persist() {
        Ok(_) => (),
        Err(e) => {
            eprintln!("Could not write the image: {}", e);
            exit(1);
        }
    }

    info!("{} blocks written to {}", blocks, path);

    print!("{}", fs.info());
}
