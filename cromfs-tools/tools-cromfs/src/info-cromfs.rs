use clap::{App, Arg};
use cromfs::{FileSystem, BLOCK_SIZE};
use cromfs_tool_lib::{init_logging, open_image, u64_to_sized_string, Manager};
use std::process::exit;

fn main() {
    let arguments = App::new("info-cromfs")
        .version("0.1.0")
        .about("This program summarises a CROMIX image.")
        .arg(
            Arg::with_name("image")
                .required(true)
                .takes_value(true)
                .help("The path of the image"),
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

    let mut manager = Manager::new();
    let mut handler = match open_image(path) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let fs = match FileSystem::mount(&mut *handler, &mut manager) {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("An error occurred: {}", e);
            exit(1);
        }
    };

    let info = fs.info();

    print!("{}", info);
    println!(
        "Capacity:          {}",
        u64_to_sized_string(info.data_block_count as u64 * BLOCK_SIZE as u64)
    );
    println!(
        "Free space:        {}",
        u64_to_sized_string(info.free_blocks as u64 * BLOCK_SIZE as u64)
    );
}
