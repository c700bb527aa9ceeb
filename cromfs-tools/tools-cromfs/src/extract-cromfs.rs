use clap::{App, Arg};
use cromfs::FileSystem;
use cromfs_tool_lib::{init_logging, open_image, HostFs, Manager};
use std::process::exit;

fn main() {
    let arguments = App::new("extract-cromfs")
        .version("0.1.0")
        .about("This program copies files out of a CROMIX image, salvaging what it can.")
        .arg(
            Arg::with_name("image")
                .required(true)
                .takes_value(true)
                .help("The path of the image"),
        )
        .arg(
            Arg::with_name("path")
                .required(false)
                .takes_value(true)
                .default_value("/")
                .help("The file or directory within the image to extract"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .default_value(".")
                .help("The host directory to extract into."),
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

    let mut host = HostFs::new(arguments.value_of("output").unwrap_or("."));

    let report = match fs.extract(arguments.value_of("path").unwrap_or("/"), &mut host) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    print!("{}", report);
}
