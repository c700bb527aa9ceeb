use clap::{App, Arg};
use cromfs::FileSystem;
use cromfs_tool_lib::{init_logging, open_image, Manager};
use std::io::Write;
use std::process::exit;

fn main() {
    let arguments = App::new("cat-cromfs")
        .version("0.1.0")
        .about("This program prints a file from a CROMIX image.")
        .arg(
            Arg::with_name("image")
                .required(true)
                .takes_value(true)
                .help("The path of the image"),
        )
        .arg(
            Arg::with_name("file")
                .required(true)
                .takes_value(true)
                .help("The absolute path of the file within the image"),
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

    let (path, file) = match (arguments.value_of("image"), arguments.value_of("file")) {
        (Some(p), Some(f)) => (p, f),
        _ => {
            eprintln!("An image and a file are required.");
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

    let contents = match fs.read_path(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    match std::io::stdout().write_all(&contents) {
        Ok(_) => (),
        Err(e) => {
            eprintln!("Failed to write output: {}", e);
            exit(1);
        }
    }
}
