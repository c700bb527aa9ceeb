use clap::{App, Arg};
use cromfs::FileSystem;
use cromfs_tool_lib::{init_logging, open_image, Manager};
use std::process::exit;

fn main() {
    let arguments = App::new("check-cromfs")
        .version("0.1.0")
        .about("This program checks the consistency of a CROMIX image without changing it.")
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

    let report = fs.check();
    print!("{}", report);

    if !report.is_clean() {
        exit(2);
    }
}
