use clap::{App, Arg};
use cromfs::{AccessFlags, AppendPolicy, FileSystem};
use cromfs_tool_lib::{init_logging, open_image, HostFs, Manager};
use std::io::Write;
use std::path::Path;
use std::process::exit;

/// Parses a permission string such as "rewa" or "re".
fn parse_access(s: &str) -> Option<AccessFlags> {
    let mut flags = [false; 4];

    for c in s.chars() {
        match c {
            'r' => flags[0] = true,
            'e' => flags[1] = true,
            'w' => flags[2] = true,
            'a' => flags[3] = true,
            '-' => (),
            _ => return None,
        }
    }

    return Some(AccessFlags::new(flags[0], flags[1], flags[2], flags[3]));
}

fn parse_id(s: &str, what: &str) -> u16 {
    return match s.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("The {} must be a number between 0 and 65535.", what);
            exit(1);
        }
    };
}

fn main() {
    let arguments = App::new("add-cromfs")
        .version("0.1.0")
        .about("This program adds a file or a directory tree to a CROMIX image.")
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
                .help("The path of the host file or directory to add"),
        )
        .arg(
            Arg::with_name("directory")
                .short("d")
                .long("directory")
                .takes_value(true)
                .default_value("/")
                .help("The directory within the image to add to."),
        )
        .arg(
            Arg::with_name("name")
                .short("n")
                .long("name")
                .takes_value(true)
                .help("The name of the entry as it should be stored in the image."),
        )
        .arg(
            Arg::with_name("owner")
                .long("owner")
                .takes_value(true)
                .help("Owner id of the new entries."),
        )
        .arg(
            Arg::with_name("group")
                .long("group")
                .takes_value(true)
                .help("Group id of the new entries."),
        )
        .arg(
            Arg::with_name("access")
                .long("access")
                .takes_value(true)
                .number_of_values(3)
                .value_names(&["OWNER", "GROUP", "OTHER"])
                .help("Permissions of the new entries, e.g. --access rewa re re"),
        )
        .arg(
            Arg::with_name("yes")
                .short("y")
                .long("yes")
                .takes_value(false)
                .help("Do not ask for confirmation."),
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

    let (path, file_path) = match (arguments.value_of("image"), arguments.value_of("file")) {
        (Some(p), Some(f)) => (p, f),
        _ => {
            eprintln!("An image and a file to add are required.");
            exit(1);
        }
    };

    let target = arguments.value_of("directory").unwrap_or("/");

    let name = match arguments.value_of("name") {
        Some(n) => n.to_string(),
        None => match Path::new(file_path).file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => {
                eprintln!("Could not determine a name to use for the image.");
                exit(1);
            }
        },
    };

    let mut policy = AppendPolicy::default();

    if let Some(owner) = arguments.value_of("owner") {
        policy.owner = parse_id(owner, "owner");
    }

    if let Some(group) = arguments.value_of("group") {
        policy.group = parse_id(group, "group");
    }

    if let Some(values) = arguments.values_of("access") {
        let flags: Vec<Option<AccessFlags>> = values.map(parse_access).collect();

        match flags.as_slice() {
            [Some(owner), Some(group), Some(other)] => {
                policy.owner_access = *owner;
                policy.group_access = *group;
                policy.other_access = *other;
            }
            _ => {
                eprintln!("Permissions are made of the letters r, e, w and a.");
                exit(1);
            }
        }
    }

    if !arguments.is_present("yes") {
        print!(
            "Are you sure you wish to copy \"{}\" into the image as \"{}\": (y/n) ",
            file_path,
            format!("{}/{}", target.trim_end_matches('/'), name)
        );

        match std::io::stdout().flush() {
            Ok(_) => (),
            Err(_) => (),
        }

        let mut input = String::new();
        match std::io::stdin().read_line(&mut input) {
            Ok(_) => (),
            Err(_) => {
                eprintln!("Failed to read response.");
                exit(1);
            }
        }

        if input.trim() != "y" && input.trim() != "Y" {
            println!("Will not add file.");
            exit(0);
        }
    }

    let mut manager = Manager::new();
    let mut handler = match open_image(path) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let mut fs = match FileSystem::mount(&mut *handler, &mut manager) {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("An error occurred: {}", e);
            exit(1);
        }
    };

    fs.set_policy(policy);

    let number = match fs.append(&HostFs::new("/"), file_path, target, &name) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error: {}", e);
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

    println!("Successfully added {} as inode {}.", name, number);
}
