mod error;
mod handler;
mod host;
mod manager;

pub use error::ToolError;
pub use handler::{detect_format, open_image, Handler};
pub use host::HostFs;
pub use manager::Manager;
use byte_unit::Byte;
use log::LevelFilter;

pub fn sized_string_to_u64(string: &str) -> Option<u64> {
    return match Byte::from_str(string) {
        Ok(b) => Some(b.get_bytes() as u64),
        Err(_) => None,
    };
}

pub fn u64_to_sized_string(n: u64) -> String {
    return Byte::from(n).get_appropriate_unit(true).to_string();
}

/// Starts logging at `warn`, or `debug` when verbose. `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

#[cfg(test)]
mod tests {
    use super::sized_string_to_u64;

    #[test]
    fn test_no_suffix() {
        assert_eq!(sized_string_to_u64("512").unwrap(), 512)
    }

    #[test]
    fn test_kib() {
        assert_eq!(sized_string_to_u64("616KiB").unwrap(), 630_784)
    }

    #[test]
    fn test_mib() {
        assert_eq!(sized_string_to_u64("10MiB").unwrap(), 10_485_760)
    }

    #[test]
    fn test_fail() {
        assert!(sized_string_to_u64("616XB").is_none())
    }

    #[test]
    fn test_fail_2() {
        assert!(sized_string_to_u64("KiB").is_none())
    }
}
