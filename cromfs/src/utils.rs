use alloc::string::String;
use alloc::vec::Vec;

pub fn div_round_up(n: u32, d: u32) -> u32 {
    if n % d != 0 {
        return n / d + 1;
    } else {
        return n / d;
    }
}

/// Splits a slash separated path into its non-empty components.
pub fn path_components(path: &str) -> Vec<&str> {
    return path.split('/').filter(|c| !c.is_empty()).collect();
}

/// Joins a directory path and a name with a single separator.
pub fn join_path(directory: &str, name: &str) -> String {
    let mut res = String::from(directory);

    if !res.ends_with('/') {
        res.push('/');
    }

    res.push_str(name);

    return res;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_round_up() {
        assert_eq!(div_round_up(9, 4), 3);
        assert_eq!(div_round_up(8, 4), 2);
        assert_eq!(div_round_up(0, 4), 0);
    }

    #[test]
    pub fn test_components() {
        assert_eq!(path_components("/usr//bin/"), vec!["usr", "bin"]);
        assert!(path_components("/").is_empty());
    }

    #[test]
    pub fn test_join() {
        assert_eq!(join_path("/", "bin"), "/bin");
        assert_eq!(join_path("/usr", "bin"), "/usr/bin");
    }
}
