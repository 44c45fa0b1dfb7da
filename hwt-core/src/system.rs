//! Host information used to label the tree

use std::fs;

use crate::constants::paths;

const FALLBACK_HOST: &str = "localhost";

/// Host name from procfs, then /etc/hostname
pub fn read_hostname() -> String {
    for path in [paths::proc::HOSTNAME, paths::proc::ETC_HOSTNAME] {
        if let Ok(hostname) = fs::read_to_string(path) {
            let h = hostname.trim();
            if !h.is_empty() {
                return h.to_string();
            }
        }
    }
    FALLBACK_HOST.to_string()
}

/// Mainboard name from DMI ("vendor board"), else the product name
pub fn read_board_name() -> Option<String> {
    let read = |path: &str| {
        fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let combined = format!("{} {}", read(paths::dmi::BOARD_VENDOR), read(paths::dmi::BOARD_NAME))
        .trim()
        .to_string();
    if !combined.is_empty() {
        return Some(combined);
    }

    Some(read(paths::dmi::PRODUCT_NAME)).filter(|p| !p.is_empty())
}

/// Host name usable as a single identifier segment
pub fn host_segment(host: &str) -> String {
    let cleaned: String = host
        .trim()
        .chars()
        .map(|c| if c == '/' || c.is_whitespace() { '-' } else { c })
        .collect();
    if cleaned.is_empty() {
        FALLBACK_HOST.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_segment() {
        assert_eq!(host_segment("workstation"), "workstation");
        assert_eq!(host_segment(" a/b c "), "a-b-c");
        assert_eq!(host_segment(""), "localhost");
    }

    #[test]
    fn test_read_hostname_never_empty() {
        assert!(!read_hostname().is_empty());
    }
}
