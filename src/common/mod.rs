//! Shared infrastructure: errors, configuration, logging, paths

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Parse a `host:port` address string.
///
/// The port is split off the last colon so IPv6 hosts keep their colons.
pub fn parse_address(addr: &str) -> Result<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| Error::Config(format!("Invalid address '{}': expected host:port", addr)))?;
    if host.is_empty() {
        return Err(Error::Config(format!(
            "Invalid address '{}': missing host",
            addr
        )));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| Error::Config(format!("Invalid address '{}': bad port '{}'", addr, port)))?;
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("localhost:7888").unwrap(),
            ("localhost".to_string(), 7888)
        );
        assert_eq!(
            parse_address("::1:7888").unwrap(),
            ("::1".to_string(), 7888)
        );
        assert!(parse_address("7888").is_err());
        assert!(parse_address(":7888").is_err());
        assert!(parse_address("host:notaport").is_err());
    }
}
