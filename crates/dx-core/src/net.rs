use std::net::Ipv4Addr;

/// Returns the /24 prefix of an IPv4 address string, e.g. "1.2.3.4" -> "1.2.3".
/// Non-IPv4 input yields None.
pub fn subnet24(ip: &str) -> Option<String> {
    let parsed: Ipv4Addr = ip.trim().parse().ok()?;
    let o = parsed.octets();
    Some(format!("{}.{}.{}", o[0], o[1], o[2]))
}

/// True when both addresses parse as IPv4 and share a /24 prefix.
/// Unparseable or empty addresses never match.
pub fn same_subnet24(a: &str, b: &str) -> bool {
    match (subnet24(a), subnet24(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn prefix() {
        assert_eq!(subnet24("1.2.3.4").as_deref(), Some("1.2.3"));
        assert_eq!(subnet24("not an ip"), None);
        assert_eq!(subnet24(""), None);
    }
    #[test]
    fn same_prefix() {
        assert!(same_subnet24("1.2.3.4", "1.2.3.99"));
        assert!(!same_subnet24("1.2.3.4", "5.6.7.8"));
        assert!(!same_subnet24("", "1.2.3.4"));
    }
}
