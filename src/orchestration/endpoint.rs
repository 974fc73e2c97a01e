//! Application endpoint formatting.

/// Endpoint plus requested ports: `:<port>` for one port, `:[p1,p2,...]` for several
pub fn application_uri(endpoint: &str, ports: &[u16]) -> String {
    match ports {
        [] => endpoint.to_string(),
        [port] => format!("{endpoint}:{port}"),
        many => {
            let list = many
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("{endpoint}:[{list}]")
        }
    }
}

/// Host to probe: the authority of the endpoint without scheme, path, user info or
/// explicit port. Bracketed IPv6 literals lose their brackets so they can be dialed.
pub fn endpoint_host(endpoint: &str) -> &str {
    let without_scheme = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let host_port = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host_port)| host_port);

    if let Some(bracketed) = host_port.strip_prefix('[') {
        return bracketed
            .split_once(']')
            .map_or(bracketed, |(host, _)| host);
    }

    // A bare IPv6 literal has several colons and no port to split off
    match host_port.split_once(':') {
        Some((host, port)) if !port.contains(':') => host,
        _ => host_port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_uri_formats() {
        assert_eq!(
            application_uri("http://10.0.0.5", &[8080]),
            "http://10.0.0.5:8080"
        );
        assert_eq!(
            application_uri("http://10.0.0.5", &[80, 443]),
            "http://10.0.0.5:[80,443]"
        );
    }

    #[test]
    fn test_endpoint_host() {
        assert_eq!(endpoint_host("http://10.0.0.5"), "10.0.0.5");
        assert_eq!(endpoint_host("https://app.example.com/health"), "app.example.com");
        assert_eq!(endpoint_host("10.0.0.5"), "10.0.0.5");
    }

    #[test]
    fn test_endpoint_host_ipv6_and_ports() {
        assert_eq!(endpoint_host("http://[::1]"), "::1");
        assert_eq!(endpoint_host("http://[fd00::5]:8080/health"), "fd00::5");
        assert_eq!(endpoint_host("http://10.0.0.5:8080"), "10.0.0.5");
        assert_eq!(endpoint_host("http://admin@app.example.com:80"), "app.example.com");
        assert_eq!(endpoint_host("fd00::5"), "fd00::5");
    }
}
