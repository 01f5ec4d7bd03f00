//! KV endpoint parsing

use crate::error::{Error, Result};

/// Scheme assumed when the endpoint carries none
const DEFAULT_SCHEME: &str = "http";

/// Host and port of the KV server, as configured in `consul_config>endpoint`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsulEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ConsulEndpoint {
    /// Parse `scheme://host:port`
    ///
    /// The scheme is split off at the first `:` and the `//` leading the host
    /// segment is stripped; the port is whatever follows the last `:`.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        let invalid = || Error::InvalidEndpoint(endpoint.to_string());

        let (scheme, rest) = match endpoint.split_once(':') {
            Some((scheme, rest)) if rest.starts_with("//") => (scheme, &rest[2..]),
            _ => (DEFAULT_SCHEME, endpoint),
        };

        let (host, port) = rest.rsplit_once(':').ok_or_else(invalid)?;
        let host = host.trim_matches('/');
        let port = port.trim_end_matches('/');

        if scheme.is_empty() || host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self {
            scheme: scheme.to_lowercase(),
            host: host.to_string(),
            port,
        })
    }

    /// Base URL for HTTP requests
    ///
    /// Consul is reached over plain HTTP unless the endpoint says `https`;
    /// a `tcp://` endpoint therefore maps to `http://`.
    pub fn base_url(&self) -> String {
        let scheme = if self.scheme == "https" { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

impl std::fmt::Display for ConsulEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_http_endpoint() {
        let ep = ConsulEndpoint::parse("http://10.0.0.5:8500").unwrap();
        assert_eq!(ep.scheme, "http");
        assert_eq!(ep.host, "10.0.0.5");
        assert_eq!(ep.port, 8500);
        assert_eq!(ep.base_url(), "http://10.0.0.5:8500");
    }

    #[test]
    fn test_parse_tcp_endpoint_uses_http() {
        let ep = ConsulEndpoint::parse("tcp://consul-server.default.svc:8500").unwrap();
        assert_eq!(ep.host, "consul-server.default.svc");
        assert_eq!(ep.base_url(), "http://consul-server.default.svc:8500");
    }

    #[test]
    fn test_parse_endpoint_without_scheme() {
        let ep = ConsulEndpoint::parse("localhost:8500").unwrap();
        assert_eq!(ep.scheme, "http");
        assert_eq!(ep.host, "localhost");
        assert_eq!(ep.port, 8500);
    }

    #[test]
    fn test_parse_invalid_endpoints() {
        assert_matches!(ConsulEndpoint::parse("http://10.0.0.5"), Err(Error::InvalidEndpoint(_)));
        assert_matches!(
            ConsulEndpoint::parse("http://10.0.0.5:port"),
            Err(Error::InvalidEndpoint(_))
        );
        assert_matches!(ConsulEndpoint::parse("http://:8500"), Err(Error::InvalidEndpoint(_)));
        assert_matches!(ConsulEndpoint::parse(""), Err(Error::InvalidEndpoint(_)));
    }
}
