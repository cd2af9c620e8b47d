//! Endpoint construction for the observer and controller channels.

use url::Url;

use crate::error::ProtocolError;

/// Logical channel on the automation server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Passive page-state observation (also carries commands for the extension).
    Observer,
    /// Active command issuance.
    Controller,
}

impl Channel {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Channel::Observer => "vcp-chrome-observer",
            Channel::Controller => "vcp-chrome-control",
        }
    }
}

/// Build `<server>/<channel>/VCP_Key=<key>`.
///
/// The key is pushed as a single path segment, so reserved characters such
/// as `/` or spaces are percent-encoded instead of splitting the path.
pub fn endpoint_url(server_url: &str, channel: Channel, key: &str) -> Result<Url, ProtocolError> {
    let mut url = Url::parse(server_url.trim())?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(ProtocolError::InvalidEndpoint(format!(
                "unsupported scheme '{}', expected ws or wss",
                other
            )));
        }
    }

    url.path_segments_mut()
        .map_err(|_| ProtocolError::InvalidEndpoint(format!("{} cannot be a base", server_url)))?
        .pop_if_empty()
        .push(channel.path_segment())
        .push(&format!("VCP_Key={}", key));

    Ok(url)
}

/// Prefix `https://` unless the URL already carries an http(s) scheme.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_endpoint() {
        let url = endpoint_url("ws://localhost:8088", Channel::Observer, "secret").unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:8088/vcp-chrome-observer/VCP_Key=secret"
        );
    }

    #[test]
    fn test_controller_endpoint_keeps_base_path() {
        let url = endpoint_url("wss://vcp.example.com/base/", Channel::Controller, "k").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://vcp.example.com/base/vcp-chrome-control/VCP_Key=k"
        );
    }

    #[test]
    fn test_key_is_encoded_into_one_segment() {
        let url = endpoint_url("ws://h:1", Channel::Observer, "a b/c").unwrap();
        assert_eq!(url.path(), "/vcp-chrome-observer/VCP_Key=a%20b%2Fc");
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = endpoint_url("http://localhost:8088", Channel::Observer, "k").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(endpoint_url("::::", Channel::Observer, "k").is_err());
    }

    #[test]
    fn test_normalize_url_adds_https() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("  example.com/a "), "https://example.com/a");
    }

    #[test]
    fn test_normalize_url_keeps_scheme() {
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("HTTPS://Example.com"), "HTTPS://Example.com");
    }
}
