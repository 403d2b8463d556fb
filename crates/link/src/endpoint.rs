use emg_core::{EmgError, Result};
use tokio_tungstenite::tungstenite::http::Uri;

/// Resolved Socket.IO endpoint.
///
/// Built once per session from the configured URL.  `http://host:5000` maps to
/// `ws://host:5000/socket.io/?EIO=4&transport=websocket`; a non-root URL path
/// selects a namespace, the way Socket.IO clients interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL as configured, for logs.
    url:        String,
    /// WebSocket URL the transport dials.
    socket_url: String,
    namespace:  String,
    event:      String,
}

impl Endpoint {
    /// Resolve `url` against the Engine.IO mount `path`.
    ///
    /// Fails with [`EmgError::Config`] for anything that is not a plain
    /// `http://` or `ws://` URL with a host.
    pub fn parse(url: &str, path: &str, event: &str) -> Result<Self> {
        let uri: Uri = url
            .trim()
            .parse()
            .map_err(|e| EmgError::Config(format!("malformed endpoint URL '{url}': {e}")))?;

        let scheme = match uri.scheme_str() {
            Some("http") | Some("ws") => "ws",
            Some("https") | Some("wss") => {
                return Err(EmgError::Config(format!(
                    "endpoint URL '{url}': TLS endpoints are not supported"
                )))
            }
            Some(other) => {
                return Err(EmgError::Config(format!(
                    "endpoint URL '{url}': unsupported scheme '{other}'"
                )))
            }
            None => {
                return Err(EmgError::Config(format!("endpoint URL '{url}' has no scheme")))
            }
        };

        let authority = uri
            .authority()
            .filter(|a| !a.host().is_empty())
            .ok_or_else(|| EmgError::Config(format!("endpoint URL '{url}' has no host")))?;

        if event.trim().is_empty() {
            return Err(EmgError::Config("endpoint event name must not be empty".into()));
        }

        let namespace = match uri.path().trim_end_matches('/') {
            "" => "/".to_string(),
            ns => ns.to_string(),
        };

        let mount = format!("/{}/", path.trim_matches('/'));
        let mount = if mount == "//" { "/".to_string() } else { mount };

        let mut socket_url = format!("{scheme}://{authority}{mount}?EIO=4&transport=websocket");
        if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
            socket_url.push('&');
            socket_url.push_str(query);
        }

        Ok(Self {
            url: url.trim().to_string(),
            socket_url,
            namespace,
            event: event.trim().to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn socket_url(&self) -> &str {
        &self.socket_url
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn event(&self) -> &str {
        &self.event
    }
}
