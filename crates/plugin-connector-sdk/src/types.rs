//! Values exchanged between the host and a connector module.

use serde::{Deserialize, Serialize};

/// Extra data the client asked for during a login flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scopes {
    /// The client requested a refresh token.
    pub offline_access: bool,

    /// The client requested group membership.
    pub groups: bool,
}

impl Scopes {
    /// Scopes with both flags set.
    pub fn all() -> Self {
        Self {
            offline_access: true,
            groups: true,
        }
    }
}

/// A user identity returned by a connector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable identifier of the user at the upstream provider.
    pub user_id: String,

    pub username: String,

    #[serde(default)]
    pub preferred_username: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub email_verified: bool,

    #[serde(default)]
    pub groups: Vec<String>,

    /// Opaque data the connector wants back on the next refresh.
    #[serde(default)]
    pub connector_data: Vec<u8>,
}

impl Identity {
    /// Create an identity with the two mandatory fields set.
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = email.into();
        self.email_verified = verified;
        self
    }

    /// Set the groups.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Set the connector data.
    pub fn with_connector_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.connector_data = data.into();
        self
    }
}

/// The HTTP request that hit the host's callback endpoint.
///
/// The host hands it to the module untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackRequest {
    pub method: String,

    /// Request target, path and query (`/callback?code=...&state=...`).
    pub uri: String,

    pub headers: Vec<(String, String)>,

    pub body: Vec<u8>,
}

impl CallbackRequest {
    /// Create a GET request for the given URI.
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            uri: uri.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        let (_, rest) = self.uri.split_once('?')?;
        // Drop any fragment.
        Some(rest.split('#').next().unwrap_or(rest))
    }

    /// First value of a query parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query()?
            .split('&')
            .filter(|pair| !pair.is_empty())
            .find_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                if decode_component(key) == name {
                    Some(decode_component(value))
                } else {
                    None
                }
            })
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn decode_component(raw: &str) -> String {
    let plus_as_space = raw.replace('+', " ");
    match urlencoding::decode(&plus_as_space) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => plus_as_space,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_decodes() {
        let req = CallbackRequest::get("/callback?code=a%2Fb&state=hello+world&empty");

        assert_eq!(req.query_param("code").as_deref(), Some("a/b"));
        assert_eq!(req.query_param("state").as_deref(), Some("hello world"));
        assert_eq!(req.query_param("empty").as_deref(), Some(""));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn test_query_without_query_string() {
        let req = CallbackRequest::get("/callback");
        assert_eq!(req.query(), None);
        assert_eq!(req.query_param("state"), None);
    }

    #[test]
    fn test_header_is_case_insensitive() {
        let req = CallbackRequest::get("/").with_header("Content-Type", "text/plain");
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn test_identity_json_field_names() {
        let identity = Identity::new("42", "jane")
            .with_email("jane@example.com", true)
            .with_groups(["admins"]);

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["userId"], "42");
        assert_eq!(json["emailVerified"], true);
        assert_eq!(json["groups"][0], "admins");

        let back: Identity = serde_json::from_value(json).unwrap();
        assert_eq!(back, identity);
    }
}
