//! Web origins (scheme + host + port) of embedded surfaces.
//!
//! Trust decisions compare origins by exact string equality on the
//! ASCII serialization, the same form a browser puts in `event.origin`.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    /// Wrap an origin string as received on the wire. No normalization is
    /// applied: `https://a.example` and `https://a.example/` are different
    /// origins here, just as they are for the allow-list.
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    /// Derive the origin of a configured surface URL.
    pub fn from_url(url: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(url)?;
        Ok(Self(parsed.origin().ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Opaque origins (`data:`, `file:` ...) serialize as `"null"` and can
    /// never be trusted.
    pub fn is_opaque(&self) -> bool {
        self.0 == "null"
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
