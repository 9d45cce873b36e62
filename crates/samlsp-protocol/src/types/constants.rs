//! Protocol URIs used on the service-provider side.

/// Assertion namespace.
pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// Protocol namespace.
pub const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// Metadata namespace.
pub const MD_NS: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

macro_rules! binding_uri {
    ($name:literal) => {
        concat!("urn:oasis:names:tc:SAML:2.0:bindings:", $name)
    };
}

macro_rules! name_id_uri {
    ($version:literal, $name:literal) => {
        concat!("urn:oasis:names:tc:SAML:", $version, ":nameid-format:", $name)
    };
}

macro_rules! status_uri {
    ($name:literal) => {
        concat!("urn:oasis:names:tc:SAML:2.0:status:", $name)
    };
}

/// How a protocol message travels.
///
/// The SP sends AuthnRequests over [`HttpRedirect`](Self::HttpRedirect) and
/// accepts responses only over [`HttpPost`](Self::HttpPost). The other two
/// are recognized so IdP metadata listing them parses cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamlBinding {
    /// Browser form post.
    HttpPost,
    /// Browser redirect with a deflated query parameter.
    HttpRedirect,
    /// Artifact resolution.
    HttpArtifact,
    /// Back-channel SOAP.
    Soap,
}

impl SamlBinding {
    const ALL: [Self; 4] = [Self::HttpPost, Self::HttpRedirect, Self::HttpArtifact, Self::Soap];

    /// Binding URI as it appears in metadata and `ProtocolBinding`.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::HttpPost => binding_uri!("HTTP-POST"),
            Self::HttpRedirect => binding_uri!("HTTP-Redirect"),
            Self::HttpArtifact => binding_uri!("HTTP-Artifact"),
            Self::Soap => binding_uri!("SOAP"),
        }
    }

    /// Looks a binding up by URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|binding| binding.uri() == uri)
    }
}

impl std::fmt::Display for SamlBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.uri())
    }
}

/// Subject name identifier formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameIdFormat {
    /// Left to the IdP.
    #[default]
    Unspecified,
    /// An email address.
    Email,
    /// Stable pseudonymous identifier.
    Persistent,
    /// One-time identifier.
    Transient,
}

impl NameIdFormat {
    const ALL: [Self; 4] = [Self::Unspecified, Self::Email, Self::Persistent, Self::Transient];

    /// Formats the SP advertises in its metadata, in preference order.
    pub const SUPPORTED: [Self; 3] = [Self::Persistent, Self::Transient, Self::Email];

    /// Format URI.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Unspecified => name_id_uri!("1.1", "unspecified"),
            Self::Email => name_id_uri!("1.1", "emailAddress"),
            Self::Persistent => name_id_uri!("2.0", "persistent"),
            Self::Transient => name_id_uri!("2.0", "transient"),
        }
    }

    /// Looks a format up by URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.uri() == uri)
    }
}

/// Top-level `StatusCode` values.
pub mod status_codes {
    /// The request succeeded.
    pub const SUCCESS: &str = status_uri!("Success");

    /// The IdP blames the request.
    pub const REQUESTER: &str = status_uri!("Requester");

    /// The IdP failed on its side.
    pub const RESPONDER: &str = status_uri!("Responder");
}
