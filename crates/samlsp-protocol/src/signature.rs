//! XML signature verification seam.
//!
//! XML-DSig (canonicalization, digest and key checks) is left to an
//! injected [`SignatureVerifier`]. The response parser only decides *which*
//! signatures policy requires and hands the document over.

use crate::error::SamlResult;

/// Which signed element a verification call concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScope {
    /// The enveloped signature over the `samlp:Response`.
    Response,
    /// The enveloped signature over the `saml:Assertion`.
    Assertion,
}

impl SignatureScope {
    /// Local name of the signed element.
    #[must_use]
    pub const fn element(&self) -> &'static str {
        match self {
            Self::Response => "Response",
            Self::Assertion => "Assertion",
        }
    }
}

/// Verifies enveloped XML signatures against IdP signing certificates.
///
/// `certificates` are the base64 DER `X509Certificate` values published in
/// the IdP metadata.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies the signature over the element with `element_id`.
    ///
    /// Returns [`SamlError::SignatureInvalid`](crate::SamlError::SignatureInvalid)
    /// when the signature does not validate.
    fn verify(
        &self,
        document: &str,
        scope: SignatureScope,
        element_id: &str,
        certificates: &[String],
    ) -> SamlResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_elements() {
        assert_eq!(SignatureScope::Response.element(), "Response");
        assert_eq!(SignatureScope::Assertion.element(), "Assertion");
    }
}
