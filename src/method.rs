//! HTTP method as a typed enum.
//!
//! Only the seven verbs an endpoint can register are represented. Anything
//! else (WebDAV verbs, `TRACE`, `CONNECT`, lowercase spellings) fails to parse
//! and is answered with `405 Method Not Allowed` by the router.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A verb an endpoint can register a handler for.
///
/// Variant order is the order used for the `allow` header and for iterating
/// [`Exports`](crate::Exports).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Every supported verb, in canonical order.
    pub const ALL: [Method; 7] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
        }
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1,
/// so `"get"` is rejected.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            _         => Err(Error::UnknownMethod(s.to_owned())),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = Error;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Delete  => http::Method::DELETE,
            Method::Get     => http::Method::GET,
            Method::Head    => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
            Method::Patch   => http::Method::PATCH,
            Method::Post    => http::Method::POST,
            Method::Put     => http::Method::PUT,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_verb() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("get".parse::<Method>().is_err());
        assert!("Post".parse::<Method>().is_err());
    }

    #[test]
    fn rejects_unsupported_verbs() {
        let err = "TRACE".parse::<Method>().unwrap_err();
        assert!(matches!(err, Error::UnknownMethod(ref m) if m == "TRACE"));
        assert!("".parse::<Method>().is_err());
    }

    #[test]
    fn converts_from_http_method() {
        assert_eq!(Method::try_from(&http::Method::PATCH).unwrap(), Method::Patch);
        assert!(Method::try_from(&http::Method::CONNECT).is_err());
        assert_eq!(http::Method::from(Method::Options), http::Method::OPTIONS);
    }

    #[test]
    fn canonical_order_matches_sorting() {
        let mut sorted = Method::ALL;
        sorted.sort();
        assert_eq!(sorted, Method::ALL);
    }
}
