//! Capability flags combined per request and checked against operation
//! restrictions.

use bitflags::bitflags;
use http::Method;
use serde::{Deserialize, Serialize};

use crate::content::Format;

bitflags! {
    /// Request capability flags. The dispatcher unions caller-supplied,
    /// request-derived (verb, format), and route-derived flags, then checks
    /// them against an operation's restriction mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RequestAttributes: u32 {
        const HTTP_GET     = 1 << 0;
        const HTTP_POST    = 1 << 1;
        const HTTP_PUT     = 1 << 2;
        const HTTP_DELETE  = 1 << 3;
        const HTTP_PATCH   = 1 << 4;
        const HTTP_OTHER   = 1 << 5;

        const JSON         = 1 << 6;
        const XML          = 1 << 7;
        const JSV          = 1 << 8;
        const CSV          = 1 << 9;
        const SOAP11       = 1 << 10;
        const SOAP12       = 1 << 11;

        const SECURE       = 1 << 12;
        const INSECURE     = 1 << 13;
        const LOCALHOST    = 1 << 14;
        const EXTERNAL     = 1 << 15;
    }
}

impl RequestAttributes {
    pub fn from_method(method: &Method) -> Self {
        if *method == Method::GET {
            Self::HTTP_GET
        } else if *method == Method::POST {
            Self::HTTP_POST
        } else if *method == Method::PUT {
            Self::HTTP_PUT
        } else if *method == Method::DELETE {
            Self::HTTP_DELETE
        } else if *method == Method::PATCH {
            Self::HTTP_PATCH
        } else {
            Self::HTTP_OTHER
        }
    }

    pub fn from_format(format: Format) -> Self {
        match format {
            Format::Json => Self::JSON,
            Format::Xml => Self::XML,
            Format::Jsv => Self::JSV,
            Format::Csv => Self::CSV,
            Format::Soap11 => Self::SOAP11,
            Format::Soap12 => Self::SOAP12,
        }
    }
}

bitflags! {
    /// Scopes a metadata listing may be exposed to. Serializes as flag
    /// names so configs can spell `"LOCALHOST"` or `"LOCALHOST | EXTERNAL"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MetadataVisibility: u8 {
        const LOCALHOST = 1 << 0;
        const EXTERNAL  = 1 << 1;
    }
}

impl Default for MetadataVisibility {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_union_is_bitwise() {
        let attrs = RequestAttributes::from_method(&Method::POST)
            | RequestAttributes::from_format(Format::Json)
            | RequestAttributes::SECURE;
        assert!(attrs.contains(RequestAttributes::HTTP_POST));
        assert!(attrs.contains(RequestAttributes::JSON));
        assert!(!attrs.contains(RequestAttributes::XML));
    }

    #[test]
    fn unknown_methods_map_to_other() {
        assert_eq!(
            RequestAttributes::from_method(&Method::OPTIONS),
            RequestAttributes::HTTP_OTHER
        );
    }

    #[test]
    fn visibility_round_trips_as_flag_names() {
        let json = serde_json::to_string(&MetadataVisibility::LOCALHOST).unwrap();
        assert_eq!(json, "\"LOCALHOST\"");
        let back: MetadataVisibility = serde_json::from_str("\"LOCALHOST | EXTERNAL\"").unwrap();
        assert_eq!(back, MetadataVisibility::all());
    }
}
