use crate::errors::ImageError;
use regex::Regex;
use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
    str,
    str::FromStr,
};
use url::Url;

/// Host suffix appended to short registry names
pub const DEFAULT_REGISTRY_SUFFIX: &str = ".azurecr.io";

/// Name of a Docker-style image registry server
///
/// This is a domain name, with an optional port. Typically the protocol is
/// https, but we keep the same heuristic Docker uses for development setups:
/// if a domain has no dots in it (`localhost:5000`), the protocol switches to
/// unencrypted http.
#[derive(Clone)]
pub struct Registry {
    serialized: String,
    domain_pos: Range<usize>,
    port: Option<u16>,
    is_https: bool,
}

impl Registry {
    /// Returns a reference to the string representation of a [Registry]
    ///
    /// Always a validated domain name with an optional port.
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Parse a [prim@str] as a [Registry]
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(&format!("^{}$", Registry::regex_str())).unwrap();
        }
        let captures = RE
            .captures(s)
            .ok_or_else(|| ImageError::InvalidReferenceFormat(s.to_owned()))?;
        let domain = captures
            .name("reg_d")
            .ok_or_else(|| ImageError::InvalidReferenceFormat(s.to_owned()))?;
        let port = match captures.name("reg_p") {
            None => None,
            Some(m) => Some(
                m.as_str()
                    .parse()
                    .map_err(|_| ImageError::InvalidReferenceFormat(s.to_owned()))?,
            ),
        };
        Ok(Registry {
            serialized: s.to_owned(),
            domain_pos: domain.range(),
            is_https: domain.as_str().contains('.'),
            port,
        })
    }

    /// Derive a registry host from a short registry name
    ///
    /// ```
    /// # use revprobe::Registry;
    /// let registry = Registry::from_short_name("example", ".azurecr.io").unwrap();
    /// assert_eq!(registry.as_str(), "example.azurecr.io");
    /// assert!(registry.is_https());
    /// ```
    pub fn from_short_name(name: &str, suffix: &str) -> Result<Self, ImageError> {
        Registry::parse(&format!("{}{}", name, suffix))
    }

    /// Returns a reference to the domain portion of the string
    pub fn domain_str(&self) -> &str {
        &self.serialized[self.domain_pos.clone()]
    }

    /// Returns the port, if present
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Are we using https to connect to the registry?
    pub fn is_https(&self) -> bool {
        self.is_https
    }

    /// The protocol to use, either "http" or "https"
    pub fn protocol_str(&self) -> &str {
        if self.is_https() {
            "https"
        } else {
            "http"
        }
    }

    /// Absolute URL for an endpoint path on this registry
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ImageError> {
        let base = Url::parse(&format!("{}://{}/", self.protocol_str(), self.serialized))?;
        Ok(base.join(path)?)
    }

    fn regex_str() -> &'static str {
        concat!(
            "(?P<reg>", // Main registry match group
            /*  */ "(?P<reg_d>", // registry domain match group
            /* -- */ "(?:", // First domain component
            /* -- -- */ "[a-zA-Z0-9]|",
            /* -- -- */ "[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]",
            /* -- */ ")",
            /* -- */ "(?:", // Optional additional domain components
            /* -- -- */ "\\.",
            /* -- -- */ "(?:",
            /* -- -- -- */ "[a-zA-Z0-9]|",
            /* -- -- -- */ "[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]",
            /* -- -- */ ")",
            /* -- */ ")*",
            /*  */ ")", // end registry domain match group
            /*  */ "(?:", // Optional port number
            /* -- */ "[:]",
            /* -- */ "(?P<reg_p>", // Registry port group
            /* -- -- */ "[0-9]+",
            /* -- */ ")",
            /*  */ ")?",
            ")",
        )
    }
}

impl Eq for Registry {}

impl PartialEq for Registry {
    fn eq(&self, other: &Self) -> bool {
        self.serialized.eq(&other.serialized)
    }
}

impl FromStr for Registry {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Registry::parse(s)
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Hash for Registry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialized.hash(state);
    }
}
