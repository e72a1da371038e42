use crate::errors::ImageError;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
    str,
    str::FromStr,
};

/// A digest securely identifies the specific contents of a binary object
///
/// Manifests and blobs are addressed by digest in the registry API. The
/// format part is normally `sha256`.
#[derive(Clone)]
pub struct ContentDigest {
    serialized: String,
    format_pos: Range<usize>,
    hex_pos: Range<usize>,
}

impl ContentDigest {
    /// Returns a reference to the string representation of a [ContentDigest]
    ///
    /// This string always has a single colon. After the colon are 32 or more
    /// lowercase hexadecimal digits. The format specifier before it is
    /// alphanumeric, with plus, dash, underscore, or dot characters allowed as
    /// separators between groups.
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Hash content with `sha256` and return its digest
    ///
    /// ```
    /// # use revprobe::ContentDigest;
    /// let digest = ContentDigest::from_content(b"cat");
    /// assert_eq!(digest.as_str(), "sha256:77af778b51abd4a3c51c5ddd97204a9c3ae614ebccb75a606c3b6865aed6744e");
    /// ```
    pub fn from_content(content_bytes: &[u8]) -> Self {
        let hex = format!("{:x}", Sha256::digest(content_bytes));
        let serialized = format!("sha256:{}", hex);
        ContentDigest {
            format_pos: 0.."sha256".len(),
            hex_pos: "sha256:".len()..serialized.len(),
            serialized,
        }
    }

    /// Parse a [prim@str] as a [ContentDigest]
    ///
    /// ```
    /// # use revprobe::ContentDigest;
    /// let digest = ContentDigest::parse("sha256:00112233445566778899aabbccddeeff").unwrap();
    /// assert_eq!(digest.format_str(), "sha256");
    /// assert_eq!(digest.hex_str(), "00112233445566778899aabbccddeeff")
    /// ```
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(&format!("^{}$", ContentDigest::regex_str())).unwrap();
        }
        let invalid = || ImageError::InvalidReferenceFormat(s.to_owned());
        let captures = RE.captures(s).ok_or_else(invalid)?;
        Ok(ContentDigest {
            serialized: s.to_owned(),
            format_pos: captures.name("dig_f").ok_or_else(invalid)?.range(),
            hex_pos: captures.name("dig_h").ok_or_else(invalid)?.range(),
        })
    }

    /// Return a reference to the format string portion of this digest
    pub fn format_str(&self) -> &str {
        &self.serialized[self.format_pos.clone()]
    }

    /// Return a reference to the hexadecimal string portion of this digest
    pub fn hex_str(&self) -> &str {
        &self.serialized[self.hex_pos.clone()]
    }

    /// Is this a `sha256` digest with all 64 hex digits?
    pub fn is_sha256(&self) -> bool {
        self.format_str() == "sha256" && self.hex_str().len() == 64
    }

    /// Check downloaded bytes against this digest
    ///
    /// Only `sha256` can be verified. Content addressed by any other format
    /// is accepted unchecked, with a debug log line.
    pub fn verify(&self, content_bytes: &[u8]) -> Result<(), ImageError> {
        if self.format_str() != "sha256" {
            log::debug!("can't verify {} digest, skipping", self.format_str());
            return Ok(());
        }
        let found = ContentDigest::from_content(content_bytes);
        if &found == self {
            Ok(())
        } else {
            Err(ImageError::ContentDigestMismatch {
                expected: self.clone(),
                found,
            })
        }
    }

    fn regex_str() -> &'static str {
        concat!(
            "(?P<dig>", // digest group
            /*  */ "(?P<dig_f>", // digest format group
            /* -- */ "(?:", // first format component
            /* -- -- */ "[a-zA-Z]",
            /* -- -- */ "[a-zA-Z0-9]*",
            /* -- */ ")",
            /* -- */ "(?:", // Additional format component
            /* -- -- */ "[-_+.]", // separators allowed in the digest format
            /* -- -- */ "[a-zA-Z]",
            /* -- -- */ "[a-zA-Z0-9]*",
            /* -- */ ")*",
            /*  */ ")", // end digest format group
            /*  */ "[:]", // Main separator
            /*  */ "(?P<dig_h>", // digest hex group
            /* -- */ "[a-f0-9]{32,}",
            /*  */ ")",
            ")",
        )
    }
}

impl Eq for ContentDigest {}

impl PartialEq for ContentDigest {
    fn eq(&self, other: &Self) -> bool {
        self.serialized.eq(&other.serialized)
    }
}

impl FromStr for ContentDigest {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentDigest::parse(s)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Hash for ContentDigest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialized.hash(state);
    }
}
