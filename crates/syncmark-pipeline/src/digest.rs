//! Integrity marks for regulatory submissions.
//!
//! The mark is a SHA-1 digest over the exact wire bytes of the document with
//! the mark element absent. It is inserted as the last child of the header
//! block by string insertion, so no other byte of the document changes and
//! stripping the element restores the digested bytes.

use serde::Serialize;
use sha1::{Digest, Sha1};
use std::fmt;
use std::str::FromStr;
use syncmark_connector::types::{ContentType, Payload};

use crate::error::DigestError;

/// Letter case of the hex digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HexCase {
    #[default]
    Lower,
    Upper,
}

impl HexCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HexCase::Lower => "lower",
            HexCase::Upper => "upper",
        }
    }
}

impl fmt::Display for HexCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HexCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lower" | "lowercase" => Ok(HexCase::Lower),
            "upper" | "uppercase" => Ok(HexCase::Upper),
            _ => Err(format!("invalid hex case '{s}', expected one of: lower, upper")),
        }
    }
}

/// Digest embedded into a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityMark {
    pub algorithm: String,
    pub hex_digest: String,
    pub insertion_path: String,
}

/// Computes, inserts, strips and verifies integrity marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMarker {
    element: String,
    attributes: String,
    header_element: String,
    hex_case: HexCase,
}

impl Default for DigestMarker {
    fn default() -> Self {
        Self {
            element: "IRmark".to_string(),
            attributes: r#"Type="generic""#.to_string(),
            header_element: "IRheader".to_string(),
            hex_case: HexCase::Lower,
        }
    }
}

impl DigestMarker {
    /// `IRmark` inside `IRheader`, lowercase hex.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_hex_case(mut self, hex_case: HexCase) -> Self {
        self.hex_case = hex_case;
        self
    }

    /// Use a different mark element and header block.
    #[must_use]
    pub fn with_elements(
        mut self,
        element: impl Into<String>,
        attributes: impl Into<String>,
        header_element: impl Into<String>,
    ) -> Self {
        self.element = element.into();
        self.attributes = attributes.into();
        self.header_element = header_element.into();
        self
    }

    pub fn hex_case(&self) -> HexCase {
        self.hex_case
    }

    fn header_close(&self) -> String {
        format!("</{}>", self.header_element)
    }

    /// SHA-1 of the bytes as hex in the configured case.
    pub fn digest_hex(&self, bytes: &[u8]) -> String {
        let digest = Sha1::digest(bytes);
        match self.hex_case {
            HexCase::Lower => hex::encode(digest),
            HexCase::Upper => hex::encode_upper(digest),
        }
    }

    /// Byte range of the first mark element, if any.
    fn find_mark(&self, document: &str) -> Option<(usize, usize)> {
        let open = format!("<{}", self.element);
        let close = format!("</{}>", self.element);
        let mut from = 0;

        while let Some(pos) = document[from..].find(&open) {
            let start = from + pos;
            let after_name = start + open.len();
            // Skip elements that merely share the prefix, e.g. <IRmarkType>
            match document[after_name..].chars().next() {
                Some('>') | Some('/') | Some(' ') | Some('\t') | Some('\r') | Some('\n') => {}
                _ => {
                    from = after_name;
                    continue;
                }
            }

            let tag_end = after_name + document[after_name..].find('>')?;
            if document[..tag_end].ends_with('/') {
                return Some((start, tag_end + 1));
            }
            let close_pos = tag_end + document[tag_end..].find(&close)?;
            return Some((start, close_pos + close.len()));
        }
        None
    }

    /// Remove every mark element (empty placeholders included).
    pub fn strip_mark(&self, document: &str) -> String {
        let mut stripped = document.to_string();
        while let Some((start, end)) = self.find_mark(&stripped) {
            stripped.replace_range(start..end, "");
        }
        stripped
    }

    /// Digest the document without its mark and insert the mark before the
    /// header closing tag.
    pub fn mark(&self, document: &str) -> Result<(String, IntegrityMark), DigestError> {
        let unmarked = self.strip_mark(document);
        let header_close = self.header_close();

        let mut positions = unmarked.match_indices(&header_close).map(|(i, _)| i);
        let insert_at = match (positions.next(), positions.next()) {
            (Some(pos), None) => pos,
            (None, _) => {
                return Err(DigestError::InsertionPointMissing {
                    marker: header_close,
                })
            }
            (Some(_), Some(_)) => {
                let count = unmarked.matches(&header_close).count();
                return Err(DigestError::AmbiguousInsertionPoint {
                    marker: header_close,
                    count,
                });
            }
        };

        let hex_digest = self.digest_hex(unmarked.as_bytes());
        let element = format!(
            "<{name} {attrs}>{hex_digest}</{name}>",
            name = self.element,
            attrs = self.attributes
        );

        let mut marked = String::with_capacity(unmarked.len() + element.len());
        marked.push_str(&unmarked[..insert_at]);
        marked.push_str(&element);
        marked.push_str(&unmarked[insert_at..]);

        Ok((
            marked,
            IntegrityMark {
                algorithm: "SHA-1".to_string(),
                hex_digest,
                insertion_path: format!("{}/{}", self.header_element, self.element),
            },
        ))
    }

    /// Mark an XML payload, keeping its content type.
    pub fn mark_payload(&self, payload: &Payload) -> Result<(Payload, IntegrityMark), DigestError> {
        if payload.content_type != ContentType::Xml {
            return Err(DigestError::UnsupportedPayload);
        }
        let (body, mark) = self.mark(&payload.body)?;
        Ok((Payload::xml(body), mark))
    }

    /// Digest value currently embedded in the document.
    pub fn embedded_digest<'a>(&self, document: &'a str) -> Option<&'a str> {
        let (start, end) = self.find_mark(document)?;
        let element = &document[start..end];
        let open_end = element.find('>')? + 1;
        let close_start = element.rfind("</")?;
        (open_end <= close_start).then(|| element[open_end..close_start].trim())
    }

    /// Recompute the digest of a marked document and compare.
    pub fn verify(&self, marked: &str) -> Result<bool, DigestError> {
        let embedded = self
            .embedded_digest(marked)
            .ok_or_else(|| DigestError::MarkMissing {
                element: self.element.clone(),
            })?;
        let expected = self.digest_hex(self.strip_mark(marked).as_bytes());
        Ok(embedded.eq_ignore_ascii_case(&expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILING: &str = "<GovTalkMessage><Body><IRenvelope><IRheader><Keys><Key Type=\"UTR\">1234567890</Key></Keys><PeriodEnd>2024-04-05</PeriodEnd></IRheader><SA100/></IRenvelope></Body></GovTalkMessage>";

    #[test]
    fn test_digest_of_known_input() {
        let marker = DigestMarker::new();
        assert_eq!(
            marker.digest_hex(b"<doc/>"),
            "98fd5af82f20af54ac5b84f3b4b02958bb10628e"
        );
        assert_eq!(
            marker.with_hex_case(HexCase::Upper).digest_hex(b"password"),
            "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8"
        );
    }

    #[test]
    fn test_mark_inserts_before_header_close() {
        let marker = DigestMarker::new();
        let (marked, mark) = marker.mark(FILING).unwrap();

        let expected_element = format!("<IRmark Type=\"generic\">{}</IRmark></IRheader>", mark.hex_digest);
        assert!(marked.contains(&expected_element));
        assert_eq!(marked.len(), FILING.len() + expected_element.len() - "</IRheader>".len());
        assert_eq!(mark.algorithm, "SHA-1");
        assert_eq!(mark.insertion_path, "IRheader/IRmark");
        assert_eq!(mark.hex_digest, marker.digest_hex(FILING.as_bytes()));
    }

    #[test]
    fn test_strip_restores_digested_bytes() {
        let marker = DigestMarker::new();
        let (marked, mark) = marker.mark(FILING).unwrap();

        let stripped = marker.strip_mark(&marked);
        assert_eq!(stripped, FILING);
        assert_eq!(marker.digest_hex(stripped.as_bytes()), mark.hex_digest);
    }

    #[test]
    fn test_placeholder_is_removed_before_digest() {
        let marker = DigestMarker::new();
        let with_placeholder = FILING.replace("</IRheader>", "<IRmark Type=\"generic\"/></IRheader>");

        let (from_placeholder, a) = marker.mark(&with_placeholder).unwrap();
        let (from_clean, b) = marker.mark(FILING).unwrap();
        assert_eq!(a, b);
        assert_eq!(from_placeholder, from_clean);
    }

    #[test]
    fn test_marking_twice_is_stable() {
        let marker = DigestMarker::new();
        let (once, _) = marker.mark(FILING).unwrap();
        let (twice, _) = marker.mark(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_insertion_point() {
        let err = DigestMarker::new().mark("<doc/>").unwrap_err();
        assert_eq!(
            err,
            DigestError::InsertionPointMissing {
                marker: "</IRheader>".into()
            }
        );
    }

    #[test]
    fn test_ambiguous_insertion_point() {
        let doc = "<a><IRheader></IRheader><IRheader></IRheader></a>";
        let err = DigestMarker::new().mark(doc).unwrap_err();
        assert!(matches!(err, DigestError::AmbiguousInsertionPoint { count: 2, .. }));
    }

    #[test]
    fn test_verify() {
        let marker = DigestMarker::new().with_hex_case(HexCase::Upper);
        let (marked, _) = marker.mark(FILING).unwrap();
        assert!(marker.verify(&marked).unwrap());

        let tampered = marked.replace("2024-04-05", "2024-04-06");
        assert!(!marker.verify(&tampered).unwrap());

        assert!(matches!(
            marker.verify(FILING),
            Err(DigestError::MarkMissing { .. })
        ));
    }

    #[test]
    fn test_similar_element_names_are_kept() {
        let marker = DigestMarker::new();
        let doc = "<IRheader><IRmarkType>x</IRmarkType></IRheader>";
        assert_eq!(marker.strip_mark(doc), doc);
    }

    #[test]
    fn test_json_payload_is_rejected() {
        let err = DigestMarker::new()
            .mark_payload(&Payload::json("{}"))
            .unwrap_err();
        assert_eq!(err, DigestError::UnsupportedPayload);
    }

    #[test]
    fn test_hex_case_parse() {
        assert_eq!("UPPER".parse::<HexCase>().unwrap(), HexCase::Upper);
        assert_eq!("lower".parse::<HexCase>().unwrap(), HexCase::Lower);
        assert!("mixed".parse::<HexCase>().is_err());
    }
}
