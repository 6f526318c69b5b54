//! Email address detection.
//!
//! A single fixed identifier grammar is matched against composed text:
//! `local-part@domain.tld`, where the local part is one-or-more of
//! letters, digits and `._%+-`, the domain is one-or-more of letters,
//! digits and `.-`, and the TLD is two-or-more letters. Matches are
//! bounded by word boundaries.

use regex::Regex;

/// The identifier grammar, unanchored, for scanning free text.
const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

/// Result of scanning a piece of text for email addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Unique matched values in first-occurrence order.
    pub values: Vec<String>,
    /// Whether any value matched at all.
    pub found: bool,
}

/// Detector for email-shaped identifiers.
///
/// Pure and stateless: [`EmailDetector::detect`] is deterministic for a
/// given input and performs no I/O.
#[derive(Debug)]
pub struct EmailDetector {
    scan: Regex,
    whole: Regex,
}

impl Default for EmailDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailDetector {
    /// Create a new detector with the built-in grammar compiled.
    ///
    /// # Panics
    ///
    /// Panics if the built-in pattern fails to compile, which would be a bug.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scan: Regex::new(EMAIL_PATTERN).expect("invalid email pattern"),
            whole: Regex::new(&format!("^(?:{EMAIL_PATTERN})$")).expect("invalid email pattern"),
        }
    }

    /// Scan `text` for email addresses.
    ///
    /// Deduplicates case-sensitively while preserving the order in which
    /// each distinct value first occurs.
    #[must_use]
    pub fn detect(&self, text: &str) -> Detection {
        let mut values: Vec<String> = Vec::new();
        for m in self.scan.find_iter(text) {
            let value = m.as_str();
            if !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }

        Detection {
            found: !values.is_empty(),
            values,
        }
    }

    /// Check whether `candidate` matches the grammar as a whole.
    ///
    /// Used for defensive re-validation of values that round-trip through
    /// the store or arrive from the CLI.
    #[must_use]
    pub fn is_valid(&self, candidate: &str) -> bool {
        self.whole.is_match(candidate)
    }
}
