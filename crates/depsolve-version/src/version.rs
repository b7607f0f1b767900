//! Versions: ordered token sequences with cosmetic separators.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ParseError;
use crate::token::Token;

/// A version number: zero or more tokens separated by `.` or `-`.
///
/// Separators are kept for display but ignored for comparison, so
/// `1.0.0 == 1-0-0`. Comparison is lexicographic over tokens and a strict
/// prefix ranks below, so `1.0 < 1.0.0 < 1.0.1`. The empty version is valid,
/// denotes an unversioned package, and is the smallest possible version.
#[derive(Debug, Clone, Eq)]
pub struct Version {
    tokens: Vec<Token>,
    seps: Vec<char>,
}

impl Version {
    /// The empty (smallest) version.
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            seps: Vec::new(),
        }
    }

    /// Parse a version string. The empty string parses to the empty version.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.is_empty() {
            return Ok(Self::new());
        }

        let mut tokens = Vec::new();
        let mut seps = Vec::new();
        let mut current = String::new();
        for ch in s.chars() {
            if ch == '.' || ch == '-' {
                if current.is_empty() {
                    return Err(ParseError::InvalidVersion {
                        input: s.to_string(),
                    });
                }
                tokens.push(Token::parse(&current)?);
                seps.push(ch);
                current.clear();
            } else {
                current.push(ch);
            }
        }
        if current.is_empty() {
            // Trailing separator.
            return Err(ParseError::InvalidVersion {
                input: s.to_string(),
            });
        }
        tokens.push(Token::parse(&current)?);

        Ok(Self { tokens, seps })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Semantic-versioning style accessors.
    pub fn major(&self) -> Option<&Token> {
        self.tokens.first()
    }

    pub fn minor(&self) -> Option<&Token> {
        self.tokens.get(1)
    }

    pub fn patch(&self) -> Option<&Token> {
        self.tokens.get(2)
    }

    /// The build component: tokens after the first `-` separator, if any.
    /// Build tokens take part in ordering like any trailing tokens.
    pub fn build(&self) -> Option<&[Token]> {
        self.seps
            .iter()
            .position(|&c| c == '-')
            .map(|i| &self.tokens[i + 1..])
    }

    /// A copy truncated to at most `len` tokens.
    pub fn trim(&self, len: usize) -> Version {
        Version {
            tokens: self.tokens.iter().take(len).cloned().collect(),
            seps: self.seps.iter().take(len.saturating_sub(1)).copied().collect(),
        }
    }

    /// The smallest version strictly greater than this one, e.g.
    /// `next(1.2)` is `1.2_`. Returns `None` for the empty version, whose
    /// successor would have to exceed every version.
    pub fn next(&self) -> Option<Version> {
        let mut tokens = self.tokens.clone();
        let last = tokens.last_mut()?;
        *last = last.next();
        Some(Version {
            tokens,
            seps: self.seps.clone(),
        })
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tokens.cmp(&other.tokens)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Separators are cosmetic; hash must agree with Eq.
        for token in &self.tokens {
            token.to_string().hash(state);
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.seps[i - 1])?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
