//! Version tokens and their total ordering.
//!
//! A token is one delimiter-separated piece of a version number, e.g. the
//! `2`, `3` and `07b` in `2.3.07b`. Tokens split internally into alpha and
//! numeric sub-runs; numeric sub-runs compare by value, alpha sub-runs by
//! byte order, and numeric sorts below alpha. A purely numeric token is a
//! single numeric sub-run, so `2 < 2_ < 3` and `2 < 2a`.

use std::cmp::Ordering;
use std::fmt;

use crate::errors::ParseError;

/// One alpha or numeric run within a token.
#[derive(Debug, Clone, Eq, Hash)]
pub(crate) enum SubToken {
    /// Digit run, compared by value. Equal values order by the source text
    /// so differently padded numbers stay distinct ("01" < "1").
    Num { value: u64, text: String },
    /// Letter/underscore run, compared by byte order.
    Alpha(String),
}

impl PartialEq for SubToken {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for SubToken {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Num { value: a, text: ta }, Self::Num { value: b, text: tb }) => {
                a.cmp(b).then_with(|| ta.cmp(tb))
            }
            // Numeric runs sort below alpha runs.
            (Self::Num { .. }, Self::Alpha(_)) => Ordering::Less,
            (Self::Alpha(_), Self::Num { .. }) => Ordering::Greater,
            (Self::Alpha(a), Self::Alpha(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for SubToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num { text, .. } => f.write_str(text),
            Self::Alpha(s) => f.write_str(s),
        }
    }
}

/// A single version token.
#[derive(Debug, Clone, Eq, Hash)]
pub struct Token {
    subs: Vec<SubToken>,
}

impl Token {
    /// Parse a token string. Only `[0-9A-Za-z_]` characters are allowed and
    /// the token must be non-empty.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(ParseError::InvalidToken {
                token: s.to_string(),
            });
        }

        let mut subs = Vec::new();
        let mut run = String::new();
        let mut run_is_digit = false;
        for ch in s.chars() {
            let is_digit = ch.is_ascii_digit();
            if !run.is_empty() && is_digit != run_is_digit {
                subs.push(Self::make_sub(run, run_is_digit));
                run = String::new();
            }
            run_is_digit = is_digit;
            run.push(ch);
        }
        subs.push(Self::make_sub(run, run_is_digit));

        Ok(Self { subs })
    }

    fn make_sub(text: String, is_digit: bool) -> SubToken {
        if is_digit {
            // Saturate rather than fail on absurdly long digit runs; the
            // padding tie-break keeps the ordering total regardless.
            let value = text.parse::<u64>().unwrap_or(u64::MAX);
            SubToken::Num { value, text }
        } else {
            SubToken::Alpha(text)
        }
    }

    /// True if the token is a single digit run.
    pub fn is_numeric(&self) -> bool {
        matches!(self.subs.as_slice(), [SubToken::Num { .. }])
    }

    /// Numeric value, if the token is purely numeric.
    pub fn as_number(&self) -> Option<u64> {
        match self.subs.as_slice() {
            [SubToken::Num { value, .. }] => Some(*value),
            _ => None,
        }
    }

    /// The next largest token for upper-bound construction: `3` becomes
    /// `3_`, `beta` becomes `beta_`. Lowercase extensions such as `3a`
    /// sort above `3_` and thus outside the `[3, 3_)` interval.
    pub fn next(&self) -> Token {
        let mut subs = self.subs.clone();
        match subs.last_mut() {
            Some(SubToken::Alpha(s)) => s.push('_'),
            _ => subs.push(SubToken::Alpha("_".to_string())),
        }
        Token { subs }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.subs == other.subs
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.subs.cmp(&other.subs)
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sub in &self.subs {
            write!(f, "{sub}")?;
        }
        Ok(())
    }
}
