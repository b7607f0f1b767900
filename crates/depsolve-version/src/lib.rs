//! Version algebra: tokens, versions, and interval-set version ranges.
//!
//! A [`Version`] is a sequence of dot/hyphen separated tokens with a total
//! ordering. A [`VersionRange`] is an ordered set of non-overlapping bounded
//! intervals supporting intersection, union, inversion and containment tests.
//! Both parse from the compact range syntax used in package requirements
//! (`1.2+`, `>=1.2,<2.0`, `1.2..2.0`, `==1.2.3`, `4|6+`).

pub mod errors;
pub mod range;
pub mod token;
pub mod version;

pub use errors::ParseError;
pub use range::{Bound, LowerBound, UpperBound, VersionRange};
pub use token::Token;
pub use version::Version;
