//! Macro for implementing Display and FromStr for configuration enums
//!
//! Configuration enums arrive as strings from environment variables and
//! request payloads (`MASK`, `REPLACE_WITH_PII_ENTITY_TYPE`, `PASS`, ...).
//! This macro gives each enum one canonical spelling for output and
//! case-insensitive parsing for input.
//!
//! # Example
//!
//! ```rust
//! use piiguard_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Policy {
//!     Allow,
//!     Deny,
//! }
//!
//! impl_domain_enum_conversions!(Policy {
//!     Allow => "ALLOW",
//!     Deny => "DENY",
//! });
//!
//! assert_eq!(Policy::Deny.to_string(), "DENY");
//! assert_eq!("allow".parse::<Policy>().unwrap(), Policy::Allow);
//! ```

/// Implements Display and FromStr traits for configuration enums
///
/// This macro generates:
/// - Display trait: writes the canonical string for each variant
/// - FromStr trait: parses case-insensitive strings to enum variants,
///   ignoring surrounding whitespace
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let candidate = s.trim();
                $(
                    if candidate.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
