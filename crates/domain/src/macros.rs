//! Macros for implementing Display and FromStr on domain enums
//!
//! Two flavours are provided:
//! - [`impl_domain_status_conversions!`] for configuration and transport
//!   values rendered in lowercase (`"sqlite"`, `"created"`).
//! - [`impl_ical_value_conversions!`] for iCalendar property and parameter
//!   values rendered in uppercase (`"ACCEPTED"`, `"EMAIL"`).
//!
//! Both parse case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use calarm_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum DeliveryState {
//!     Pending,
//!     Sent,
//! }
//!
//! impl_domain_status_conversions!(DeliveryState {
//!     Pending => "pending",
//!     Sent => "sent",
//! });
//!
//! assert_eq!("SENT".parse::<DeliveryState>().unwrap(), DeliveryState::Sent);
//! ```

/// Implements Display and FromStr traits for lowercase status enums
///
/// This macro generates:
/// - Display trait: converts enum variants to lowercase strings
/// - FromStr trait: parses case-insensitive strings to enum variants
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

/// Implements `as_str`, Display and FromStr for iCalendar value enums
///
/// Values are rendered exactly as written in the mapping (uppercase by
/// convention) and parsed case-insensitively.
#[macro_export]
macro_rules! impl_ical_value_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// iCalendar representation of this value.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
