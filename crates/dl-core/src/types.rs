//! Identifier and value types with validation.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types and operation inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An amount was zero or negative.
    #[error("amount must be greater than zero, got {value}")]
    InvalidAmount { value: Decimal },

    /// A claim was submitted without a proof photo reference.
    #[error("a proof photo is required before a claim can be submitted")]
    MissingProof,

    /// An `other` claim was submitted without describing what it is for.
    #[error("claims of type other need a description")]
    MissingDescription,

    /// A date range whose end precedes its start.
    #[error("date range ends ({end}) before it starts ({start})")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Unknown claim category string.
    #[error("invalid claim category: {value}")]
    InvalidCategory { value: String },

    /// Recording the amount would push a balance or history total past what
    /// a decimal can hold.
    #[error("amount {value} is too large to record")]
    AmountOutOfRange { value: Decimal },

    /// A derived figure such as gross pay cannot be represented.
    #[error("{what} is too large to compute")]
    TotalOutOfRange { what: &'static str },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated driver identifier.
    ///
    /// Assigned by the upstream messaging platform and stable for the driver's
    /// lifetime. Numeric platform ids are carried as their decimal string.
    DriverId, "driver ID"
);

define_string_id!(
    /// Identity of a privileged caller that performed an action.
    AdminId, "admin ID"
);

define_string_id!(
    /// Opaque reference to an externally stored proof photo.
    ///
    /// Handed back unchanged to the photo store for later retrieval.
    ProofRef, "proof reference"
);

impl From<u64> for DriverId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for AdminId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Expense category of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "description", rename_all = "lowercase")]
pub enum ClaimCategory {
    Toll,
    Petrol,
    /// Anything else, described in free text by the driver.
    Other(String),
}

impl ClaimCategory {
    /// Builds a category from its stored kind and optional description.
    pub fn from_parts(kind: &str, description: Option<&str>) -> Result<Self, ValidationError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "toll" => Ok(Self::Toll),
            "petrol" => Ok(Self::Petrol),
            "other" => {
                let description = description.map(str::trim).unwrap_or_default();
                if description.is_empty() {
                    return Err(ValidationError::MissingDescription);
                }
                Ok(Self::Other(description.to_string()))
            }
            _ => Err(ValidationError::InvalidCategory {
                value: kind.to_string(),
            }),
        }
    }

    /// Kind string for database storage.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Toll => "toll",
            Self::Petrol => "petrol",
            Self::Other(_) => "other",
        }
    }

    /// Free-text description, present only for `other`.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Other(description) => Some(description),
            Self::Toll | Self::Petrol => None,
        }
    }
}

impl fmt::Display for ClaimCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(description) => write!(f, "{description}"),
            Self::Toll | Self::Petrol => write!(f, "{}", self.kind()),
        }
    }
}

/// Contact details kept for a driver, used for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub id: DriverId,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl DriverProfile {
    /// Creates a profile with no contact details.
    pub const fn new(id: DriverId) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
        }
    }

    /// Human-friendly name: `@username`, else first name, else `User <id>`.
    pub fn display_name(&self) -> String {
        if let Some(username) = non_blank(self.username.as_deref()) {
            return format!("@{username}");
        }
        non_blank(self.first_name.as_deref())
            .map_or_else(|| format!("User {}", self.id), str::to_string)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Returns an error unless `amount` is strictly positive.
pub fn require_positive(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount > Decimal::ZERO {
        Ok(amount)
    } else {
        Err(ValidationError::InvalidAmount { value: amount })
    }
}
