use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------      SessionId       --------------------------------------------------------
/// The checkout session identifier assigned by the payment provider. Doubles as the order key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for SessionId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------        UserId        --------------------------------------------------------
/// The paying user's identifier. Keys the owner record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------      FiscalYear      --------------------------------------------------------
/// An April-to-March fiscal year, identified by the calendar year it starts in.
///
/// Only four-digit years are accepted, matching the provider metadata contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiscalYear(i32);

#[derive(Debug, Clone, Error)]
#[error("Invalid fiscal year: {0}. Expected a 4-digit year, e.g. 2025")]
pub struct FiscalYearError(String);

impl FiscalYear {
    /// The calendar year the fiscal year starts in (April 1).
    pub fn starting_year(&self) -> i32 {
        self.0
    }

    /// The calendar year the fiscal year ends in (March 31).
    pub fn ending_year(&self) -> i32 {
        self.0 + 1
    }
}

impl FromStr for FiscalYear {
    type Err = FiscalYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FiscalYearError(s.to_string()));
        }
        let year = s.parse::<i32>().map_err(|_| FiscalYearError(s.to_string()))?;
        Ok(Self(year))
    }
}

impl Display for FiscalYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}
