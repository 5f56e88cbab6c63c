// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: the PAN identifier itself and the result object printed
// by the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PanscanError, Result};

/// Length of a PAN in characters.
pub const PAN_LENGTH: usize = 10;

/// Message reported when the CLI is invoked with the wrong argument count.
pub const USAGE_MESSAGE: &str = "Please provide image path";

/// A Permanent Account Number in the AAAAA9999A shape.
///
/// Only the shape is checked (five ASCII uppercase letters, four ASCII digits,
/// one ASCII uppercase letter). The issuing authority's structural rules are
/// not enforced; see [`PanNumber::holder_type`] for the informational decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PanNumber(String);

impl PanNumber {
    /// Validate `candidate` and wrap it.
    pub fn parse(candidate: &str) -> Result<Self> {
        if Self::is_well_formed(candidate) {
            Ok(Self(candidate.to_owned()))
        } else {
            Err(PanscanError::InvalidPan(candidate.to_owned()))
        }
    }

    /// Whether `candidate` is exactly one PAN-shaped token.
    pub fn is_well_formed(candidate: &str) -> bool {
        let bytes = candidate.as_bytes();
        bytes.len() == PAN_LENGTH
            && bytes[..5].iter().all(u8::is_ascii_uppercase)
            && bytes[5..9].iter().all(u8::is_ascii_digit)
            && bytes[9].is_ascii_uppercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the fourth character, which the issuer uses for the holder
    /// category. Returns `None` for letters outside the published set.
    pub fn holder_type(&self) -> Option<HolderType> {
        HolderType::from_code(self.0.as_bytes()[3] as char)
    }
}

impl fmt::Display for PanNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PanNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PanNumber {
    type Err = PanscanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PanNumber {
    type Error = PanscanError;

    fn try_from(value: String) -> Result<Self> {
        if Self::is_well_formed(&value) {
            Ok(Self(value))
        } else {
            Err(PanscanError::InvalidPan(value))
        }
    }
}

impl From<PanNumber> for String {
    fn from(pan: PanNumber) -> Self {
        pan.0
    }
}

/// Holder category encoded in the fourth PAN character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolderType {
    Person,
    Company,
    /// Hindu Undivided Family.
    Huf,
    Firm,
    /// Association of Persons.
    AssociationOfPersons,
    Trust,
    /// Body of Individuals.
    BodyOfIndividuals,
    LocalAuthority,
    ArtificialJuridicalPerson,
    Government,
}

impl HolderType {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'P' => Some(Self::Person),
            'C' => Some(Self::Company),
            'H' => Some(Self::Huf),
            'F' => Some(Self::Firm),
            'A' => Some(Self::AssociationOfPersons),
            'T' => Some(Self::Trust),
            'B' => Some(Self::BodyOfIndividuals),
            'L' => Some(Self::LocalAuthority),
            'J' => Some(Self::ArtificialJuridicalPerson),
            'G' => Some(Self::Government),
            _ => None,
        }
    }
}

/// The single JSON object printed per invocation.
///
/// Exactly one of `panNumber` / `error` is present, keyed off `success`. The
/// fields are private and deserialization goes through the same check, so
/// every value upholds that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOutcome")]
pub struct ExtractionOutcome {
    success: bool,
    #[serde(rename = "panNumber", default, skip_serializing_if = "Option::is_none")]
    pan_number: Option<PanNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ExtractionOutcome {
    pub fn found(pan: PanNumber) -> Self {
        Self {
            success: true,
            pan_number: Some(pan),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            pan_number: None,
            error: Some(message.into()),
        }
    }

    /// The outcome printed when the CLI gets the wrong number of arguments.
    pub fn usage_error() -> Self {
        Self::failed(USAGE_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn pan_number(&self) -> Option<&PanNumber> {
        self.pan_number.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Serialize to a single line of JSON (no trailing newline).
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Unchecked wire shape of [`ExtractionOutcome`].
#[derive(Deserialize)]
struct RawOutcome {
    success: bool,
    #[serde(rename = "panNumber", default)]
    pan_number: Option<PanNumber>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawOutcome> for ExtractionOutcome {
    type Error = PanscanError;

    fn try_from(raw: RawOutcome) -> Result<Self> {
        match (raw.success, raw.pan_number, raw.error) {
            (true, Some(pan), None) => Ok(Self::found(pan)),
            (false, None, Some(error)) => Ok(Self::failed(error)),
            (success, pan, error) => Err(PanscanError::InvalidParameter(format!(
                "inconsistent outcome: success={success}, panNumber present={}, error present={}",
                pan.is_some(),
                error.is_some()
            ))),
        }
    }
}

impl From<Result<PanNumber>> for ExtractionOutcome {
    /// Flatten any pipeline failure into the uniform error shape.
    fn from(result: Result<PanNumber>) -> Self {
        match result {
            Ok(pan) => Self::found(pan),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}
