// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::address::Address;

/// Directed code/data reference between two addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefEdge {
    from: Address,
    to: Address,
    #[serde(default)]
    kind: RefKind,
}

impl RefEdge {
    pub fn new(from: Address, to: Address, kind: RefKind) -> Self {
        Self { from, to, kind }
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// The address a reference row displays: the callee for outgoing rows, the caller for
    /// incoming rows.
    pub fn display_address(&self, direction: RefDirection) -> Address {
        match direction {
            RefDirection::Outgoing => self.to,
            RefDirection::Incoming => self.from,
        }
    }
}

/// Which side of the focused function a reference list describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefDirection {
    /// Calls made by the focused function.
    Outgoing,
    /// Calls made into the focused function.
    Incoming,
}

impl RefDirection {
    pub fn is_incoming(self) -> bool {
        self == Self::Incoming
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
        }
    }
}

impl fmt::Display for RefDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid reference direction (expected `outgoing` or `incoming`)")]
pub struct ParseRefDirectionError;

impl FromStr for RefDirection {
    type Err = ParseRefDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outgoing" | "out" | "from" => Ok(Self::Outgoing),
            "incoming" | "in" | "to" => Ok(Self::Incoming),
            _ => Err(ParseRefDirectionError),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    #[default]
    Call,
    Jump,
    Data,
}

impl RefKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Jump => "jump",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
