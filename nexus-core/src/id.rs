// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifiers for principals, entities and owned content.
use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::serde::{deserialize_id, serialize_id};

/// Size of identifiers generated by the document store.
pub const DOCUMENT_ID_LEN: usize = 16;

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; DOCUMENT_ID_LEN]);

        impl $name {
            /// Generate a fresh identifier from the given source of randomness.
            pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
                let mut bytes = [0; DOCUMENT_ID_LEN];
                rng.fill_bytes(&mut bytes);
                Self(bytes)
            }

            /// Create an identifier from its raw bytes representation.
            pub const fn from_bytes(bytes: [u8; DOCUMENT_ID_LEN]) -> Self {
                Self(bytes)
            }

            /// Bytes of the identifier.
            pub fn as_bytes(&self) -> &[u8; DOCUMENT_ID_LEN] {
                &self.0
            }

            /// Convert the identifier to a hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = IdError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                let checked_value: [u8; DOCUMENT_ID_LEN] = value
                    .try_into()
                    .map_err(|_| IdError::InvalidLength(value.len(), DOCUMENT_ID_LEN))?;
                Ok(Self(checked_value))
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::try_from(hex::decode(value)?.as_slice())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.to_hex()).finish()
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serialize_id(&self.0, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserialize_id(deserializer).map(Self)
            }
        }
    };
}

document_id!(
    /// Identifier of a resource, course or project, generated by the store on creation.
    EntityId
);

document_id!(
    /// Identifier of a material, announcement, assignment, submission or message.
    ContentId
);

/// Stable, opaque identifier of an authenticated user as handed out by the identity provider.
///
/// This is the foreign key used for every ownership and membership field.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Error types for document identifiers.
#[derive(Error, Debug)]
pub enum IdError {
    /// Identifier has an invalid length.
    #[error("invalid identifier length {0} bytes, expected {1} bytes")]
    InvalidLength(usize, usize),

    /// Identifier string contains invalid hexadecimal characters.
    #[error("invalid hex encoding in identifier string")]
    InvalidHexEncoding(#[from] hex::FromHexError),
}
