// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encoding of document identifiers. Human readable formats (JSON) carry a hex string, binary
//! formats (CBOR) the raw bytes.
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_bytes::{ByteBuf, Bytes};

use crate::id::DOCUMENT_ID_LEN;

pub(crate) fn serialize_id<S>(
    id: &[u8; DOCUMENT_ID_LEN],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if serializer.is_human_readable() {
        hex::encode(id).serialize(serializer)
    } else {
        Bytes::new(id).serialize(serializer)
    }
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<[u8; DOCUMENT_ID_LEN], D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bytes = if deserializer.is_human_readable() {
        let value = String::deserialize(deserializer)?;
        hex::decode(&value).map_err(D::Error::custom)?
    } else {
        ByteBuf::deserialize(deserializer)?.into_vec()
    };

    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| D::Error::invalid_length(len, &"16 identifier bytes"))
}
