//! Index store
//!
//! Persists a snapshot as one versioned JSON document per cache location.
//! Each entry is a flat record
//! `[path, isDirectory (0/1), created, modified, vcsHash?, contentHash?]`
//! where trailing absent fields are omitted and an absent field followed by
//! a present one is written as `null`.

pub mod persistence;

pub use persistence::IndexStore;

use crate::types::{EpochSeconds, FileEntry};
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Current schema version.
pub const INDEX_VERSION: u32 = 1;

/// Default index file name inside the cache directory.
pub const DEFAULT_INDEX_FILE: &str = "fastbuild-index.json";

/// On-disk document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    pub version: u32,
    /// Kept as raw values so one malformed record does not discard the rest.
    pub entries: Vec<serde_json::Value>,
}

/// One persisted entry, serialized as a JSON array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord(pub FileEntry);

impl Serialize for IndexRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entry = &self.0;
        let len = if entry.content_hash.is_some() {
            6
        } else if entry.vcs_hash.is_some() {
            5
        } else {
            4
        };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&entry.path)?;
        seq.serialize_element(&u8::from(entry.is_directory))?;
        seq.serialize_element(&entry.created)?;
        seq.serialize_element(&entry.modified)?;
        if len >= 5 {
            seq.serialize_element(&entry.vcs_hash)?;
        }
        if len == 6 {
            seq.serialize_element(&entry.content_hash)?;
        }
        seq.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = IndexRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an index record array of 4 to 6 elements")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<IndexRecord, A::Error> {
        let path: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let is_directory = match seq
            .next_element::<u8>()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?
        {
            0 => false,
            1 => true,
            other => {
                return Err(de::Error::invalid_value(
                    de::Unexpected::Unsigned(u64::from(other)),
                    &"0 or 1",
                ))
            }
        };
        let created: EpochSeconds = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;
        let modified: EpochSeconds = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(3, &self))?;
        let vcs_hash = seq.next_element::<Option<String>>()?.flatten();
        let content_hash = seq.next_element::<Option<String>>()?.flatten();
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(7, &self));
        }

        Ok(IndexRecord(FileEntry {
            path,
            is_directory,
            created,
            modified,
            vcs_hash,
            content_hash,
        }))
    }
}

impl<'de> Deserialize<'de> for IndexRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(RecordVisitor)
    }
}
