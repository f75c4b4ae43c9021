//! Stored record shapes for the `Blacklist` and `Players` trees.
//!
//! Records are decoded into these DTOs first, then mapped into domain types
//! in one pass.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::ports::{LoginRecord, PlayerActivityRecord};
use crate::domain::{BlacklistEntry, PlayerId};

/// Stored blacklist record.
///
/// Every field is optional on read so records written by older tooling still
/// load: text fields accept numbers, and `DateAdded` accepts RFC 3339 text or
/// epoch milliseconds. Unreadable values decode as absent.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct BlacklistRecordDto {
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) username: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub(super) public_reason: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub(super) hidden_reason: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_date_added",
        skip_serializing_if = "Option::is_none"
    )]
    pub(super) date_added: Option<DateTime<Utc>>,
}

impl From<&BlacklistEntry> for BlacklistRecordDto {
    fn from(entry: &BlacklistEntry) -> Self {
        Self {
            username: Some(entry.username().to_owned()),
            public_reason: entry.public_reason().map(str::to_owned),
            hidden_reason: entry.hidden_reason().map(str::to_owned),
            date_added: entry.date_added(),
        }
    }
}

impl BlacklistRecordDto {
    pub(super) fn into_entry(self, player_id: PlayerId) -> BlacklistEntry {
        BlacklistEntry::restore(
            player_id,
            self.username.unwrap_or_default(),
            self.public_reason,
            self.hidden_reason,
            self.date_added,
        )
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_date_added<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| parse_date_added(&value)))
}

fn parse_date_added(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|date| date.with_timezone(&Utc)),
        Value::Number(millis) => millis.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Children stored either as an array or as a keyed object.
///
/// Arrays appear when every key is a small integer; object keys sort in
/// insertion order for push-generated keys.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ChildrenDto<T> {
    List(Vec<Option<T>>),
    Keyed(BTreeMap<String, T>),
}

impl<T> ChildrenDto<T> {
    fn into_values(self) -> Vec<T> {
        match self {
            Self::List(items) => items.into_iter().flatten().collect(),
            Self::Keyed(items) => items.into_values().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct LoginDto {
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

impl From<LoginDto> for LoginRecord {
    fn from(login: LoginDto) -> Self {
        let timestamp = match login.timestamp {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Self {
            timestamp,
            country_code: login.country_code.unwrap_or_default().to_uppercase(),
            timezone: login.timezone.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct PlayerRecordDto {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    logins: Option<ChildrenDto<LoginDto>>,
    #[serde(default)]
    timezones: Option<ChildrenDto<String>>,
}

impl PlayerRecordDto {
    pub(super) fn into_record(self, player_id: PlayerId) -> PlayerActivityRecord {
        PlayerActivityRecord {
            player_id,
            username: self
                .username
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
            logins: self
                .logins
                .map(ChildrenDto::into_values)
                .unwrap_or_default()
                .into_iter()
                .map(LoginRecord::from)
                .collect(),
            timezones: self
                .timezones
                .map(ChildrenDto::into_values)
                .unwrap_or_default(),
        }
    }
}
