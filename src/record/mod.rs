use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sessionstore_codec::{CodecError, CodecPipeline};
use std::collections::HashMap;

use crate::session::{DEFAULT_MAX_AGE, Session};


/// Table (collection) that session records live in.
pub const SESSIONS_TABLE: &str = "sessions";

/// Persisted shape of a session.
///
/// `data` is the codec-encoded `values` map and is opaque to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub data: String,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub expires_on: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_on <= now
    }
}

/// Record lifetime, in seconds, for a browser-session cookie (max-age 0).
/// The cookie carries no expiry of its own, so the record lives as long as
/// a default session would.
pub const SESSION_COOKIE_LIFETIME: i64 = DEFAULT_MAX_AGE;

/// Expiry for a save at `now` with `max_age` seconds.
///
/// With a prior expiry the result is the later of the two, so a save can
/// extend a record's life but never shorten it.
pub fn compute_expiry(prior: Option<DateTime<Utc>>, now: DateTime<Utc>, max_age: i64) -> DateTime<Utc> {
    let max_age = if max_age == 0 {
        SESSION_COOKIE_LIFETIME
    } else {
        max_age
    };
    let requested = TimeDelta::try_seconds(max_age)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(if max_age < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
    match prior {
        Some(prior) => prior.max(requested),
        None => requested,
    }
}

/// Build the record for `session` as of `now`, encoding its values.
pub fn to_record(
    codecs: &CodecPipeline,
    session: &Session,
    now: DateTime<Utc>,
) -> Result<SessionRecord, CodecError> {
    let data = codecs.encode(session.name(), &session.values)?;
    Ok(SessionRecord {
        id: session.id.clone(),
        data,
        created_on: session.created_on.unwrap_or(now),
        modified_on: now,
        expires_on: compute_expiry(session.expires_on, now, session.options.max_age),
    })
}

/// Decode `record` into `session`.
///
/// On error the session is left untouched, so the caller can carry on with
/// it as a fresh session.
pub fn from_record(
    codecs: &CodecPipeline,
    record: &SessionRecord,
    session: &mut Session,
) -> Result<(), CodecError> {
    let values: HashMap<String, Value> = codecs.decode(session.name(), &record.data)?;
    session.values = values;
    session.created_on = Some(record.created_on);
    session.expires_on = Some(record.expires_on);
    Ok(())
}
