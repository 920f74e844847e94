//! Impression requests and identifier list parsing.

use crate::error::{Error, Result};
use crate::types::{Hour, PublisherId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default separator inside identifier list cells.
pub const DEFAULT_ID_SEPARATOR: char = ',';

/// Parse a delimited list of integer identifiers into a set.
///
/// Tokens are trimmed. A blank list is the empty set; an empty or
/// non-integer token is an error naming `field`.
pub fn parse_id_list(field: &'static str, text: &str, separator: char) -> Result<BTreeSet<i64>> {
    if text.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    text.split(separator)
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|_| Error::malformed_ids(field, token))
        })
        .collect()
}

/// A request as it arrives from the transport, identifier lists still text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRequest {
    /// Offered price; absent when the caller omitted it.
    #[serde(default)]
    pub cpm: Option<f64>,
    /// First hour of the campaign window.
    pub hour_start: Hour,
    /// Last hour of the campaign window.
    pub hour_end: Hour,
    /// Delimited publisher ids.
    pub publishers: String,
    /// Declared audience size.
    #[serde(default)]
    pub audience_size: i64,
    /// Delimited user ids.
    pub user_ids: String,
}

impl RawRequest {
    /// Parse identifier lists using the default `,` separator.
    pub fn parse(&self) -> Result<Request> {
        self.parse_with(DEFAULT_ID_SEPARATOR)
    }

    /// Parse identifier lists using the given separator.
    pub fn parse_with(&self, separator: char) -> Result<Request> {
        Ok(Request {
            user_ids: parse_id_list("user_ids", &self.user_ids, separator)?,
            hour_start: self.hour_start,
            hour_end: self.hour_end,
            publishers: parse_id_list("publishers", &self.publishers, separator)?,
            cpm: self.cpm,
            audience_size: self.audience_size,
        })
    }
}

/// A parsed impression request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The cohort.
    pub user_ids: BTreeSet<UserId>,
    /// First hour of the campaign window; history before it is used.
    pub hour_start: Hour,
    /// Last hour of the campaign window.
    pub hour_end: Hour,
    /// Targeted publishers.
    pub publishers: BTreeSet<PublisherId>,
    /// Offered price.
    pub cpm: Option<f64>,
    /// Declared audience size.
    pub audience_size: i64,
}

impl Request {
    /// Window length in hours. Negative when the window is inverted; saturates at the `i64` bounds.
    #[inline]
    pub fn delay(&self) -> i64 {
        self.hour_end.saturating_sub(self.hour_start)
    }

    /// Whether the request targets the given publisher.
    #[inline]
    pub fn targets(&self, publisher: PublisherId) -> bool {
        self.publishers.contains(&publisher)
    }
}
