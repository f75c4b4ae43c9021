//! Blacklist entry aggregate and the restriction reasons derived from it.

use chrono::{DateTime, Utc};

use super::PlayerId;

/// Display name recorded when the platform username could not be resolved.
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Notice shown to the restricted player when no public reason was given.
pub const DEFAULT_DISPLAY_REASON: &str = "You have been blacklisted from this experience.";

/// Prefix applied to the public reason when no hidden reason was given.
pub const PRIVATE_REASON_PREFIX: &str = "Blacklisted: ";

/// One moderation decision keyed by player.
///
/// ## Invariants
/// - At most one entry exists per `player_id` in the record store.
/// - `date_added` is set on creation and never rewritten; re-adding a player
///   after removal creates a fresh entry. Entries restored from storage may
///   carry no creation time when the stored value was missing or unreadable.
/// - Blank reasons are normalised to `None` and a blank username to
///   [`UNKNOWN_USERNAME`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistEntry {
    player_id: PlayerId,
    username: String,
    public_reason: Option<String>,
    hidden_reason: Option<String>,
    date_added: Option<DateTime<Utc>>,
}

impl BlacklistEntry {
    /// Build an entry, normalising blank text fields.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use moderation_bot::domain::{BlacklistEntry, PlayerId};
    ///
    /// let entry = BlacklistEntry::new(
    ///     PlayerId::new("123").expect("id"),
    ///     "  ",
    ///     Some("cheating".to_owned()),
    ///     None,
    ///     Utc::now(),
    /// );
    /// assert_eq!(entry.username(), "Unknown");
    /// assert_eq!(entry.hidden_reason(), None);
    /// ```
    pub fn new(
        player_id: PlayerId,
        username: impl Into<String>,
        public_reason: Option<String>,
        hidden_reason: Option<String>,
        date_added: DateTime<Utc>,
    ) -> Self {
        Self::restore(player_id, username, public_reason, hidden_reason, Some(date_added))
    }

    /// Rebuild a stored entry whose creation time may be unknown.
    pub fn restore(
        player_id: PlayerId,
        username: impl Into<String>,
        public_reason: Option<String>,
        hidden_reason: Option<String>,
        date_added: Option<DateTime<Utc>>,
    ) -> Self {
        let username = username.into();
        let username = if username.trim().is_empty() {
            UNKNOWN_USERNAME.to_owned()
        } else {
            username.trim().to_owned()
        };
        Self {
            player_id,
            username,
            public_reason: non_blank(public_reason),
            hidden_reason: non_blank(hidden_reason),
            date_added,
        }
    }

    /// Player this entry restricts.
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// Best-effort display name captured when the entry was created.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Reason shown to the player and in public listings.
    pub fn public_reason(&self) -> Option<&str> {
        self.public_reason.as_deref()
    }

    /// Internal-only moderator note.
    pub fn hidden_reason(&self) -> Option<&str> {
        self.hidden_reason.as_deref()
    }

    /// Creation timestamp, if one was recorded.
    pub fn date_added(&self) -> Option<DateTime<Utc>> {
        self.date_added
    }

    /// Reasons sent to the restriction API for this entry, with defaults
    /// substituted for fields that were never recorded.
    pub fn restriction_reasons(&self) -> RestrictionReasons {
        RestrictionReasons::resolve(self.public_reason(), self.hidden_reason())
    }
}

/// Reasons attached to a restriction in the remote platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionReasons {
    /// Text shown to the restricted player.
    pub display_reason: String,
    /// Moderator-only text stored alongside the restriction.
    pub private_reason: String,
}

impl RestrictionReasons {
    /// Resolve optional public and hidden reasons into the pair the remote API
    /// expects.
    ///
    /// # Examples
    /// ```
    /// use moderation_bot::domain::RestrictionReasons;
    ///
    /// let reasons = RestrictionReasons::resolve(Some("cheating"), None);
    /// assert_eq!(reasons.display_reason, "cheating");
    /// assert_eq!(reasons.private_reason, "Blacklisted: cheating");
    /// ```
    pub fn resolve(public_reason: Option<&str>, hidden_reason: Option<&str>) -> Self {
        let display_reason = public_reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_REASON)
            .to_owned();
        let private_reason = hidden_reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map_or_else(
                || format!("{PRIVATE_REASON_PREFIX}{display_reason}"),
                str::to_owned,
            );
        Self {
            display_reason,
            private_reason,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
