//! Request bodies for the user-restrictions endpoint.

use serde::Serialize;

use crate::domain::ports::RestrictionChange;

/// Restriction length sent with every apply: ten years.
pub(super) const RESTRICTION_DURATION: &str = "315360000s";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserRestrictionPatchDto<'a> {
    pub(super) game_join_restriction: GameJoinRestrictionDto<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GameJoinRestrictionDto<'a> {
    pub(super) active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) duration: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) private_reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) display_reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) exclude_alt_accounts: Option<bool>,
}

impl<'a> From<&'a RestrictionChange> for UserRestrictionPatchDto<'a> {
    fn from(change: &'a RestrictionChange) -> Self {
        let game_join_restriction = match change {
            RestrictionChange::Apply(reasons) => GameJoinRestrictionDto {
                active: true,
                duration: Some(RESTRICTION_DURATION),
                private_reason: Some(reasons.private_reason.as_str()),
                display_reason: Some(reasons.display_reason.as_str()),
                exclude_alt_accounts: Some(false),
            },
            RestrictionChange::Clear => GameJoinRestrictionDto {
                active: false,
                duration: None,
                private_reason: None,
                display_reason: None,
                exclude_alt_accounts: None,
            },
        };
        Self {
            game_join_restriction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RestrictionReasons;
    use serde_json::json;

    #[test]
    fn apply_body_carries_reasons_and_duration() {
        let change = RestrictionChange::Apply(RestrictionReasons::resolve(
            Some("exploiting"),
            Some("reported twice"),
        ));
        let body = serde_json::to_value(UserRestrictionPatchDto::from(&change)).expect("encode");
        assert_eq!(
            body,
            json!({
                "gameJoinRestriction": {
                    "active": true,
                    "duration": "315360000s",
                    "privateReason": "reported twice",
                    "displayReason": "exploiting",
                    "excludeAltAccounts": false
                }
            })
        );
    }

    #[test]
    fn clear_body_only_deactivates() {
        let body = serde_json::to_value(UserRestrictionPatchDto::from(&RestrictionChange::Clear))
            .expect("encode");
        assert_eq!(body, json!({ "gameJoinRestriction": { "active": false } }));
    }
}
