//! Intent classification.
//!
//! Each known destination is described by an [`IntentRule`]. Rules are
//! evaluated in declaration order and the first one with any passing check
//! wins, so when two rules could claim the same link the earlier one takes
//! it. Adding a destination means adding a rule to [`INTENT_RULES`].

use crate::constants::{
    MEDICAL_CHECK_REGISTRATION_PATH, MEDICAL_CHECK_REGISTRATION_TOKEN, VACCINE_REGISTRATION_PATH,
    VACCINE_REGISTRATION_TOKEN,
};
use crate::normalize::NormalizedLink;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    VaccineRegistration,
    MedicalCheckRegistration,
    Unhandled,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VaccineRegistration => "vaccine-registration",
            Self::MedicalCheckRegistration => "medical-check-registration",
            Self::Unhandled => "unhandled",
        }
    }

    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Unhandled)
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which check of a rule recognised the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchedBy {
    Path,
    Host,
    Substring,
}

/// Tokens that identify one intent.
#[derive(Clone, Copy, Debug)]
pub struct IntentRule {
    pub kind: IntentKind,
    /// Compared for equality with the normalised path.
    pub path: &'static str,
    /// Compared for equality with the host position of custom-scheme links.
    pub host_token: &'static str,
    /// Searched for, case-sensitively, anywhere in the raw link.
    pub substring: &'static str,
}

impl IntentRule {
    /// Path equality, then host equality, then raw substring.
    pub fn matches(&self, link: &NormalizedLink) -> Option<MatchedBy> {
        if link.path.as_deref() == Some(self.path) {
            return Some(MatchedBy::Path);
        }
        if link.host_token.as_deref() == Some(self.host_token) {
            return Some(MatchedBy::Host);
        }
        if link.raw_url.contains(self.substring) {
            return Some(MatchedBy::Substring);
        }
        None
    }
}

/// Known intents in precedence order.
pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        kind: IntentKind::VaccineRegistration,
        path: VACCINE_REGISTRATION_PATH,
        host_token: VACCINE_REGISTRATION_TOKEN,
        substring: VACCINE_REGISTRATION_TOKEN,
    },
    IntentRule {
        kind: IntentKind::MedicalCheckRegistration,
        path: MEDICAL_CHECK_REGISTRATION_PATH,
        host_token: MEDICAL_CHECK_REGISTRATION_TOKEN,
        substring: MEDICAL_CHECK_REGISTRATION_TOKEN,
    },
];

/// Classify a link against [`INTENT_RULES`].
pub fn classify(link: &NormalizedLink) -> IntentKind {
    classify_with(INTENT_RULES, link)
}

/// Classify a link against an explicit rule table.
pub fn classify_with(rules: &[IntentRule], link: &NormalizedLink) -> IntentKind {
    for rule in rules {
        if let Some(matched_by) = rule.matches(link) {
            tracing::debug!("deep link classified as {} by {:?}", rule.kind, matched_by);
            return rule.kind;
        }
    }
    IntentKind::Unhandled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn classifies_by_path() {
        let link = normalize("https://domain.com/medical-check-registration?registrationId=R9");
        assert_eq!(INTENT_RULES[1].matches(&link), Some(MatchedBy::Path));
        assert_eq!(classify(&link), IntentKind::MedicalCheckRegistration);
    }

    #[test]
    fn classifies_by_host_token() {
        let link = normalize("schoolmedical://vaccine-registration?eventId=E1");
        assert_eq!(INTENT_RULES[0].matches(&link), Some(MatchedBy::Host));
        assert_eq!(classify(&link), IntentKind::VaccineRegistration);
    }

    #[test]
    fn falls_back_to_raw_substring() {
        let link = normalize("not a url but mentions medical-check-registration");
        assert_eq!(INTENT_RULES[1].matches(&link), Some(MatchedBy::Substring));
        assert_eq!(classify(&link), IntentKind::MedicalCheckRegistration);
    }

    #[test]
    fn substring_match_is_case_sensitive() {
        let link = normalize("https://domain.com/Vaccine-Registration");
        assert_eq!(classify(&link), IntentKind::Unhandled);
    }

    #[test]
    fn unknown_and_malformed_links_are_unhandled() {
        for raw in ["https://domain.com/some-other-feature?x=1", "not a url", ""] {
            assert_eq!(classify(&normalize(raw)), IntentKind::Unhandled, "{raw}");
        }
    }

    #[test]
    fn earlier_rule_wins_when_both_could_match() {
        // Path says medical check, but the raw link also mentions vaccines.
        let link = normalize("https://domain.com/medical-check-registration?from=vaccine-registration");
        assert_eq!(classify(&link), IntentKind::VaccineRegistration);

        let reversed = [INTENT_RULES[1], INTENT_RULES[0]];
        assert_eq!(
            classify_with(&reversed, &link),
            IntentKind::MedicalCheckRegistration
        );
    }

    #[test]
    fn display_matches_serialised_name() {
        assert_eq!(IntentKind::VaccineRegistration.to_string(), "vaccine-registration");
        assert!(!IntentKind::Unhandled.is_handled());
    }
}
