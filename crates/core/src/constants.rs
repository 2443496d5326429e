//! Constants used throughout the deep-link crate.
//!
//! Intent tokens, route templates and parameter names live here so the
//! classifier and the route builder cannot drift apart.

use std::time::Duration;

/// Custom URL scheme registered by the mobile app.
pub const DEFAULT_APP_SCHEME: &str = "schoolmedical";

/// Grace period before the launch link is dispatched.
pub const DEFAULT_LAUNCH_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound accepted for a configured launch delay.
pub const MAX_LAUNCH_DELAY: Duration = Duration::from_secs(30);

/// Path prefix Expo development servers put in front of the app path.
pub const EXPO_PATH_PREFIX: &str = "/--";

/// Schemes used by local development builds.
pub const DEV_SCHEMES: &[&str] = &["exp", "exps"];

/// Hosts treated as local development servers when reached over plain HTTP.
pub const DEV_HOSTS: &[&str] = &["localhost", "localhost.localdomain"];

pub const VACCINE_REGISTRATION_TOKEN: &str = "vaccine-registration";
pub const VACCINE_REGISTRATION_PATH: &str = "/vaccine-registration";
pub const VACCINE_REGISTRATION_TARGET: &str = "/vaccinations/registration";

pub const MEDICAL_CHECK_REGISTRATION_TOKEN: &str = "medical-check-registration";
pub const MEDICAL_CHECK_REGISTRATION_PATH: &str = "/medical-check-registration";
pub const MEDICAL_CHECK_CONSENT_TARGET: &str = "/checkups/consent";

/// Segment used for a consent screen opened without a registration.
pub const NEW_REGISTRATION_SEGMENT: &str = "new";

pub const PARAM_EVENT_ID: &str = "eventId";
pub const PARAM_REGISTRATION_ID: &str = "registrationId";
pub const PARAM_STUDENT_ID: &str = "studentId";
pub const PARAM_PARENT_ID: &str = "parentId";

pub const DEFAULT_ERROR_TITLE: &str = "Link error";
pub const DEFAULT_ERROR_MESSAGE: &str = "We could not open this link. Please try again from the app.";
