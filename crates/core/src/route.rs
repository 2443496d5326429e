//! Route building and the pure resolution pipeline.
//!
//! A [`RouteSpec`] fixes, per intent, the in-app screen path and the
//! parameter keys that may be forwarded to it. Anything not on the
//! allow-list is dropped before it reaches a screen.

use crate::constants::{
    DEFAULT_APP_SCHEME, MEDICAL_CHECK_CONSENT_TARGET, NEW_REGISTRATION_SEGMENT, PARAM_EVENT_ID,
    PARAM_PARENT_ID, PARAM_REGISTRATION_ID, PARAM_STUDENT_ID, VACCINE_REGISTRATION_TARGET,
};
use crate::intent::{classify, IntentKind};
use crate::normalize::{normalize_for_scheme, NormalizedLink};
use crate::params::{extract, ParameterMap, ParameterSource};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

/// Characters escaped when a parameter is placed in a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Navigation instruction handed to the router.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRoute {
    pub target_path: String,
    pub query: ParameterMap,
}

impl ResolvedRoute {
    /// The route as a single app-internal href, e.g.
    /// `/vaccinations/registration?eventId=E1`.
    pub fn href(&self) -> String {
        if self.query.is_empty() {
            return self.target_path.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{}", self.target_path, query)
    }
}

#[derive(Clone, Copy, Debug)]
enum Target {
    Fixed(&'static str),
    /// Base path followed by one segment taken from a parameter, or a default.
    /// The segment is percent-encoded, so it can differ from the verbatim
    /// value forwarded in the query.
    WithSegment {
        base: &'static str,
        param: &'static str,
        default: &'static str,
    },
}

/// Where an intent leads and which parameters it forwards.
#[derive(Clone, Copy, Debug)]
pub struct RouteSpec {
    target: Target,
    forwarded: &'static [&'static str],
}

const VACCINE_REGISTRATION_ROUTE: RouteSpec = RouteSpec {
    target: Target::Fixed(VACCINE_REGISTRATION_TARGET),
    forwarded: &[PARAM_EVENT_ID, PARAM_REGISTRATION_ID, PARAM_STUDENT_ID, PARAM_PARENT_ID],
};

const MEDICAL_CHECK_REGISTRATION_ROUTE: RouteSpec = RouteSpec {
    target: Target::WithSegment {
        base: MEDICAL_CHECK_CONSENT_TARGET,
        param: PARAM_REGISTRATION_ID,
        default: NEW_REGISTRATION_SEGMENT,
    },
    forwarded: &[PARAM_REGISTRATION_ID, PARAM_EVENT_ID, PARAM_STUDENT_ID, PARAM_PARENT_ID],
};

impl RouteSpec {
    pub fn for_intent(intent: IntentKind) -> Option<Self> {
        match intent {
            IntentKind::VaccineRegistration => Some(VACCINE_REGISTRATION_ROUTE),
            IntentKind::MedicalCheckRegistration => Some(MEDICAL_CHECK_REGISTRATION_ROUTE),
            IntentKind::Unhandled => None,
        }
    }

    pub fn forwarded_keys(&self) -> &'static [&'static str] {
        self.forwarded
    }

    pub fn build(&self, params: &ParameterMap) -> ResolvedRoute {
        let target_path = match self.target {
            Target::Fixed(path) => path.to_string(),
            Target::WithSegment {
                base,
                param,
                default,
            } => {
                let segment = params
                    .get(param)
                    .map(String::as_str)
                    .filter(|value| !value.is_empty())
                    .unwrap_or(default);
                format!("{}/{}", base, utf8_percent_encode(segment, PATH_SEGMENT))
            }
        };

        let query = self
            .forwarded
            .iter()
            .filter_map(|key| params.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect();

        ResolvedRoute { target_path, query }
    }
}

/// Build the route for a classified link. `None` means the link is not ours.
pub fn build_route(intent: IntentKind, params: &ParameterMap) -> Option<ResolvedRoute> {
    RouteSpec::for_intent(intent).map(|spec| spec.build(params))
}

/// Everything learned about one link on its way through the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub link: NormalizedLink,
    pub params: ParameterSource,
    pub intent: IntentKind,
    pub route: Option<ResolvedRoute>,
}

/// Run normalisation, extraction, classification and route building.
pub fn resolve(raw: &str) -> Resolution {
    resolve_for_scheme(raw, DEFAULT_APP_SCHEME)
}

pub fn resolve_for_scheme(raw: &str, app_scheme: &str) -> Resolution {
    let link = normalize_for_scheme(raw, app_scheme);
    let params = extract(&link);
    let intent = classify(&link);
    let empty = ParameterMap::new();
    let route = build_route(intent, params.map().unwrap_or(&empty));

    Resolution {
        link,
        params,
        intent,
        route,
    }
}
