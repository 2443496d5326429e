//! # SchoolMed Core
//!
//! Deep-link resolution for the SchoolMed mobile client.
//!
//! Links arrive from push notifications, emails and OS app links. This crate
//! turns each one into an in-app navigation instruction:
//! - [`normalize`]: reduce custom-scheme, development and production URLs to
//!   one [`NormalizedLink`] shape
//! - [`params`]: recover string parameters, structured query first and a
//!   manual fallback second
//! - [`intent`]: classify the link against the known destinations
//! - [`route`]: build the target screen path and forward allow-listed
//!   parameters
//! - [`dispatcher`]: own the live link subscription, defer the launch link
//!   until navigation is ready, and report failures to the user
//!
//! **No UI concerns**: screens, the REST client and the router itself are
//! collaborators reached through the traits in [`source`].

pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod intent;
pub mod normalize;
pub mod params;
pub mod route;
pub mod source;
pub mod validation;

pub use config::DeeplinkConfig;
pub use dispatcher::{Dispatcher, DispatcherState, LinkOutcome, MountedDispatcher};
pub use error::{DeeplinkError, DeeplinkResult};
pub use intent::{classify, IntentKind};
pub use normalize::{normalize, normalize_for_scheme, LinkShape, NormalizedLink};
pub use params::{extract, ParameterMap, ParameterSource, QueryValue};
pub use route::{build_route, resolve, resolve_for_scheme, Resolution, ResolvedRoute};
pub use source::{ChannelLinkSource, LinkSource, LinkSubscription, Navigator, Notifier};
