//! Location-gated authorization for eventdesk writes
//!
//! Writes that set an event's type to the gated type must pass two sequential
//! lookups before anything is stored:
//! - [`LocationResolver`]: client network address to country code
//! - [`PartnerPermissionCheck`]: country code to an allow/deny decision
//!
//! [`AuthorizationGate`] orchestrates both and maps every outcome onto
//! [`GateError`]. Nothing is cached between requests.

pub mod error;
pub mod gate;
pub mod location;
pub mod partner;

pub use error::{GateError, GateResult, WriteIntent};
pub use gate::{Authorization, AuthorizationContext, AuthorizationGate};
pub use location::{is_loopback_address, CountryCode, GeoConfig, IpApiLocationResolver, LocationResolver};
pub use partner::{AdPartnerClient, PartnerConfig, PartnerPermissionCheck};
