//! Authorization gate for gated event types

use crate::error::{GateError, GateResult, WriteIntent};
use crate::location::{CountryCode, LocationResolver};
use crate::partner::PartnerPermissionCheck;
use eventdesk_types::EventType;
use std::sync::Arc;

/// Per-request record of a gated check. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    pub client_address: String,
    pub resolved_country_code: Option<CountryCode>,
    pub permission_granted: Option<bool>,
}

impl AuthorizationContext {
    fn new(client_address: &str) -> Self {
        Self {
            client_address: client_address.to_string(),
            resolved_country_code: None,
            permission_granted: None,
        }
    }
}

/// Successful gate outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// Target type is not gated; no lookups were made
    NotRequired,
    /// Both lookups ran and the partner granted permission
    Granted(AuthorizationContext),
}

/// Runs location resolution then the partner check for gated writes
#[derive(Clone)]
pub struct AuthorizationGate {
    locations: Arc<dyn LocationResolver>,
    partner: Arc<dyn PartnerPermissionCheck>,
}

impl AuthorizationGate {
    pub fn new(
        locations: Arc<dyn LocationResolver>,
        partner: Arc<dyn PartnerPermissionCheck>,
    ) -> Self {
        Self { locations, partner }
    }

    /// Decide whether a write setting `intended_type` may proceed.
    ///
    /// Non-gated types return immediately without touching either
    /// collaborator. For the gated type the partner is only asked after a
    /// country has been resolved; any failure aborts with no retry.
    pub async fn authorize(
        &self,
        intended_type: EventType,
        client_address: &str,
        intent: WriteIntent,
    ) -> GateResult<Authorization> {
        if !intended_type.is_gated() {
            return Ok(Authorization::NotRequired);
        }

        let mut context = AuthorizationContext::new(client_address);

        let country = self
            .locations
            .resolve_country(client_address)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Location lookup failed");
                e
            })?;
        context.resolved_country_code = Some(country.clone());

        let granted = self
            .partner
            .check_permission(&country)
            .await
            .map_err(|e| {
                tracing::warn!(country_code = %country, error = %e, "Ad partner check failed");
                e
            })?;
        context.permission_granted = Some(granted);

        if !granted {
            tracing::warn!(
                country_code = %country,
                intent = %intent,
                "Ad partner denied ads event write"
            );
            return Err(GateError::NotAuthorized(intent));
        }

        tracing::info!(country_code = %country, intent = %intent, "Ads event write authorized");
        Ok(Authorization::Granted(context))
    }
}
