//! Zone resolver
//!
//! Maps a URL base to the provider's hosted zone identifier. Matching is an
//! exact string comparison against the fully qualified zone name: case and
//! the trailing dot both matter, and there is no fallback to a parent zone.

use crate::traits::{DnsProvider, HostedZone};
use crate::urlbase::UrlBase;
use crate::{Error, Result};
use tracing::debug;

/// Strip the resource path from a zone identifier
///
/// `/hostedzone/Z0123456789` becomes `Z0123456789`; a bare identifier is
/// returned unchanged.
pub fn bare_zone_id(resource_id: &str) -> &str {
    resource_id.rsplit('/').next().unwrap_or(resource_id)
}

/// Find the bare identifier of the zone named exactly `zone_name`
///
/// # Parameters
///
/// - `zones`: Zones as listed by the provider
/// - `zone_name`: Normalized zone name (no leading dot, trailing dot)
///
/// # Errors
///
/// [`Error::ZoneNotFound`] if no zone has that name.
pub fn find_zone_id(zones: &[HostedZone], zone_name: &str) -> Result<String> {
    zones
        .iter()
        .find(|zone| zone.name == zone_name)
        .map(|zone| bare_zone_id(&zone.id).to_string())
        .ok_or_else(|| {
            Error::zone_not_found(format!(
                "{} (searched {} zone(s))",
                zone_name,
                zones.len()
            ))
        })
}

/// List the provider's zones and resolve the one serving `url_base`
pub async fn resolve_zone_id(provider: &dyn DnsProvider, url_base: &UrlBase) -> Result<String> {
    let zone_name = url_base.zone_name();
    debug!("Looking up hosted zone for {}", zone_name);

    let zones = provider.list_zones().await?;
    let zone_id = find_zone_id(&zones, &zone_name)?;

    debug!("Found hosted zone {} for {}", zone_id, zone_name);
    Ok(zone_id)
}
