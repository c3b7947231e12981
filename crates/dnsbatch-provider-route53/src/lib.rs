// # Route 53 DNS Provider
//
// This crate provides an AWS Route 53 provider implementation for dnsbatch.
//
// ## Behavior
//
// - One logical API operation per trait call (zone listing may page)
// - Full error propagation to the engine (the engine owns polling and retry)
// - Credentials resolved by the AWS default chain: environment, shared
//   config/credentials files, SSO, container and instance metadata
// - No caching, no background tasks
//
// ## Zone Listing Pagination
//
// ListHostedZones returns at most 100 zones per page. `list_zones` follows
// `NextMarker` until the listing is complete, so accounts with many zones
// still resolve.
//
// ## API Reference
//
// - ListHostedZones: GET `/2013-04-01/hostedzone`
// - ChangeResourceRecordSets: POST `/2013-04-01/hostedzone/{Id}/rrset`
// - GetChange: GET `/2013-04-01/change/{Id}`

use async_trait::async_trait;
use aws_sdk_route53::config::Region;
use aws_sdk_route53::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_route53::types::{
    Change as SdkChange, ChangeAction as SdkChangeAction, ChangeBatch as SdkChangeBatch,
    ChangeInfo as SdkChangeInfo, HostedZone as SdkHostedZone, ResourceRecord as SdkResourceRecord,
    ResourceRecordSet as SdkResourceRecordSet, RrType,
};
use chrono::{DateTime, Utc};
use dnsbatch_core::batch::{ChangeAction, ChangeRecord, RecordType};
use dnsbatch_core::config::ProviderConfig;
use dnsbatch_core::traits::{DnsProviderFactory, HostedZone};
use dnsbatch_core::{ChangeBatch, ChangeInfo, ChangeStatus, DnsProvider, Error, Result};

/// Provider type name used in the registry and in error messages
pub const PROVIDER_NAME: &str = "route53";

/// AWS Route 53 DNS provider
///
/// Holds an SDK client and nothing else. The client is either built from
/// the AWS default configuration chain ([`Route53Provider::from_env`]) or
/// injected ([`Route53Provider::from_client`]).
#[derive(Debug, Clone)]
pub struct Route53Provider {
    /// Route 53 API client
    client: aws_sdk_route53::Client,
}

impl Route53Provider {
    /// Wrap an existing Route 53 client
    pub fn from_client(client: aws_sdk_route53::Client) -> Self {
        Self { client }
    }

    /// Build a provider from the AWS default configuration chain
    ///
    /// # Parameters
    ///
    /// - `region`: Optional region override
    /// - `profile`: Optional named profile from the shared config files
    pub async fn from_env(region: Option<String>, profile: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        let sdk_config = loader.load().await;
        tracing::debug!(
            "Loaded AWS configuration (region: {})",
            sdk_config
                .region()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        );

        Self::from_client(aws_sdk_route53::Client::new(&sdk_config))
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    /// List every hosted zone, following pagination markers
    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .client
                .list_hosted_zones()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| Error::provider(PROVIDER_NAME, sdk_error_message(&e)))?;

            zones.extend(page.hosted_zones().iter().map(hosted_zone_from_sdk));

            match page.next_marker() {
                Some(next) if page.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        tracing::debug!("Listed {} hosted zone(s)", zones.len());
        Ok(zones)
    }

    async fn submit_changes(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        let sdk_batch = to_sdk_change_batch(batch)?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(sdk_batch)
            .send()
            .await
            .map_err(|e| Error::submission(sdk_error_message(&e)))?;

        let info = output.change_info().ok_or_else(|| {
            Error::provider(PROVIDER_NAME, "Invalid response: ChangeInfo missing")
        })?;
        change_info_from_sdk(info)
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo> {
        let output = self
            .client
            .get_change()
            .id(change_id)
            .send()
            .await
            .map_err(|e| Error::change_status(sdk_error_message(&e)))?;

        let info = output.change_info().ok_or_else(|| {
            Error::provider(PROVIDER_NAME, "Invalid response: ChangeInfo missing")
        })?;
        change_info_from_sdk(info)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Convert a listed zone
fn hosted_zone_from_sdk(zone: &SdkHostedZone) -> HostedZone {
    HostedZone::new(zone.name(), zone.id())
}

/// Convert the provider's change tracking information
fn change_info_from_sdk(info: &SdkChangeInfo) -> Result<ChangeInfo> {
    let status: ChangeStatus = info
        .status()
        .as_str()
        .parse()
        .map_err(|e: Error| Error::provider(PROVIDER_NAME, e.to_string()))?;

    let submitted = info.submitted_at();
    let submitted_at = DateTime::<Utc>::from_timestamp(submitted.secs(), submitted.subsec_nanos());

    Ok(ChangeInfo {
        id: info.id().to_string(),
        status,
        submitted_at,
        comment: info.comment().map(str::to_string),
    })
}

/// Build the SDK change batch from ours
fn to_sdk_change_batch(batch: &ChangeBatch) -> Result<SdkChangeBatch> {
    let changes = batch
        .changes()
        .iter()
        .map(to_sdk_change)
        .collect::<Result<Vec<_>>>()?;

    SdkChangeBatch::builder()
        .set_changes(Some(changes))
        .comment(batch.comment())
        .build()
        .map_err(|e| Error::provider(PROVIDER_NAME, format!("Invalid change batch: {}", e)))
}

fn to_sdk_change(change: &ChangeRecord) -> Result<SdkChange> {
    let build_error = |e: aws_sdk_route53::error::BuildError| {
        Error::provider(
            PROVIDER_NAME,
            format!("Invalid change for {}: {}", change.name(), e),
        )
    };

    let records = change
        .record_set
        .resource_records
        .iter()
        .map(|r| SdkResourceRecord::builder().value(&r.value).build())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(build_error)?;

    let record_type = match change.record_set.record_type {
        RecordType::A => RrType::A,
    };

    let record_set = SdkResourceRecordSet::builder()
        .name(change.name())
        .r#type(record_type)
        .ttl(i64::from(change.record_set.ttl))
        .set_resource_records(Some(records))
        .build()
        .map_err(build_error)?;

    let action = match change.action {
        ChangeAction::Upsert => SdkChangeAction::Upsert,
    };

    SdkChange::builder()
        .action(action)
        .resource_record_set(record_set)
        .build()
        .map_err(build_error)
}

/// Error message as the service reported it, or the full error chain for
/// transport failures
fn sdk_error_message<E, R>(err: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let Some(service) = err.as_service_error() {
        match (service.code(), service.message()) {
            (Some(code), Some(message)) => return format!("{code}: {message}"),
            (None, Some(message)) => return message.to_string(),
            _ => {}
        }
    }
    DisplayErrorContext(err).to_string()
}

/// Factory for creating Route 53 providers
pub struct Route53Factory;

#[async_trait]
impl DnsProviderFactory for Route53Factory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Route53 { region, profile } => {
                config.validate()?;
                Ok(Box::new(
                    Route53Provider::from_env(region.clone(), profile.clone()).await,
                ))
            }
            _ => Err(Error::config("Invalid config for Route 53 provider")),
        }
    }
}

/// Register the Route 53 provider with a registry
///
/// # Example
///
/// ```rust
/// use dnsbatch_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// dnsbatch_provider_route53::register(&registry);
/// assert!(registry.has_provider("route53"));
/// ```
pub fn register(registry: &dnsbatch_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(Route53Factory));
}
