// # DNS Provider Trait
//
// Defines the interface to a hosted-zone DNS provider.
//
// ## Implementations
//
// - Route 53: `dnsbatch-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsbatch_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zones = provider.list_zones().await?;
//     let change = provider.submit_changes("Z0123456789", &batch).await?;
//     let change = provider.get_change(&change.id).await?;
//
//     Ok(())
// }
// ```

use crate::batch::ChangeBatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// A hosted zone as enumerated by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Fully qualified zone name, e.g. `example.com.`
    pub name: String,
    /// Provider resource identifier, e.g. `/hostedzone/Z0123456789`
    pub id: String,
}

impl HostedZone {
    /// Create a hosted zone entry
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Propagation status of a submitted change
///
/// Providers report exactly these two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// Accepted, not yet on all authoritative nameservers
    Pending,
    /// Propagated to all authoritative nameservers
    InSync,
}

impl ChangeStatus {
    /// Wire spelling of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Pending => "PENDING",
            ChangeStatus::InSync => "INSYNC",
        }
    }

    /// Whether the change has reached its terminal state
    pub fn is_in_sync(&self) -> bool {
        matches!(self, ChangeStatus::InSync)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ChangeStatus::Pending),
            "INSYNC" => Ok(ChangeStatus::InSync),
            other => Err(crate::Error::Other(format!(
                "Unknown change status: {other}"
            ))),
        }
    }
}

/// Tracking information for a submitted change batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeInfo {
    /// Provider change identifier
    pub id: String,
    /// Current propagation status
    pub status: ChangeStatus,
    /// When the provider accepted the batch
    pub submitted_at: Option<DateTime<Utc>>,
    /// Comment echoed back by the provider
    pub comment: Option<String>,
}

impl ChangeInfo {
    /// Create change tracking information without timestamp or comment
    pub fn new(id: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            id: id.into(),
            status,
            submitted_at: None,
            comment: None,
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Single-Shot Calls
///
/// Every method performs one logical API operation and reports its outcome.
/// Providers must not:
/// - retry failed calls or sleep between attempts (the engine owns polling)
/// - decide whether a change needs to be submitted
/// - cache zones or change status between calls
///
/// A provider MAY issue several HTTP requests for one call where the API
/// paginates (zone listing).
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every hosted zone visible to the configured credentials
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<HostedZone>)`: All zones, in provider order
    /// - `Err(Error)`: If the listing failed
    async fn list_zones(&self) -> Result<Vec<HostedZone>, crate::Error>;

    /// Submit a change batch as one atomic change request
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Bare zone identifier (no `/hostedzone/` prefix)
    /// - `batch`: The changes to apply
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeInfo)`: Tracking information, usually `PENDING`
    /// - `Err(Error::SubmissionFailed)`: The provider's message, verbatim
    async fn submit_changes(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, crate::Error>;

    /// Query the current status of a submitted change
    ///
    /// Read-only and side-effect free, so callers may repeat it freely.
    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
///
/// Creation is async because providers may need to resolve credentials and
/// region settings before they can issue requests.
#[async_trait]
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    async fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
