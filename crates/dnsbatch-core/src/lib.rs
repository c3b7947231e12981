// # dnsbatch-core
//
// Core library for reconciling a CSV device table with a DNS provider's
// hosted zone.
//
// ## Architecture Overview
//
// One run is a strictly sequential pipeline:
// - **ChangeBatch**: Device rows → A-record upserts (rows lacking url or
//   ipaddress are filtered out)
// - **Zone resolver**: URL base → hosted zone identifier
// - **SyncEngine**: Submits the batch, then polls until INSYNC or timeout
// - **DnsProvider**: Trait behind which the provider's API lives
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider implementations
// 2. **Injected Providers**: No ambient client state; tests substitute fakes
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: The binary is a thin layer over this crate

pub mod batch;
pub mod config;
pub mod devices;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod registry;
pub mod traits;
pub mod urlbase;
pub mod zone;

// Re-export core types for convenience
pub use batch::{ChangeBatch, ChangeRecord};
pub use config::{BatchConfig, DnsBatchConfig, ProviderConfig, SyncConfig};
pub use devices::DeviceRow;
pub use engine::{EngineEvent, SyncEngine, SyncOutcome, SyncReport};
pub use error::{Error, Result};
pub use inventory::DeviceInventory;
pub use registry::ProviderRegistry;
pub use traits::{ChangeInfo, ChangeStatus, DnsProvider, HostedZone};
pub use urlbase::UrlBase;
