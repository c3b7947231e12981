//! Core traits for dnsbatch
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: List hosted zones, submit change batches, query change status

pub mod dns_provider;

pub use dns_provider::{ChangeInfo, ChangeStatus, DnsProvider, DnsProviderFactory, HostedZone};
