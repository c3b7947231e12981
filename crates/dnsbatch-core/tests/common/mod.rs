//! Test doubles and common utilities for pipeline contract tests
//!
//! This module provides a scripted provider that stands in for a real DNS
//! provider, plus helpers for writing device tables and draining events.

#![allow(dead_code)]

use async_trait::async_trait;
use dnsbatch_core::error::{Error, Result};
use dnsbatch_core::{ChangeBatch, ChangeInfo, ChangeStatus, DnsProvider, EngineEvent, HostedZone};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// Change identifier the scripted provider hands out
pub const CHANGE_ID: &str = "/change/C2682N5HXP0BZ4";

/// Shared call counters, so tests keep observing after the provider moves
/// into an engine
#[derive(Debug, Default)]
pub struct Calls {
    pub list_zones: AtomicUsize,
    pub submit: AtomicUsize,
    pub get_change: AtomicUsize,
    pub submitted: Mutex<Vec<(String, ChangeBatch)>>,
}

impl Calls {
    pub fn list_zones(&self) -> usize {
        self.list_zones.load(Ordering::SeqCst)
    }

    pub fn submit(&self) -> usize {
        self.submit.load(Ordering::SeqCst)
    }

    pub fn get_change(&self) -> usize {
        self.get_change.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(String, ChangeBatch)> {
        self.submitted.lock().unwrap().clone()
    }
}

/// A provider that replays a script of status query results
///
/// Once the script runs out, every further query reports PENDING.
pub struct ScriptedProvider {
    zones: Vec<HostedZone>,
    statuses: Mutex<VecDeque<Result<ChangeStatus>>>,
    submit_error: Option<String>,
    calls: Arc<Calls>,
}

impl ScriptedProvider {
    pub fn new(zones: Vec<HostedZone>) -> Self {
        Self {
            zones,
            statuses: Mutex::new(VecDeque::new()),
            submit_error: None,
            calls: Arc::new(Calls::default()),
        }
    }

    /// A provider serving only `example.com.` as `/hostedzone/ABC`
    pub fn example_com() -> Self {
        Self::new(vec![HostedZone::new("example.com.", "/hostedzone/ABC")])
    }

    /// Report INSYNC on the given (1-based) status query, PENDING before it
    pub fn in_sync_on_poll(self, poll: usize) -> Self {
        let mut script: Vec<Result<ChangeStatus>> =
            (1..poll).map(|_| Ok(ChangeStatus::Pending)).collect();
        script.push(Ok(ChangeStatus::InSync));
        self.with_script(script)
    }

    pub fn with_script(self, script: Vec<Result<ChangeStatus>>) -> Self {
        *self.statuses.lock().unwrap() = script.into();
        self
    }

    /// Reject every submission with this provider message
    pub fn rejecting(mut self, message: &str) -> Self {
        self.submit_error = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Arc<Calls> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl DnsProvider for ScriptedProvider {
    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        self.calls.list_zones.fetch_add(1, Ordering::SeqCst);
        Ok(self.zones.clone())
    }

    async fn submit_changes(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.submit_error {
            return Err(Error::submission(message.clone()));
        }

        self.calls
            .submitted
            .lock()
            .unwrap()
            .push((zone_id.to_string(), batch.clone()));
        Ok(ChangeInfo::new(CHANGE_ID, ChangeStatus::Pending))
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo> {
        self.calls.get_change.fetch_add(1, Ordering::SeqCst);
        let next = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ChangeStatus::Pending));

        next.map(|status| ChangeInfo::new(change_id, status))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Write a device table to a temporary file
pub fn device_table(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write table");
    file
}

/// Collect every event emitted so far
///
/// The engine must have been dropped, otherwise this waits forever.
pub async fn drain_events(rx: mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    ReceiverStream::new(rx).collect().await
}

/// Sync settings with the default 1s interval and 60s ceiling
pub fn default_sync() -> dnsbatch_core::SyncConfig {
    dnsbatch_core::SyncConfig::default()
}
