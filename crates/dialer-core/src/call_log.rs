//! Call history
//!
//! [`CallLogViewer`] backs the call-log screen: it asks for the read-call-log
//! permission (independently of the call-placement permission) and loads the
//! most recent entries from the [`CallLogService`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DialerConfig;
use crate::error::{DialerError, DialerResult};
use crate::permission::PermissionGate;
use crate::platform::{CallLogService, PermissionDecision, PermissionKind, PermissionService};
use crate::session::format_duration;

/// Direction / outcome of a logged call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallType {
    Incoming,
    Outgoing,
    Missed,
    Voicemail,
    Rejected,
    Blocked,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallType::Incoming => "INCOMING",
            CallType::Outgoing => "OUTGOING",
            CallType::Missed => "MISSED",
            CallType::Voicemail => "VOICEMAIL",
            CallType::Rejected => "REJECTED",
            CallType::Blocked => "BLOCKED",
            CallType::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// One row of the device call history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub phone_number: String,
    pub call_type: CallType,
    /// Milliseconds since the Unix epoch
    pub timestamp_millis: i64,
    pub duration_seconds: u64,
}

impl CallLogEntry {
    /// When the call happened, if the platform timestamp is representable
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_millis).single()
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

pub struct CallLogViewer {
    gate: PermissionGate,
    service: Arc<dyn CallLogService>,
    limit: usize,
    has_permission: bool,
    entries: Vec<CallLogEntry>,
}

impl CallLogViewer {
    pub fn new(
        permission: Arc<dyn PermissionService>,
        service: Arc<dyn CallLogService>,
        config: &DialerConfig,
    ) -> Self {
        Self {
            gate: PermissionGate::new(
                permission,
                PermissionKind::ReadCallLog,
                config.call_log_permission.clone(),
            ),
            service,
            limit: config.call_log_limit,
            has_permission: false,
            entries: Vec::new(),
        }
    }

    pub fn has_permission(&self) -> bool {
        self.has_permission
    }

    /// Entries from the last successful refresh
    pub fn entries(&self) -> &[CallLogEntry] {
        &self.entries
    }

    /// Prompt for the read-call-log permission
    ///
    /// Anything but `Granted` (including "Ask Me Later") is a denial; the
    /// error carries the notice to show.
    pub async fn request_permission(&mut self) -> DialerResult<()> {
        match self.gate.request().await {
            PermissionDecision::Granted => {
                info!("Call log permission granted");
                self.has_permission = true;
                Ok(())
            }
            decision => {
                info!("Call log permission not granted ({:?})", decision);
                self.has_permission = false;
                Err(DialerError::PermissionDenied {
                    kind: PermissionKind::ReadCallLog,
                })
            }
        }
    }

    /// Load the most recent calls, asking for permission first if needed
    ///
    /// On a retrieval failure the previously loaded entries are kept.
    pub async fn refresh(&mut self) -> DialerResult<&[CallLogEntry]> {
        if !self.has_permission {
            self.request_permission().await?;
        }

        match self.service.load_recent_calls(self.limit).await {
            Ok(mut entries) => {
                entries.truncate(self.limit);
                info!("Loaded {} call log entries", entries.len());
                self.entries = entries;
                Ok(&self.entries)
            }
            Err(e) => {
                warn!("Error fetching call logs: {}", e);
                Err(e.into())
            }
        }
    }
}
