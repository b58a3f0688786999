//! Command and event wire types for the status surface.
//!
//! Commands arrive as JSON over the control socket, one request per line;
//! each returns a JSON result with a `success` flag. Status updates are
//! broadcast as `{"type":"statusUpdate",...}` events with no delivery
//! guarantee — an absent listener is not an error.

use serde::{Deserialize, Serialize};

use crate::classify::NetworkClass;

/// Commands accepted over the control socket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    Ping,
    GetStatus,
    ToggleEnabled,
    UpdateThreshold { value: f64 },
    ManualPause,
    ManualResume,
    ForceCheck,
}

/// Read-only projection of the controller's state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerStatus {
    pub enabled: bool,
    pub monitoring: bool,
    pub network_class: NetworkClass,
    pub paused_count: usize,
    pub threshold_mbps: f64,
}

/// Structured command result. Only the fields relevant to the command are
/// present on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ControllerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_mbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_class: Option<NetworkClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
}

impl CommandResponse {
    fn base(success: bool) -> Self {
        Self {
            success,
            error: None,
            status: None,
            count: None,
            enabled: None,
            threshold_mbps: None,
            network_class: None,
            timestamp_ms: None,
        }
    }

    pub fn ok() -> Self {
        Self::base(true)
    }

    pub fn err(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::base(false)
        }
    }

    /// The response for an unparseable request line.
    pub fn unknown_action() -> Self {
        Self::err("unknown action")
    }

    pub fn with_status(mut self, status: ControllerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_threshold(mut self, threshold_mbps: f64) -> Self {
        self.threshold_mbps = Some(threshold_mbps);
        self
    }

    pub fn with_class(mut self, class: NetworkClass) -> Self {
        self.network_class = Some(class);
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

/// Events pushed to any listening observer on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    StatusUpdate {
        network_class: NetworkClass,
        paused_count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_json_shapes() {
        let cmd: Command = serde_json::from_str(r#"{"action":"getStatus"}"#).unwrap();
        assert_eq!(cmd, Command::GetStatus);

        let cmd: Command =
            serde_json::from_str(r#"{"action":"updateThreshold","value":1.5}"#).unwrap();
        assert_eq!(cmd, Command::UpdateThreshold { value: 1.5 });

        let cmd: Command = serde_json::from_str(r#"{"action":"forceCheck"}"#).unwrap();
        assert_eq!(cmd, Command::ForceCheck);
    }

    #[test]
    fn unrecognized_action_fails_to_parse() {
        assert!(serde_json::from_str::<Command>(r#"{"action":"selfDestruct"}"#).is_err());
        assert!(serde_json::from_str::<Command>(r#"{"no":"action"}"#).is_err());
        let resp = serde_json::to_value(CommandResponse::unknown_action()).unwrap();
        assert_eq!(resp["success"], false);
        assert_eq!(resp["error"], "unknown action");
    }

    #[test]
    fn response_skips_absent_fields() {
        let json = serde_json::to_value(CommandResponse::ok().with_count(3)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 3);
        assert!(json.get("error").is_none());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn status_update_event_shape() {
        let event = Event::StatusUpdate {
            network_class: NetworkClass::Slow,
            paused_count: 2,
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["type"], "statusUpdate");
        assert_eq!(json["networkClass"], "slow");
        assert_eq!(json["pausedCount"], 2);
    }

    #[test]
    fn status_roundtrip() {
        let status = ControllerStatus {
            enabled: true,
            monitoring: true,
            network_class: NetworkClass::Fast,
            paused_count: 0,
            threshold_mbps: 0.7,
        };
        let json = serde_json::to_string(&status).unwrap();
        let parsed: ControllerStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
