//! Structured parsing of IOS-XE command output into JSON trees.
//!
//! `parse_show_command` runs one supported show command and parses it;
//! `learn` builds a feature-level view (running config tree, VLAN table).

use anyhow::Result;
use serde_json::Value;

use crate::device::DeviceSession;

mod authentication;
mod dot1x;
mod interfaces;
mod mac_table;
mod running_config;
mod vlan;

pub use authentication::parse_authentication_sessions;
pub use dot1x::parse_dot1x_details;
pub use interfaces::parse_interfaces_status;
pub use mac_table::parse_mac_address_table;
pub use running_config::parse_running_config;
pub use vlan::parse_vlan_brief;

pub const SHOW_RUNNING_CONFIG: &str = "show running-config";
pub const SHOW_MAC_TABLE: &str = "show mac address-table";
pub const SHOW_DOT1X: &str = "show dot1x all details";
pub const SHOW_AUTH_SESSIONS: &str = "show authentication sessions";
pub const SHOW_INTERFACES_STATUS: &str = "show interfaces status";
pub const SHOW_VLAN_BRIEF: &str = "show vlan brief";

/// Typed error for show commands with no parser
#[derive(Debug)]
pub struct UnsupportedCommand {
    pub command: String,
}

impl std::fmt::Display for UnsupportedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No parser available for command: {}", self.command)
    }
}

impl std::error::Error for UnsupportedCommand {}

/// Features that can be learned from a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Config,
    Vlan,
}

/// Parse already-captured output for a supported show command
pub fn parse_output(command: &str, output: &str) -> Result<Value> {
    let parsed = match command {
        SHOW_RUNNING_CONFIG => parse_running_config(output),
        SHOW_MAC_TABLE => parse_mac_address_table(output),
        SHOW_DOT1X => parse_dot1x_details(output),
        SHOW_AUTH_SESSIONS => parse_authentication_sessions(output),
        SHOW_INTERFACES_STATUS => parse_interfaces_status(output),
        SHOW_VLAN_BRIEF => parse_vlan_brief(output),
        other => {
            return Err(UnsupportedCommand {
                command: other.to_string(),
            }
            .into())
        }
    };
    Ok(parsed)
}

/// Run a show command on the device and parse its output
pub async fn parse_show_command(device: &dyn DeviceSession, command: &str) -> Result<Value> {
    tracing::info!("{}: parsing '{}'", device.alias(), command);
    let output = device.execute(command).await?;
    parse_output(command, &output)
}

/// Learn a feature from the device
pub async fn learn(device: &dyn DeviceSession, feature: Feature) -> Result<Value> {
    let command = match feature {
        Feature::Config => SHOW_RUNNING_CONFIG,
        Feature::Vlan => SHOW_VLAN_BRIEF,
    };
    tracing::info!("{}: learning {:?}", device.alias(), feature);
    parse_show_command(device, command).await
}
