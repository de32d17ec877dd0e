use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_ssh_port() -> u16 {
    22
}

fn default_protocol() -> String {
    "ssh".to_string()
}

/// Testbed describes the devices a migration run connects to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testbed {
    #[serde(default)]
    pub testbed: TestbedInfo,
    #[serde(default)]
    pub devices: BTreeMap<String, TestbedDevice>,
}

/// Top-level testbed block with shared defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestbedInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub credentials: BTreeMap<String, Credential>,
}

/// A single network device in the testbed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestbedDevice {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub credentials: BTreeMap<String, Credential>,
    pub connections: Connections,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connections {
    pub cli: CliConnection,
}

/// CLI management connection for a device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConnection {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub ip: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
}

/// Username/password pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// A device with its name, alias and credentials resolved, ready to connect
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    pub name: String,
    pub alias: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}
