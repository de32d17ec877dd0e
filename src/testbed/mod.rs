use anyhow::{Context, Result};
use std::path::Path;

use crate::models::{Credential, DeviceTarget, Testbed};

const DEFAULT_CREDENTIAL: &str = "default";

/// Load a testbed YAML file, substituting %ENV{NAME} references
pub fn load(path: impl AsRef<Path>) -> Result<Testbed> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read testbed file {}", path.display()))?;
    parse(&raw).with_context(|| format!("Invalid testbed file {}", path.display()))
}

/// Parse testbed YAML text
pub fn parse(raw: &str) -> Result<Testbed> {
    let expanded = substitute_env(raw, |name| std::env::var(name).ok())?;
    let testbed: Testbed = serde_yaml::from_str(&expanded)?;
    Ok(testbed)
}

/// Replace every %ENV{NAME} with the value returned by `lookup`
fn substitute_env<F>(raw: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = regex_lite::Regex::new(r"%ENV\{(\w+)\}")?;
    let mut missing = Vec::new();
    let result = re.replace_all(raw, |caps: &regex_lite::Captures| {
        let name = &caps[1];
        match lookup(name) {
            Some(value) => value,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });
    if !missing.is_empty() {
        anyhow::bail!("Environment variables not set: {}", missing.join(", "));
    }
    Ok(result.into_owned())
}

impl Testbed {
    /// Resolve every device into a connectable target, in device-name order
    pub fn targets(&self) -> Result<Vec<DeviceTarget>> {
        self.devices
            .iter()
            .map(|(name, device)| -> Result<DeviceTarget> {
                if let Some(os) = device.os.as_deref().filter(|os| !os.starts_with("ios")) {
                    tracing::warn!("Device {} has os '{}'; templates target IOS-XE", name, os);
                }
                if let Some(kind) = device.device_type.as_deref().filter(|t| *t != "switch") {
                    tracing::warn!("Device {} has type '{}'; migration expects access switches", name, kind);
                }

                let cred = device
                    .credentials
                    .get(DEFAULT_CREDENTIAL)
                    .filter(|c| is_complete(c))
                    .or_else(|| {
                        self.testbed
                            .credentials
                            .get(DEFAULT_CREDENTIAL)
                            .filter(|c| is_complete(c))
                    })
                    .ok_or_else(|| anyhow::anyhow!("No SSH credentials available for device {}", name))?;

                if device.connections.cli.protocol != "ssh" {
                    anyhow::bail!(
                        "Unsupported protocol '{}' for device {}",
                        device.connections.cli.protocol,
                        name
                    );
                }

                Ok(DeviceTarget {
                    name: name.clone(),
                    alias: device
                        .alias
                        .clone()
                        .filter(|a| !a.is_empty())
                        .unwrap_or_else(|| name.clone()),
                    host: device.connections.cli.ip.clone(),
                    port: device.connections.cli.port,
                    username: cred.username.clone(),
                    password: cred.password.clone(),
                })
            })
            .collect()
    }
}

fn is_complete(cred: &Credential) -> bool {
    !cred.username.is_empty() && !cred.password.is_empty()
}
