//! Per-device C3PL conversion: snapshot, push the rendered intent, snapshot again, diff.

use anyhow::Result;
use serde_json::Value;

use crate::config::Config;
use crate::device::DeviceSession;
use crate::diff::{text_diff, Diff};
use crate::intent::IntentRenderer;
use crate::models::{DeviceReport, MigrationMode, Phase, RunReport, Subject};
use crate::parsers::{self, Feature};
use crate::snapshot::SnapshotStore;

mod filter;
mod steps;

pub use filter::access_interfaces;
pub use steps::Steps;

pub const NEW_STYLE_COMMAND: &str = "authentication display new-style";
pub const SAVE_COMMAND: &str = "write memory";

/// Typed error when no VLAN carries the configured data VLAN name
#[derive(Debug)]
pub struct MissingDataVlan {
    pub alias: String,
    pub name: String,
}

impl std::fmt::Display for MissingDataVlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No VLAN named '{}' on {}", self.name, self.alias)
    }
}

impl std::error::Error for MissingDataVlan {}

/// Find the id of the VLAN with the given name in a learned VLAN table
pub fn find_vlan_id(learned: &Value, name: &str) -> Option<u32> {
    learned
        .get("vlans")?
        .as_object()?
        .values()
        .find(|v| v.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|v| v.get("vlan_id"))
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
}

/// Pre-change state per subject, in capture order
#[derive(Debug, Default)]
struct CapturedState {
    states: Vec<(Subject, Value)>,
}

impl CapturedState {
    fn get(&self, subject: Subject) -> &Value {
        self.states
            .iter()
            .find(|(s, _)| *s == subject)
            .map(|(_, v)| v)
            .unwrap_or(&Value::Null)
    }
}

struct DeviceOutcome {
    access_interfaces: Vec<String>,
    data_vlan: u32,
}

/// MigrationRunner drives the conversion over every device, one at a time
pub struct MigrationRunner {
    store: SnapshotStore,
    renderer: IntentRenderer,
    mode: MigrationMode,
    data_vlan_name: String,
}

impl MigrationRunner {
    pub fn new(config: &Config, timestamp: &str) -> Result<Self> {
        Ok(Self {
            store: SnapshotStore::new(config, timestamp),
            renderer: IntentRenderer::load(&config.templates_dir)?,
            mode: config.mode,
            data_vlan_name: config.data_vlan_name.clone(),
        })
    }

    /// Migrate every device in order. The first unhandled error stops the run;
    /// the summary is still written with whatever completed.
    pub async fn run<D: DeviceSession>(&self, devices: &[D]) -> Result<RunReport> {
        let mut reports = Vec::with_capacity(devices.len());

        for device in devices {
            let alias = device.alias().to_string();
            tracing::info!("==================== {} ====================", alias);

            let mut steps = Steps::new(&alias);
            match self.migrate_device(device, &mut steps).await {
                Ok(outcome) => reports.push(DeviceReport {
                    alias,
                    access_interfaces: outcome.access_interfaces,
                    data_vlan: Some(outcome.data_vlan),
                    steps: steps.into_results(),
                }),
                Err(e) => {
                    reports.push(DeviceReport {
                        alias: alias.clone(),
                        access_interfaces: Vec::new(),
                        data_vlan: None,
                        steps: steps.into_results(),
                    });
                    self.finish(reports).await?;
                    return Err(e.context(format!("Migration aborted on {}", alias)));
                }
            }
        }

        self.finish(reports).await
    }

    async fn finish(&self, devices: Vec<DeviceReport>) -> Result<RunReport> {
        let report = RunReport {
            timestamp: self.store.timestamp().to_string(),
            mode: self.mode,
            devices,
        };
        let path = self.store.save_summary(&report).await?;

        for device in &report.devices {
            for step in &device.steps {
                tracing::info!("{:<20} {:<55} {}", device.alias, step.name, step.result.to_uppercase());
            }
        }
        tracing::info!("Summary written to {}", path.display());
        Ok(report)
    }

    async fn capture(&self, device: &dyn DeviceSession, subject: Subject) -> Result<Value> {
        match subject {
            Subject::RunningConfig => parsers::learn(device, Feature::Config).await,
            Subject::MacTable => parsers::parse_show_command(device, parsers::SHOW_MAC_TABLE).await,
            Subject::Dot1x => parsers::parse_show_command(device, parsers::SHOW_DOT1X).await,
            Subject::AuthenticationSessions => {
                parsers::parse_show_command(device, parsers::SHOW_AUTH_SESSIONS).await
            }
            Subject::InterfacesStatus => {
                parsers::parse_show_command(device, parsers::SHOW_INTERFACES_STATUS).await
            }
        }
    }

    async fn migrate_device<D: DeviceSession>(&self, device: &D, steps: &mut Steps) -> Result<DeviceOutcome> {
        let alias = device.alias();

        // 0. Backup
        let backup = device.execute(parsers::SHOW_RUNNING_CONFIG).await;
        let backup = steps.required("Take Backup", backup)?;
        let saved = self.store.save_backup(alias, &backup).await;
        steps.required("Store Backup", saved)?;

        // 1. Pre-change state
        let mut pre = CapturedState::default();
        for subject in Subject::ALL {
            let state = self.capture(device, subject).await;
            let state = steps.required(&format!("Capture Pre State {}", subject.title()), state)?;
            let saved = self.store.save_snapshot(alias, Phase::Pre, subject, &state).await;
            steps.required(&format!("Store Pre State {}", subject.title()), saved)?;
            pre.states.push((subject, state));
        }

        let access = access_interfaces(pre.get(Subject::InterfacesStatus));
        tracing::info!("{}: {} access interfaces: {:?}", alias, access.len(), access);

        // 2. Wipe legacy dot1x from all access ports
        let legacy_removal = steps.required(
            "Render Legacy Dot1x Removal",
            self.renderer.legacy_removal(&access),
        )?;
        let written = self
            .renderer
            .write_intent(self.store.timestamp(), "legacy_removal", &legacy_removal)
            .await;
        steps.required("Store Legacy Dot1x Removal Intent", written)?;
        let pushed = device.configure(&legacy_removal).await;
        steps.required("Wipe Legacy Dot1x Configs from all ports", pushed)?;

        // 3. Convert to new-style
        let converted = device.execute(NEW_STYLE_COMMAND).await;
        steps.required("Convert to new-style authentication", converted)?;

        // 4. Remove default policies and service templates generated by the conversion
        let per_interface = steps.required(
            "Render Interface Policy Removal",
            self.renderer.interface_policy_removal(&access),
        )?;
        let pushed = device.configure(&per_interface).await;
        steps.continue_on_failure(
            "Remove applied default policy per interface",
            pushed,
            "Could not remove applied policy correctly",
        );

        let global = steps.required(
            "Render Global Policy Removal",
            self.renderer.global_policy_removal(&access),
        )?;
        let pushed = device.configure(&global).await;
        steps.continue_on_failure(
            "Remove global default policies and templates",
            pushed,
            "Could not remove global configs correctly",
        );

        // 5. New global policy bound to the data VLAN
        let vlans = parsers::learn(device, Feature::Vlan).await;
        let vlans = steps.required("Learn VLANs", vlans)?;
        let data_vlan = steps.required(
            "Capture Data VLAN ID",
            find_vlan_id(&vlans, &self.data_vlan_name).ok_or_else(|| {
                anyhow::Error::new(MissingDataVlan {
                    alias: alias.to_string(),
                    name: self.data_vlan_name.clone(),
                })
            }),
        )?;
        tracing::info!("{}: data VLAN '{}' is {}", alias, self.data_vlan_name, data_vlan);

        let global_config = steps.required(
            "Render New Global Config",
            self.renderer.new_global_config(data_vlan),
        )?;
        let pushed = device.configure(&global_config).await;
        steps.required("Apply New Global Config", pushed)?;

        // 6. New per-interface policy on every port that ran dot1x before
        match pre.get(Subject::Dot1x).get("interfaces") {
            Some(dot1x_interfaces) => {
                let config = steps.required(
                    "Render New Interface Config",
                    self.renderer.new_interface_config(dot1x_interfaces, self.mode),
                )?;
                let pushed = device.configure(&config).await;
                steps.required("Applying new interface configs", pushed)?;
            }
            None => tracing::info!("{}: no dot1x interfaces, skipping interface config", alias),
        }

        // 7. Save
        let saved = device.execute(SAVE_COMMAND).await;
        steps.required("Write Memory", saved)?;

        // 8. Post-change state and differentials
        for subject in Subject::ALL {
            let state = self.capture(device, subject).await;
            let state = steps.required(&format!("Capture Post State {}", subject.title()), state)?;
            let saved = self.store.save_snapshot(alias, Phase::Post, subject, &state).await;
            steps.required(&format!("Store Post {}", subject.title()), saved)?;

            let diff = Diff::new(pre.get(subject), &state);
            if diff.is_empty() {
                tracing::info!("{}: {} unchanged", alias, subject.title());
            } else {
                tracing::info!("{}: {} differential:\n{}", alias, subject.title(), diff);
            }
            let saved = self.store.save_diff(alias, subject, &diff).await;
            steps.required(&format!("Show {} Differential", subject.title()), saved)?;
        }

        // 9. Line-level running config changelog
        let post_text = device.execute(parsers::SHOW_RUNNING_CONFIG).await;
        let post_text = steps.required("Capture Post Running Config Text", post_text)?;
        let changes = text_diff(
            &backup,
            &post_text,
            &format!("{} pre-change", alias),
            &format!("{} post-change", alias),
        );
        let saved = self
            .store
            .save_changelog(alias, "Running_Config_Text", &changes)
            .await;
        steps.required("Show Running Config Text Differential", saved)?;

        Ok(DeviceOutcome {
            access_interfaces: access,
            data_vlan,
        })
    }
}

#[cfg(test)]
mod tests;
