use anyhow::{Context as _, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

use crate::models::MigrationMode;
use crate::utils::short_interface_name;

/// Template filenames expected in the templates directory
pub mod template_name {
    pub const LEGACY_REMOVAL: &str = "legacy_dot1x_removal.j2";
    pub const INTERFACE_POLICY_REMOVAL: &str = "junk_interface_removal_template.j2";
    pub const GLOBAL_POLICY_REMOVAL: &str = "junk_removal_template.j2";
    pub const NEW_GLOBAL_CONFIG: &str = "C3PL_new_global_configs.j2";
    pub const NEW_INTERFACE_ENFORCEMENT: &str = "C3PL_new_int_config_enforcement.j2";
    pub const NEW_INTERFACE_MONITOR: &str = "C3PL_new_int_config_monitor.j2";
}

/// Tera filter: "GigabitEthernet1/0/1" -> "Gi1/0/1"
fn short_intf_filter(value: &tera::Value, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    match value.as_str() {
        Some(name) => Ok(tera::Value::String(short_interface_name(name))),
        None => Err(tera::Error::msg("short_intf filter expects a string")),
    }
}

/// Renders configuration intent from the Jinja-style templates on disk
pub struct IntentRenderer {
    tera: Tera,
    templates_dir: PathBuf,
}

impl IntentRenderer {
    /// Load every `*.j2` file under the templates directory
    pub fn load(templates_dir: impl AsRef<Path>) -> Result<Self> {
        let templates_dir = templates_dir.as_ref().to_path_buf();
        let glob = format!("{}/**/*.j2", templates_dir.display());
        let mut tera = Tera::new(&glob)
            .map_err(|e| anyhow::Error::new(e).context(format!("Invalid templates in {}", templates_dir.display())))?;
        tera.register_filter("short_intf", short_intf_filter);

        let loaded: Vec<&str> = tera.get_template_names().collect();
        tracing::debug!("Loaded {} templates from {}", loaded.len(), templates_dir.display());

        Ok(Self { tera, templates_dir })
    }

    fn render(&self, name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(name, context)
            .map_err(|e| anyhow::Error::new(e).context(format!("Template rendering failed: {}", name)))
    }

    fn render_interfaces(&self, name: &str, interfaces: &[String]) -> Result<String> {
        let mut context = Context::new();
        context.insert("interface", interfaces);
        self.render(name, &context)
    }

    /// Strip legacy `authentication`/`dot1x` commands from the access ports
    pub fn legacy_removal(&self, interfaces: &[String]) -> Result<String> {
        self.render_interfaces(template_name::LEGACY_REMOVAL, interfaces)
    }

    /// Remove the per-interface policies auto-generated by new-style conversion
    pub fn interface_policy_removal(&self, interfaces: &[String]) -> Result<String> {
        self.render_interfaces(template_name::INTERFACE_POLICY_REMOVAL, interfaces)
    }

    /// Remove the global default policy-maps and service templates
    pub fn global_policy_removal(&self, interfaces: &[String]) -> Result<String> {
        self.render_interfaces(template_name::GLOBAL_POLICY_REMOVAL, interfaces)
    }

    pub fn new_global_config(&self, data_vlan: u32) -> Result<String> {
        let mut context = Context::new();
        context.insert("vlan", &data_vlan);
        self.render(template_name::NEW_GLOBAL_CONFIG, &context)
    }

    /// Per-interface policy for every interface in the pre-change dot1x state
    pub fn new_interface_config(&self, dot1x_interfaces: &Value, mode: MigrationMode) -> Result<String> {
        let name = match mode {
            MigrationMode::Enforcement => template_name::NEW_INTERFACE_ENFORCEMENT,
            MigrationMode::Monitor => template_name::NEW_INTERFACE_MONITOR,
        };
        let mut context = Context::new();
        context.insert("interface", dot1x_interfaces);
        self.render(name, &context)
    }

    /// Keep a copy of rendered intent next to the templates
    pub async fn write_intent(&self, timestamp: &str, label: &str, content: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.templates_dir).await?;
        let path = self.templates_dir.join(format!("{}_{}.txt", timestamp, label));
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write intent {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundled() -> IntentRenderer {
        IntentRenderer::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")).unwrap()
    }

    fn access_ports() -> Vec<String> {
        vec!["GigabitEthernet1/0/1".to_string(), "GigabitEthernet1/0/2".to_string()]
    }

    #[test]
    fn test_legacy_removal_covers_each_port() {
        let out = bundled().legacy_removal(&access_ports()).unwrap();
        assert!(out.contains("interface GigabitEthernet1/0/1"));
        assert!(out.contains("interface GigabitEthernet1/0/2"));
        assert!(out.contains("no authentication port-control auto"));
    }

    #[test]
    fn test_policy_removal_uses_short_names() {
        let renderer = bundled();
        let per_intf = renderer.interface_policy_removal(&access_ports()).unwrap();
        assert!(per_intf.contains("no service-policy type control subscriber POLICY_Gi1/0/1"));

        let global = renderer.global_policy_removal(&access_ports()).unwrap();
        assert!(global.contains("no policy-map type control subscriber POLICY_Gi1/0/2"));
        assert!(global.contains("no service-template DEFAULT_CRITICAL_DATA_TEMPLATE"));
    }

    #[test]
    fn test_new_global_config_vlan() {
        let out = bundled().new_global_config(110).unwrap();
        assert!(out.contains("vlan 110"));
    }

    #[test]
    fn test_new_interface_config_modes() {
        let renderer = bundled();
        let dot1x = json!({"GigabitEthernet1/0/3": {"interface": "GigabitEthernet1/0/3", "pae": "authenticator"}});

        let enforce = renderer.new_interface_config(&dot1x, MigrationMode::Enforcement).unwrap();
        assert!(enforce.contains("interface GigabitEthernet1/0/3"));
        assert!(enforce.contains(" access-session closed"));

        let monitor = renderer.new_interface_config(&dot1x, MigrationMode::Monitor).unwrap();
        assert!(monitor.contains("interface GigabitEthernet1/0/3"));
        assert!(!monitor.contains(" access-session closed"));
    }

    #[test]
    fn test_tx_period_defaults_when_absent() {
        let renderer = bundled();
        let dot1x = json!({
            "GigabitEthernet1/0/3": {"interface": "GigabitEthernet1/0/3", "pae": "authenticator"},
            "GigabitEthernet1/0/4": {"interface": "GigabitEthernet1/0/4", "pae": "authenticator", "tx_period": 15}
        });
        for mode in [MigrationMode::Enforcement, MigrationMode::Monitor] {
            let out = renderer.new_interface_config(&dot1x, mode).unwrap();
            let gi3 = out.split("interface GigabitEthernet1/0/4").next().unwrap();
            assert!(gi3.contains("interface GigabitEthernet1/0/3"));
            assert!(gi3.contains(" dot1x timeout tx-period 7\n"));
            assert!(out.contains(" dot1x timeout tx-period 15\n"));
        }
    }

    #[test]
    fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = IntentRenderer::load(dir.path()).unwrap();
        assert!(renderer.new_global_config(10).is_err());
    }

    #[tokio::test]
    async fn test_write_intent() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = IntentRenderer::load(dir.path()).unwrap();
        let path = renderer
            .write_intent("20240101_120000", "legacy_removal", "interface Gi1/0/1\n")
            .await
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "20240101_120000_legacy_removal.txt");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "interface Gi1/0/1\n");
    }
}
