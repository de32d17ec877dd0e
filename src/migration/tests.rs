use super::*;
use crate::device::mock::MockDevice;
use std::path::Path;

const RUNNING_PRE: &str = "\
Building configuration...
!
hostname access-sw1
!
interface GigabitEthernet1/0/1
 switchport access vlan 10
 authentication port-control auto
 dot1x pae authenticator
!
interface GigabitEthernet1/0/48
 switchport mode trunk
!
end
";

const RUNNING_POST: &str = "\
Building configuration...
!
hostname access-sw1
!
interface GigabitEthernet1/0/1
 switchport access vlan 10
 access-session closed
 access-session port-control auto
 dot1x pae authenticator
 service-policy type control subscriber DOT1X_MAB_POLICY
!
interface GigabitEthernet1/0/48
 switchport mode trunk
!
end
";

const INTERFACES_STATUS: &str = "\
Port         Name               Status       Vlan       Duplex  Speed Type
Gi1/0/1      Desk               connected    10         a-full a-1000 10/100/1000BaseTX
Gi1/0/2                         notconnect   10           auto   auto 10/100/1000BaseTX
Gi1/0/48     Uplink             connected    trunk      a-full a-1000 10/100/1000BaseTX
Gi1/1/1                         notconnect   1            auto   auto unknown
Ap1/0/1                         connected    1          a-full a-1000 App-hosting port
";

const DOT1X: &str = "\
Sysauthcontrol              Enabled
Dot1x Protocol Version            3

Dot1x Info for GigabitEthernet1/0/1
-----------------------------------
PAE                       = AUTHENTICATOR
TxPeriod                  = 10
";

const MAC_PRE: &str = "\
Vlan    Mac Address       Type        Ports
----    -----------       --------    -----
  10    0050.7966.6800    DYNAMIC     Gi1/0/1
Total Mac Addresses for this criterion: 1
";

const MAC_POST: &str = "\
Vlan    Mac Address       Type        Ports
----    -----------       --------    -----
Total Mac Addresses for this criterion: 0
";

const SESSIONS: &str = "\
Interface    MAC Address     Method   Domain   Status  Fg Session ID
Gi1/0/1      0050.7966.6800  dot1x    DATA     Auth        0A0A0A0B0000000C1A2B3C4D

Session count = 1
";

const VLANS: &str = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Gi1/1/1
10   data_vlan                        active    Gi1/0/1, Gi1/0/2
";

fn config(root: &Path) -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.templates_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("templates")
        .display()
        .to_string();
    config.backup_dir = root.join("backup_configs").display().to_string();
    config.pre_dir = root.join("pre_configs").display().to_string();
    config.post_dir = root.join("post_configs").display().to_string();
    config.changelog_dir = root.join("changelog").display().to_string();
    config.data_vlan_name = "data_vlan".to_string();
    config.mode = MigrationMode::Enforcement;
    config
}

/// Intent files land in the templates directory, so tests point it at a scratch copy
fn runner(root: &Path) -> MigrationRunner {
    let mut config = config(root);
    let scratch = root.join("templates");
    std::fs::create_dir_all(&scratch).unwrap();
    for entry in std::fs::read_dir(&config.templates_dir).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), scratch.join(entry.file_name())).unwrap();
    }
    config.templates_dir = scratch.display().to_string();
    MigrationRunner::new(&config, "20240315_093000").unwrap()
}

fn switch(alias: &str) -> MockDevice {
    MockDevice::new(alias)
        .respond(parsers::SHOW_RUNNING_CONFIG, RUNNING_PRE)
        .respond(parsers::SHOW_RUNNING_CONFIG, RUNNING_PRE)
        .respond(parsers::SHOW_RUNNING_CONFIG, RUNNING_POST)
        .respond(parsers::SHOW_MAC_TABLE, MAC_PRE)
        .respond(parsers::SHOW_MAC_TABLE, MAC_POST)
        .respond(parsers::SHOW_DOT1X, DOT1X)
        .respond(parsers::SHOW_AUTH_SESSIONS, SESSIONS)
        .respond(parsers::SHOW_INTERFACES_STATUS, INTERFACES_STATUS)
        .respond(parsers::SHOW_VLAN_BRIEF, VLANS)
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_full_migration() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    let devices = vec![switch("access-sw1")];

    let report = runner.run(&devices).await.unwrap();
    let device = &report.devices[0];
    assert_eq!(device.failed_steps(), 0);
    assert_eq!(device.data_vlan, Some(10));
    assert_eq!(
        device.access_interfaces,
        vec!["GigabitEthernet1/0/1".to_string(), "GigabitEthernet1/0/2".to_string()]
    );

    let sw = &devices[0];
    let configured = sw.configured.lock().unwrap();
    assert_eq!(configured.len(), 5);
    assert!(configured[0].contains("no authentication port-control auto"));
    assert!(!configured[0].contains("GigabitEthernet1/0/48"));
    assert!(configured[1].contains("POLICY_Gi1/0/2"));
    assert!(configured[2].contains("no service-template DEFAULT_LINKSEC_POLICY_MUST_SECURE"));
    assert!(configured[3].contains(" vlan 10"));
    assert!(configured[4].contains("interface GigabitEthernet1/0/1"));
    assert!(configured[4].contains("dot1x timeout tx-period 10"));

    let executed = sw.executed.lock().unwrap();
    let new_style = executed.iter().position(|c| c == NEW_STYLE_COMMAND).unwrap();
    let save = executed.iter().position(|c| c == SAVE_COMMAND).unwrap();
    assert!(new_style < save);

    let pre = files_in(&dir.path().join("pre_configs"));
    let post = files_in(&dir.path().join("post_configs"));
    assert_eq!(pre.len(), Subject::ALL.len());
    assert_eq!(post.len(), Subject::ALL.len());
    for subject in Subject::ALL {
        let label = subject.file_label();
        assert!(pre.contains(&format!("access-sw1_Pre_{}_20240315_093000.json", label)));
        assert!(post.contains(&format!("access-sw1_Post_{}_20240315_093000.json", label)));
    }

    assert!(dir
        .path()
        .join("backup_configs/access-sw1_Backup_20240315_093000.cfg")
        .exists());
    assert!(dir
        .path()
        .join("templates/20240315_093000_legacy_removal.txt")
        .exists());

    let changelog = dir.path().join("changelog");
    let unchanged = std::fs::read_to_string(
        changelog.join("access-sw1_C3PL_Conversion_Interfaces_Status_20240315_093000.txt"),
    )
    .unwrap();
    assert_eq!(unchanged, crate::snapshot::NO_CHANGES);

    let config_diff = std::fs::read_to_string(
        changelog.join("access-sw1_C3PL_Conversion_Running_Config_20240315_093000.txt"),
    )
    .unwrap();
    assert!(config_diff.contains(" interface GigabitEthernet1/0/1:"));
    assert!(config_diff.contains("+ access-session closed:"));
    assert!(config_diff.contains("- authentication port-control auto:"));

    let mac_diff = std::fs::read_to_string(
        changelog.join("access-sw1_C3PL_Conversion_MAC_Table_20240315_093000.txt"),
    )
    .unwrap();
    assert!(mac_diff.contains("-total_mac_addresses: 1"));

    let text_diff = std::fs::read_to_string(
        changelog.join("access-sw1_C3PL_Conversion_Running_Config_Text_20240315_093000.txt"),
    )
    .unwrap();
    assert!(text_diff.contains("+ service-policy type control subscriber DOT1X_MAB_POLICY"));

    assert!(changelog.join("C3PL_Summary_20240315_093000.json").exists());
}

#[tokio::test]
async fn test_policy_removal_failures_are_caught() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    let devices = vec![switch("access-sw1")
        .reject_config_containing("no service-policy type control subscriber")
        .reject_config_containing("no service-template webauth-global-inactive")];

    let report = runner.run(&devices).await.unwrap();
    let steps = &report.devices[0].steps;

    let per_intf = steps
        .iter()
        .find(|s| s.name == "Remove applied default policy per interface")
        .unwrap();
    assert!(!per_intf.passed());
    assert!(per_intf
        .message
        .as_deref()
        .unwrap()
        .starts_with("Could not remove applied policy correctly\n"));

    let global = steps
        .iter()
        .find(|s| s.name == "Remove global default policies and templates")
        .unwrap();
    assert!(global
        .message
        .as_deref()
        .unwrap()
        .starts_with("Could not remove global configs correctly\n"));

    assert_eq!(report.devices[0].failed_steps(), 2);
    assert!(devices[0]
        .executed
        .lock()
        .unwrap()
        .iter()
        .any(|c| c == SAVE_COMMAND));
}

#[tokio::test]
async fn test_missing_data_vlan_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    let first = MockDevice::new("access-sw1")
        .respond(parsers::SHOW_RUNNING_CONFIG, RUNNING_PRE)
        .respond(parsers::SHOW_INTERFACES_STATUS, INTERFACES_STATUS)
        .respond(parsers::SHOW_VLAN_BRIEF, "1    default                          active\n");
    let devices = vec![first, switch("access-sw2")];

    let err = runner.run(&devices).await.unwrap_err();
    let missing = err.downcast_ref::<MissingDataVlan>().unwrap();
    assert_eq!(missing.name, "data_vlan");
    assert!(devices[0]
        .executed
        .lock()
        .unwrap()
        .iter()
        .all(|c| c != SAVE_COMMAND));
    assert!(devices[1].executed.lock().unwrap().is_empty());

    let summary: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("changelog/C3PL_Summary_20240315_093000.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["devices"].as_array().unwrap().len(), 1);
    assert!(summary["devices"][0].get("data_vlan").is_none());
}

#[tokio::test]
async fn test_legacy_push_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    let devices = vec![switch("access-sw1").reject_config_containing("no dot1x pae authenticator")];

    assert!(runner.run(&devices).await.is_err());
    assert!(devices[0]
        .executed
        .lock()
        .unwrap()
        .iter()
        .all(|c| c != NEW_STYLE_COMMAND));
}

#[tokio::test]
async fn test_no_dot1x_interfaces_skips_interface_config() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    let devices = vec![MockDevice::new("access-sw1")
        .respond(parsers::SHOW_RUNNING_CONFIG, RUNNING_PRE)
        .respond(parsers::SHOW_DOT1X, "Sysauthcontrol              Disabled\n")
        .respond(parsers::SHOW_INTERFACES_STATUS, INTERFACES_STATUS)
        .respond(parsers::SHOW_VLAN_BRIEF, VLANS)];

    let report = runner.run(&devices).await.unwrap();
    assert_eq!(report.devices[0].failed_steps(), 0);
    assert_eq!(devices[0].configured.lock().unwrap().len(), 4);
}

#[test]
fn test_find_vlan_id() {
    let learned = parsers::parse_vlan_brief(VLANS);
    assert_eq!(find_vlan_id(&learned, "data_vlan"), Some(10));
    assert_eq!(find_vlan_id(&learned, "voice"), None);
    assert_eq!(find_vlan_id(&serde_json::json!({}), "data_vlan"), None);
}
