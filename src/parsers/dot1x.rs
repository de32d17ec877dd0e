use serde_json::{json, Map, Value};

use crate::utils::{expand_interface_name, to_snake_case};

fn scalar(raw: &str) -> Value {
    match raw.parse::<u64>() {
        Ok(n) => json!(n),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Parse `show dot1x all details`. The `interfaces` key is only present when
/// at least one interface section exists.
pub fn parse_dot1x_details(output: &str) -> Value {
    let mut root = Map::new();
    let mut interfaces = Map::new();
    let mut current: Option<String> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') {
            continue;
        }

        if let Some(name) = trimmed.strip_prefix("Dot1x Info for ") {
            let name = expand_interface_name(name.trim());
            interfaces.insert(name.clone(), json!({ "interface": name }));
            current = Some(name);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("Sysauthcontrol") {
            root.insert(
                "system_auth_control".into(),
                Value::Bool(rest.trim().eq_ignore_ascii_case("enabled")),
            );
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("Dot1x Protocol Version") {
            root.insert("version".into(), scalar(rest.trim()));
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let Some(section) = current.as_ref().and_then(|c| interfaces.get_mut(c)).and_then(Value::as_object_mut) else {
            continue;
        };
        let key = to_snake_case(key);
        let value = value.trim();
        let value = if key == "pae" {
            Value::String(value.to_lowercase())
        } else {
            scalar(value)
        };
        section.insert(key, value);
    }

    if !interfaces.is_empty() {
        root.insert("interfaces".into(), Value::Object(interfaces));
    }
    Value::Object(root)
}
