use serde_json::{Map, Value};

const BANNER_DELIMITER: &str = "^C";

fn is_noise(trimmed: &str) -> bool {
    trimmed.is_empty()
        || trimmed.starts_with('!')
        || trimmed == "end"
        || trimmed.starts_with("Building configuration")
        || trimmed.starts_with("Current configuration")
}

/// Flatten the output into (indent, line) pairs, folding multi-line banners into one line
fn significant_lines(output: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut iter = output.lines();

    while let Some(line) = iter.next() {
        let trimmed = line.trim();
        if is_noise(trimmed) {
            continue;
        }
        let indent = line.len() - line.trim_start().len();

        if trimmed.starts_with("banner ") && trimmed.matches(BANNER_DELIMITER).count() == 1 {
            let mut banner = trimmed.to_string();
            for next in iter.by_ref() {
                banner.push('\n');
                banner.push_str(next.trim_end());
                if next.contains(BANNER_DELIMITER) {
                    break;
                }
            }
            lines.push((indent, banner));
            continue;
        }

        lines.push((indent, trimmed.to_string()));
    }
    lines
}

fn build(lines: &[(usize, String)], pos: &mut usize, parent_indent: Option<usize>) -> Map<String, Value> {
    let mut map = Map::new();
    while let Some((indent, text)) = lines.get(*pos) {
        if parent_indent.is_some_and(|p| *indent <= p) {
            break;
        }
        *pos += 1;
        let children = build(lines, pos, Some(*indent));
        match map.get_mut(text.as_str()).and_then(Value::as_object_mut) {
            Some(existing) => existing.extend(children),
            None => {
                map.insert(text.clone(), Value::Object(children));
            }
        }
    }
    map
}

/// Parse `show running-config` into a tree keyed by config line, where each
/// indented sub-mode line becomes a child of the line above it.
pub fn parse_running_config(output: &str) -> Value {
    let lines = significant_lines(output);
    let mut pos = 0;
    Value::Object(build(&lines, &mut pos, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OUTPUT: &str = "\
Building configuration...

Current configuration : 1024 bytes
!
version 17.6
hostname access-sw1
!
banner motd ^C
Authorized access only
^C
!
interface GigabitEthernet1/0/1
 switchport access vlan 10
 switchport mode access
 authentication port-control auto
 dot1x pae authenticator
!
policy-map type control subscriber POLICY_Gi1/0/1
 event session-started match-all
  10 class always do-until-failure
   10 authenticate using dot1x priority 10
!
end
";

    #[test]
    fn test_parse_running_config() {
        let parsed = parse_running_config(OUTPUT);
        assert_eq!(parsed["hostname access-sw1"], json!({}));
        assert_eq!(parsed["version 17.6"], json!({}));

        let intf = parsed["interface GigabitEthernet1/0/1"].as_object().unwrap();
        assert_eq!(intf.len(), 4);
        assert!(intf.contains_key("dot1x pae authenticator"));

        let policy = &parsed["policy-map type control subscriber POLICY_Gi1/0/1"];
        assert_eq!(
            policy["event session-started match-all"]["10 class always do-until-failure"]
                ["10 authenticate using dot1x priority 10"],
            json!({})
        );

        assert!(parsed
            .as_object()
            .unwrap()
            .contains_key("banner motd ^C\nAuthorized access only\n^C"));
        assert!(parsed.get("end").is_none());
    }

    #[test]
    fn test_duplicate_sections_merge() {
        let parsed = parse_running_config("interface Vlan1\n no ip address\ninterface Vlan1\n shutdown\n");
        assert_eq!(parsed["interface Vlan1"].as_object().unwrap().len(), 2);
    }
}
