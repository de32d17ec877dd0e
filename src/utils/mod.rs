use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// IOS markers that mean a command was rejected
const ERROR_MARKERS: &[&str] = &[
    "% Invalid input",
    "% Incomplete command",
    "% Ambiguous command",
];

/// Interface name abbreviations, longest first so prefix matching is unambiguous
const INTERFACE_PREFIXES: &[(&str, &str)] = &[
    ("TwentyFiveGigE", "Twe"),
    ("HundredGigE", "Hu"),
    ("FortyGigabitEthernet", "Fo"),
    ("TwoGigabitEthernet", "Tw"),
    ("FiveGigabitEthernet", "Fi"),
    ("TenGigabitEthernet", "Te"),
    ("GigabitEthernet", "Gi"),
    ("FastEthernet", "Fa"),
    ("Port-channel", "Po"),
];

/// libssh2 takes a u32 millisecond timeout
fn session_timeout_ms(timeout_secs: u64) -> u32 {
    u32::try_from(timeout_secs.saturating_mul(1000)).unwrap_or(u32::MAX)
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// Returns the authenticated Session. Uses the ssh2 crate (libssh2).
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(host: &str, port: u16, user: &str, pass: &str, timeout_secs: u64) -> Result<ssh2::Session, String> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| format!("Invalid address {}:{}: {}", host, port, e))?
        .next()
        .ok_or_else(|| format!("No address found for {}:{}", host, port))?;

    let tcp = TcpStream::connect_timeout(&addr, Duration::from_secs(timeout_secs))
        .map_err(|e| format!("TCP connection failed: {}", e))?;

    tcp.set_read_timeout(Some(Duration::from_secs(timeout_secs)))
        .ok();
    tcp.set_write_timeout(Some(Duration::from_secs(timeout_secs)))
        .ok();

    let mut session = ssh2::Session::new()
        .map_err(|e| format!("Failed to create SSH session: {}", e))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(session_timeout_ms(timeout_secs));
    session.handshake()
        .map_err(|e| format!("SSH handshake failed: {}", e))?;

    // Try password auth first
    match session.userauth_password(user, pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // Keyboard-interactive is required by some IOS-XE AAA setups
    let mut prompter = PasswordPrompt { password: pass.to_string() };
    let _ = session.userauth_keyboard_interactive(user, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        Err("SSH authentication failed: all methods exhausted".to_string())
    }
}

/// Run a single exec command on an existing session.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_exec(session: &ssh2::Session, command: &str) -> Result<String, String> {
    let mut channel = session.channel_session()
        .map_err(|e| format!("Failed to open channel: {}", e))?;

    channel.exec(command)
        .map_err(|e| format!("Failed to execute command: {}", e))?;

    let mut output = String::new();
    channel.read_to_string(&mut output)
        .map_err(|e| format!("Failed to read output: {}", e))?;

    channel.wait_close()
        .map_err(|e| format!("Failed to close channel: {}", e))?;

    check_device_errors(command, &output)?;
    Ok(output)
}

/// Send a configuration block through an interactive PTY shell.
/// Network devices only accept config mode on a shell channel, not exec.
pub fn ssh_configure(session: &ssh2::Session, config: &str) -> Result<String, String> {
    let mut channel = session.channel_session()
        .map_err(|e| format!("Failed to open channel: {}", e))?;

    channel.request_pty("vt100", None, None)
        .map_err(|e| format!("Failed to request PTY: {}", e))?;
    channel.shell()
        .map_err(|e| format!("Failed to start shell: {}", e))?;

    let payload = build_config_payload(config);
    channel.write_all(payload.as_bytes())
        .map_err(|e| format!("Failed to send config: {}", e))?;
    channel.flush()
        .map_err(|e| format!("Failed to send config: {}", e))?;
    let _ = channel.send_eof();

    let mut output = String::new();
    channel.read_to_string(&mut output)
        .map_err(|e| format!("Failed to read output: {}", e))?;
    let _ = channel.wait_close();

    check_device_errors("configure", &output)?;
    Ok(output)
}

/// Wrap a config block so the shell enters and leaves config mode, then exits
pub fn build_config_payload(config: &str) -> String {
    let mut payload = String::from("terminal length 0\nconfigure terminal\n");
    for line in config.lines() {
        if line.trim().is_empty() {
            continue;
        }
        payload.push_str(line.trim_end());
        payload.push('\n');
    }
    payload.push_str("end\nexit\n");
    payload
}

/// Fail when the device output carries an IOS error marker
pub fn check_device_errors(command: &str, output: &str) -> Result<(), String> {
    for (idx, line) in output.lines().enumerate() {
        if ERROR_MARKERS.iter().any(|m| line.trim_start().starts_with(m)) {
            // The offending command is echoed on the line(s) just above the marker
            let context: Vec<&str> = output
                .lines()
                .skip(idx.saturating_sub(2))
                .take(3)
                .collect();
            return Err(format!(
                "Device rejected '{}':\n{}",
                command,
                context.join("\n")
            ));
        }
    }
    Ok(())
}

/// Expand an abbreviated interface name, e.g. "Gi1/0/1" -> "GigabitEthernet1/0/1".
/// Unknown prefixes are returned unchanged.
pub fn expand_interface_name(name: &str) -> String {
    if INTERFACE_PREFIXES.iter().any(|(long, _)| name.starts_with(long)) {
        return name.to_string();
    }
    for (long, short) in INTERFACE_PREFIXES {
        if let Some(rest) = name.strip_prefix(short) {
            if rest.starts_with(|c: char| c.is_ascii_digit()) {
                return format!("{}{}", long, rest);
            }
        }
    }
    name.to_string()
}

/// Abbreviate an interface name, e.g. "GigabitEthernet1/0/1" -> "Gi1/0/1"
pub fn short_interface_name(name: &str) -> String {
    for (long, short) in INTERFACE_PREFIXES {
        if let Some(rest) = name.strip_prefix(long) {
            return format!("{}{}", short, rest);
        }
    }
    name.to_string()
}

/// Convert a CamelCase or spaced label to snake_case, e.g. "ReAuthMax" -> "re_auth_max"
pub fn to_snake_case(label: &str) -> String {
    let mut out = String::new();
    let mut prev_lower = false;
    for c in label.trim().chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
            prev_lower = true;
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_string()
}

/// Replace characters that are unsafe in filenames
pub fn safe_filename(name: &str) -> String {
    name.replace(['/', '\\', ' '], "_")
}

/// Run timestamp used in every output filename
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
