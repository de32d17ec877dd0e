use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::models::DeviceTarget;
use crate::utils;

/// A connected network device that can run show commands and accept config
#[async_trait]
pub trait DeviceSession: Send + Sync {
    fn alias(&self) -> &str;

    /// Run an exec-mode command and return its output
    async fn execute(&self, command: &str) -> Result<String>;

    /// Push a configuration block and return the session transcript
    async fn configure(&self, config: &str) -> Result<String>;
}

/// SSH-backed device session. The libssh2 session is blocking, so every call
/// is moved onto the blocking thread pool.
pub struct SshDevice {
    alias: String,
    session: Arc<Mutex<ssh2::Session>>,
}

impl SshDevice {
    pub async fn connect(target: &DeviceTarget, timeout_secs: u64) -> Result<Self> {
        let host = target.host.clone();
        let port = target.port;
        let user = target.username.clone();
        let pass = target.password.clone();

        tracing::info!("Connecting to {} [{}] ({}:{}) as {}", target.alias, target.name, host, port, user);

        let session = tokio::task::spawn_blocking(move || {
            utils::ssh_connect(&host, port, &user, &pass, timeout_secs)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
        .map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", target.alias, e))?;

        Ok(Self {
            alias: target.alias.clone(),
            session: Arc::new(Mutex::new(session)),
        })
    }

    async fn with_session<F>(&self, op: F) -> Result<String>
    where
        F: FnOnce(&ssh2::Session) -> Result<String, String> + Send + 'static,
    {
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || {
            let guard = session
                .lock()
                .map_err(|_| "SSH session lock poisoned".to_string())?;
            op(&guard)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
        .map_err(|e| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl DeviceSession for SshDevice {
    fn alias(&self) -> &str {
        &self.alias
    }

    async fn execute(&self, command: &str) -> Result<String> {
        tracing::debug!("{}: executing '{}'", self.alias, command);
        let command = command.to_string();
        self.with_session(move |session| utils::ssh_exec(session, &command))
            .await
    }

    async fn configure(&self, config: &str) -> Result<String> {
        tracing::debug!("{}: configuring {} lines", self.alias, config.lines().count());
        let config = config.to_string();
        self.with_session(move |session| utils::ssh_configure(session, &config))
            .await
    }
}

/// Connect to every target before any device is processed
pub async fn connect_all(targets: &[DeviceTarget], timeout_secs: u64) -> Result<Vec<SshDevice>> {
    let mut devices = Vec::with_capacity(targets.len());
    for target in targets {
        devices.push(SshDevice::connect(target, timeout_secs).await?);
    }
    Ok(devices)
}
