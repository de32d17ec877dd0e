use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod report;
pub mod testbed;

pub use report::*;
pub use testbed::*;

/// How the new per-interface policy is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MigrationMode {
    /// Closed access-session; unauthenticated hosts are blocked
    #[default]
    Enforcement,
    /// Open access-session; authentication runs without blocking traffic
    Monitor,
}

impl MigrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationMode::Enforcement => "enforcement",
            MigrationMode::Monitor => "monitor",
        }
    }
}

impl FromStr for MigrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enforcement" => Ok(MigrationMode::Enforcement),
            "monitor" => Ok(MigrationMode::Monitor),
            other => Err(format!("unknown migration mode: {}", other)),
        }
    }
}

/// Subjects captured before and after the change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    RunningConfig,
    MacTable,
    Dot1x,
    AuthenticationSessions,
    InterfacesStatus,
}

impl Subject {
    /// Capture order, shared by the pre and post phases
    pub const ALL: [Subject; 5] = [
        Subject::RunningConfig,
        Subject::MacTable,
        Subject::Dot1x,
        Subject::AuthenticationSessions,
        Subject::InterfacesStatus,
    ];

    /// Name used in snapshot and changelog filenames
    pub fn file_label(&self) -> &'static str {
        match self {
            Subject::RunningConfig => "Running_Config",
            Subject::MacTable => "MAC_Table",
            Subject::Dot1x => "Dot1x",
            Subject::AuthenticationSessions => "Authentication_Sessions",
            Subject::InterfacesStatus => "Interfaces_Status",
        }
    }

    /// Human-readable name used in step names
    pub fn title(&self) -> &'static str {
        match self {
            Subject::RunningConfig => "Running Config",
            Subject::MacTable => "MAC Table",
            Subject::Dot1x => "Dot1x",
            Subject::AuthenticationSessions => "Authentication Sessions",
            Subject::InterfacesStatus => "Interface Status",
        }
    }
}

/// Capture phase relative to the configuration change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pre,
    Post,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Pre => "Pre",
            Phase::Post => "Post",
        }
    }
}
