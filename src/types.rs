// src/types.rs

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Every task kind the engine knows how to dispatch.
///
/// The declaration order is the canonical dispatch order inside a stage:
/// whatever order a pipeline file lists its tasks in, a stage always runs
/// clone first and approval last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    SetupAndClone,
    DockerBuild,
    DockerHub,
    Sh,
    Bash,
    Maven,
    Gradle,
    Ant,
    Yarn,
    Npm,
    GoBuild,
    Trivy,
    SonarqubeAnalysis,
    SendNotification,
    RequestApproval,
}

impl TaskKind {
    pub const CANONICAL_ORDER: [TaskKind; 15] = [
        TaskKind::SetupAndClone,
        TaskKind::DockerBuild,
        TaskKind::DockerHub,
        TaskKind::Sh,
        TaskKind::Bash,
        TaskKind::Maven,
        TaskKind::Gradle,
        TaskKind::Ant,
        TaskKind::Yarn,
        TaskKind::Npm,
        TaskKind::GoBuild,
        TaskKind::Trivy,
        TaskKind::SonarqubeAnalysis,
        TaskKind::SendNotification,
        TaskKind::RequestApproval,
    ];

    /// Key used for this kind under `tasks` in a pipeline file.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::SetupAndClone => "setup_and_clone",
            TaskKind::DockerBuild => "docker_build",
            TaskKind::DockerHub => "docker_hub",
            TaskKind::Sh => "sh",
            TaskKind::Bash => "bash",
            TaskKind::Maven => "maven",
            TaskKind::Gradle => "gradle",
            TaskKind::Ant => "ant",
            TaskKind::Yarn => "yarn",
            TaskKind::Npm => "npm",
            TaskKind::GoBuild => "go_build",
            TaskKind::Trivy => "trivy",
            TaskKind::SonarqubeAnalysis => "sonarqube_analysis",
            TaskKind::SendNotification => "send_notification",
            TaskKind::RequestApproval => "request_approval",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        TaskKind::CANONICAL_ORDER
            .iter()
            .copied()
            .find(|kind| kind.as_str() == key)
            .ok_or_else(|| format!("unknown task kind: {key}"))
    }
}

/// Parse a duration string like `"500ms"`, `"30s"`, `"10m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
