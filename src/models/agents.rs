//! Agent roster definitions.
//!
//! Agents are the named entities that can be assigned tickets or messaged.
//! A built-in roster ships as the default; deployments can replace it via
//! the `agents` table in `board.toml`.

use serde::{Deserialize, Serialize};

/// Whether an agent is currently doing work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Working,
    #[default]
    Idle,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Working => write!(f, "working"),
            AgentStatus::Idle => write!(f, "idle"),
        }
    }
}

/// A named agent on the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Stable identifier (e.g., "apollo")
    pub id: String,

    /// Display name, also the value used as assignee/recipient
    pub name: String,

    /// Short role description
    #[serde(default)]
    pub role: String,

    /// Current activity state
    #[serde(default)]
    pub status: AgentStatus,

    /// Longer description of what the agent does
    #[serde(default)]
    pub about: String,

    /// Capability tags
    #[serde(default)]
    pub skills: Vec<String>,
}

impl AgentProfile {
    fn new(id: &str, name: &str, role: &str, status: AgentStatus, about: &str, skills: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            status,
            about: about.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The built-in default roster.
pub fn builtin_roster() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new(
            "chiquitin",
            "Chiquitín",
            "Squad Lead",
            AgentStatus::Working,
            "Squad Lead and personal assistant. Coordinates the team and keeps the operator on track.",
            &["coordination", "twitter", "automation", "fitness", "crypto"],
        ),
        AgentProfile::new(
            "apollo",
            "Apollo",
            "Research Agent",
            AgentStatus::Working,
            "Research specialist. Finds and analyzes partnership opportunities.",
            &["research", "partnerships", "analysis", "linkedin"],
        ),
        AgentProfile::new(
            "classifier",
            "Classifier",
            "Email Processor",
            AgentStatus::Working,
            "Email intelligence agent. Processes, categorizes, and labels incoming mail.",
            &["email", "classification", "gmail", "labeling"],
        ),
        AgentProfile::new(
            "scribe",
            "Scribe",
            "Content Writer",
            AgentStatus::Idle,
            "Content creator. Writes blog posts, documentation, and marketing copy.",
            &["writing", "content", "docs", "copywriting"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roster_names_are_unique() {
        let roster = builtin_roster();
        let mut names: Vec<_> = roster.iter().map(|a| a.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), roster.len());
    }

    #[test]
    fn test_agent_status_wire_form() {
        let json = serde_json::to_string(&AgentStatus::Working).unwrap();
        assert_eq!(json, "\"working\"");
    }
}
