//! Configuration management for conductor

use crate::provider::DEFAULT_MCP_TIMEOUT_SECS;
use crate::tools::catalog::CATALOG_NAMES;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const ENGAGEMENT_PROMPT: &str = "You are a specialized agent focused on engagement information.
Your job is to provide detailed information about client engagements, projects, and their components.
Use the provided tools to look up engagement details, project structures, and engagement hierarchies.
Focus only on engagement-related information and be thorough in your responses.";

pub const TEAM_MANAGEMENT_PROMPT: &str = "You are a specialized agent focused on team management information.
Your job is to provide detailed information about teams, team members, and their roles.
Use the provided tools to look up team compositions, member details, and organizational structures.
Focus only on team-related information and be thorough in your responses.";

pub const SERVICE_DESK_PROMPT: &str = "You are a specialized agent focused on service desk operations.
Your job is to provide detailed information about support tickets and the status of IT systems such as CRM, Email, VPN, ERP, and Network.
Use the provided tools to look up active tickets, their priorities, and current system health.
Focus only on service desk information and be thorough in your responses.";

pub const IT_STAFF_PROMPT: &str = "You are a specialized agent focused on IT staff information.
Your job is to provide detailed information about IT staff availability, specialties, and on-call duty.
Use the provided tools to look up available staff, the on-call rotation, and staff by location.
Focus only on staff-related information and be thorough in your responses.";

pub const SUPERVISOR_PROMPT: &str = "You are a supervisor agent responsible for coordinating specialized agents.
You have access to these specialized agents:
1. Engagement Agent: Expert in engagement information, projects, and their components
2. Team Management Agent: Expert in teams, team members, and organizational structures
3. Service Desk Agent: Expert in support tickets and the status of IT systems
4. IT Staff Agent: Expert in IT staff availability, on-call rotation, and staff locations

Your job is to:
1. Break down user queries into sub-tasks for the appropriate specialized agents
2. Determine which agent should handle which part of the query
3. Integrate responses from specialized agents into a cohesive, comprehensive answer
4. Ensure all parts of the user's question are addressed

Be efficient in your delegation and thorough in your final response.";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub supervisor: SupervisorSettings,
    pub server: ServerConfig,
    pub agents: Vec<AgentConfig>,
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let agents = [
            ("EngagementAgent", "engagement", ENGAGEMENT_PROMPT),
            ("TeamManagementAgent", "team_management", TEAM_MANAGEMENT_PROMPT),
            ("ServiceDeskAgent", "service_desk", SERVICE_DESK_PROMPT),
            ("ITStaffAgent", "it_staff", IT_STAFF_PROMPT),
        ];

        Self {
            llm: LlmConfig::default(),
            supervisor: SupervisorSettings::default(),
            server: ServerConfig::default(),
            agents: agents
                .iter()
                .map(|(name, provider, objective)| AgentConfig {
                    name: name.to_string(),
                    provider: provider.to_string(),
                    objective: objective.to_string(),
                })
                .collect(),
            providers: CATALOG_NAMES
                .iter()
                .map(|catalog| {
                    (
                        catalog.to_string(),
                        ProviderConfig::SelfHosted {
                            catalog: catalog.to_string(),
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Which reasoning backend drives the agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    #[default]
    Openai,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmBackend,
    pub model: String,
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::Openai,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Upper bound on delegation rounds per query
    pub max_rounds: usize,
    pub parallel_dispatch: bool,
    /// Upper bound on reasoning steps a worker takes for one sub-task
    pub max_worker_steps: usize,
    pub system_prompt: String,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            max_rounds: crate::orchestration::DEFAULT_MAX_ROUNDS,
            parallel_dispatch: true,
            max_worker_steps: 8,
            system_prompt: SUPERVISOR_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    /// Key into `[providers]`
    pub provider: String,
    pub objective: String,
}

/// How a capability provider is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Catalog served inside this process
    Builtin { catalog: String },
    /// Catalog served by a child `conductor provider <catalog>` over stdio
    SelfHosted { catalog: String },
    /// Any MCP server speaking newline-delimited JSON-RPC over stdio
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
        /// Limit for the handshake and for each tool call
        #[serde(default = "default_mcp_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_mcp_timeout_secs() -> u64 {
    DEFAULT_MCP_TIMEOUT_SECS
}

impl ProviderConfig {
    pub fn catalog(&self) -> Option<&str> {
        match self {
            ProviderConfig::Builtin { catalog } | ProviderConfig::SelfHosted { catalog } => {
                Some(catalog)
            }
            ProviderConfig::Stdio { .. } => None,
        }
    }

    pub fn transport(&self) -> &'static str {
        match self {
            ProviderConfig::Builtin { .. } => "builtin",
            ProviderConfig::SelfHosted { .. } => "self_hosted",
            ProviderConfig::Stdio { .. } => "stdio",
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing default file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Config::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "conductor")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Look up the provider an agent refers to
    pub fn provider_for(&self, agent: &AgentConfig) -> Option<&ProviderConfig> {
        self.providers.get(&agent.provider)
    }

    pub fn validate(&self) -> Result<()> {
        if self.supervisor.max_rounds == 0 {
            bail!("supervisor.max_rounds must be at least 1");
        }
        url::Url::parse(&self.llm.base_url)
            .with_context(|| format!("llm.base_url is not a valid URL: {}", self.llm.base_url))?;
        if self.agents.is_empty() {
            bail!("at least one agent must be configured");
        }

        let mut names = HashSet::new();
        let mut providers = HashSet::new();
        for agent in &self.agents {
            if !names.insert(agent.name.as_str()) {
                bail!("duplicate agent name '{}'", agent.name);
            }
            if !self.providers.contains_key(&agent.provider) {
                bail!(
                    "agent '{}' refers to unknown provider '{}'",
                    agent.name,
                    agent.provider
                );
            }
            if !providers.insert(agent.provider.as_str()) {
                bail!(
                    "provider '{}' is assigned to more than one agent",
                    agent.provider
                );
            }
        }

        for (name, provider) in &self.providers {
            if let ProviderConfig::Stdio { timeout_secs: 0, .. } = provider {
                bail!("provider '{}' must have a timeout_secs of at least 1", name);
            }
            if let Some(catalog) = provider.catalog() {
                if !CATALOG_NAMES.contains(&catalog) {
                    bail!(
                        "provider '{}' uses unknown catalog '{}' (expected one of: {})",
                        name,
                        catalog,
                        CATALOG_NAMES.join(", ")
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.agents.len(), 4);
        assert_eq!(config.supervisor.max_rounds, 50);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.server.port, 7860);
        assert_eq!(
            config.providers["engagement"],
            ProviderConfig::SelfHosted {
                catalog: "engagement".into()
            }
        );
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let text = Config::default().to_toml().unwrap();
        assert!(text.contains("transport = \"self_hosted\""));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.agents, Config::default().agents);
        assert_eq!(parsed.providers, Config::default().providers);
    }

    #[test]
    fn test_parse_partial_file() {
        let text = r#"
            [llm]
            provider = "offline"

            [supervisor]
            max_rounds = 3

            [[agents]]
            name = "Desk"
            provider = "desk"
            objective = "tickets"

            [providers.desk]
            transport = "stdio"
            command = "desk-server"
            args = ["--stdio"]
            env = { TOKEN = "${DESK_TOKEN}" }
        "#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.llm.provider, LlmBackend::Offline);
        assert_eq!(config.supervisor.max_rounds, 3);
        assert!(config.supervisor.parallel_dispatch);
        assert_eq!(config.agents.len(), 1);
        match &config.providers["desk"] {
            ProviderConfig::Stdio {
                command,
                args,
                env,
                timeout_secs,
            } => {
                assert_eq!(command, "desk-server");
                assert_eq!(*timeout_secs, DEFAULT_MCP_TIMEOUT_SECS);
                assert_eq!(args, &vec!["--stdio".to_string()]);
                assert_eq!(env["TOKEN"], "${DESK_TOKEN}");
            }
            other => panic!("unexpected provider {:?}", other),
        }
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.supervisor.max_rounds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.agents[1].name = config.agents[0].name.clone();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.agents[0].provider = "weather".into();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("unknown provider 'weather'"));

        let mut config = Config::default();
        config.agents[1].provider = config.agents[0].provider.clone();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.providers.insert(
            "weather".into(),
            ProviderConfig::Builtin {
                catalog: "weather".into(),
            },
        );
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.agents.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.base_url = "api.openai.com".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.providers.insert(
            "engagement".into(),
            ProviderConfig::Stdio {
                command: "engagement-server".into(),
                args: vec![],
                env: BTreeMap::new(),
                timeout_secs: 0,
            },
        );
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }
}
