//! One-time agent setup
//!
//! Makes sure a working agent exists and that its ID is recorded in the env
//! file. An ID that is already recorded gets one greeting as a liveness
//! check; if that fails a fresh agent is created in its place.
//!
//! ```text
//! NoAgent ─create─► Created (smoke-tested)
//! HasAgentId ─validate─► Reused
//!            └─fail────► create ─► Created
//! ```

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::envfile::{EnvContents, EnvFile, AGENT_ID_KEY, API_KEY_KEY};
use crate::error::SetupError;
use crate::letta::{AgentService, CreateAgent, MemoryBlock};

/// Value shipped in `env.example`; never treated as a real agent
pub const PLACEHOLDER_AGENT_ID: &str = "agent-xxxxxxxxx";
pub const VALIDATION_GREETING: &str = "Hello! Please introduce yourself briefly.";
pub const SMOKE_TEST_GREETING: &str = "Hello! Please introduce yourself.";

pub const DEFAULT_MODEL: &str = "openai/gpt-4.1";
pub const DEFAULT_EMBEDDING: &str = "openai/text-embedding-3-small";

/// What a newly created agent starts with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPreset {
    pub memory_blocks: Vec<MemoryBlock>,
    pub tools: Vec<String>,
    pub model: String,
    pub embedding: String,
}

impl Default for AgentPreset {
    fn default() -> Self {
        Self {
            memory_blocks: vec![
                MemoryBlock {
                    label: "human".to_string(),
                    value: "The user is exploring Letta for the first time. They're interested in AI and building applications.".to_string(),
                    description: None,
                },
                MemoryBlock {
                    label: "persona".to_string(),
                    value: "I am TrustyKitty, a helpful and knowledgeable AI assistant to help you with your data questions. I have persistent memory across conversations and can help with various tasks. My personality is friendly, professional, and encouraging.".to_string(),
                    description: None,
                },
                MemoryBlock {
                    label: "project_context".to_string(),
                    value: "The user is working on a Next.js chat application integrated with Letta. This is a demo application to showcase Letta's capabilities.".to_string(),
                    description: Some("Stores information about the current project and technical context".to_string()),
                },
            ],
            tools: vec!["web_search".to_string(), "run_code".to_string()],
            model: DEFAULT_MODEL.to_string(),
            embedding: DEFAULT_EMBEDDING.to_string(),
        }
    }
}

impl AgentPreset {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_embedding(mut self, embedding: impl Into<String>) -> Self {
        self.embedding = embedding.into();
        self
    }

    pub fn to_request(&self) -> CreateAgent {
        CreateAgent {
            memory_blocks: self.memory_blocks.clone(),
            tools: self.tools.clone(),
            model: self.model.clone(),
            embedding: self.embedding.clone(),
        }
    }
}

/// Progress notifications, in the order they happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    FoundExisting(String),
    Validating,
    Validated,
    ValidationFailed(String),
    Creating,
    Created(String),
    SmokeTesting,
    Reply(String),
    Persisted,
    KeptExisting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reused {
        agent_id: String,
        reply: String,
    },
    Created {
        agent_id: String,
        reply: Option<String>,
    },
}

impl Outcome {
    pub fn agent_id(&self) -> &str {
        match self {
            Outcome::Reused { agent_id, .. } | Outcome::Created { agent_id, .. } => agent_id,
        }
    }

    pub fn reply(&self) -> Option<&str> {
        match self {
            Outcome::Reused { reply, .. } => Some(reply),
            Outcome::Created { reply, .. } => reply.as_deref(),
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, Outcome::Reused { .. })
    }
}

pub fn require_api_key(value: Option<String>) -> Result<String, SetupError> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or(SetupError::MissingApiKey)
}

/// The recorded agent ID, unless it is missing, blank, or the placeholder.
pub fn existing_agent_id(contents: &EnvContents) -> Option<String> {
    contents
        .get(AGENT_ID_KEY)
        .filter(|id| id != PLACEHOLDER_AGENT_ID)
}

pub struct Provisioner<S> {
    service: S,
    api_key: String,
    preset: AgentPreset,
}

impl<S: AgentService> Provisioner<S> {
    pub fn new(service: S, api_key: impl Into<String>) -> Self {
        Self {
            service,
            api_key: api_key.into(),
            preset: AgentPreset::default(),
        }
    }

    pub fn with_preset(mut self, preset: AgentPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Greet `agent_id` and return its reply.
    pub async fn validate(&self, agent_id: &str) -> Result<String> {
        let batch = self.service.send_message(agent_id, VALIDATION_GREETING).await?;
        batch
            .assistant_reply()
            .ok_or_else(|| SetupError::NoAssistantReply.into())
    }

    /// Create an agent from the preset and greet it once.
    pub async fn create(&self, report: &mut impl FnMut(Step)) -> Result<(String, Option<String>)> {
        report(Step::Creating);
        let agent = self
            .service
            .create_agent(&self.preset.to_request())
            .await
            .context("Failed to create agent")?;
        info!(agent_id = %agent.id, "agent created");
        report(Step::Created(agent.id.clone()));

        report(Step::SmokeTesting);
        let batch = self
            .service
            .send_message(&agent.id, SMOKE_TEST_GREETING)
            .await
            .context("Failed to message the new agent")?;
        let reply = batch.assistant_reply();
        if let Some(reply) = &reply {
            report(Step::Reply(reply.clone()));
        }

        Ok((agent.id, reply))
    }

    pub async fn run(&self, env: &EnvFile) -> Result<Outcome> {
        self.run_with(env, |_| {}).await
    }

    /// Run setup against `env`, calling `report` as each step happens.
    pub async fn run_with(&self, env: &EnvFile, mut report: impl FnMut(Step)) -> Result<Outcome> {
        let existing = existing_agent_id(&env.load()?);

        let mut outcome = None;
        if let Some(agent_id) = existing {
            info!(%agent_id, "validating existing agent");
            report(Step::FoundExisting(agent_id.clone()));
            report(Step::Validating);

            match self.validate(&agent_id).await {
                Ok(reply) => {
                    report(Step::Validated);
                    report(Step::Reply(reply.clone()));
                    outcome = Some(Outcome::Reused { agent_id, reply });
                }
                Err(e) => {
                    warn!(%agent_id, error = %e, "existing agent failed validation");
                    report(Step::ValidationFailed(e.to_string()));
                }
            }
        }

        let outcome = match outcome {
            Some(outcome) => outcome,
            None => {
                let (agent_id, reply) = self.create(&mut report).await?;
                Outcome::Created { agent_id, reply }
            }
        };

        if !outcome.is_reused() || !env.exists() {
            env.update(|contents| {
                contents.set(AGENT_ID_KEY, outcome.agent_id());
                contents.set_if_absent(API_KEY_KEY, &self.api_key);
                Ok(())
            })?;
            info!(path = %env.path().display(), "recorded agent id");
            report(Step::Persisted);
        } else {
            report(Step::KeptExisting);
        }

        Ok(outcome)
    }
}

/// Full setup: check the credential, connect, provision.
///
/// `connect` is only called once a key is present, so a missing key never
/// reaches the network.
pub async fn setup<S, F>(
    api_key: Option<String>,
    connect: F,
    env: &EnvFile,
    preset: AgentPreset,
    report: impl FnMut(Step),
) -> Result<Outcome>
where
    S: AgentService,
    F: FnOnce(&str) -> S,
{
    let api_key = require_api_key(api_key)?;
    let provisioner = Provisioner::new(connect(&api_key), api_key).with_preset(preset);
    provisioner.run_with(env, report).await
}
