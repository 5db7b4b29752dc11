use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_BASE_URL: &str = "https://api.letta.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryBlock {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of an agent creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAgent {
    pub memory_blocks: Vec<MemoryBlock>,
    pub tools: Vec<String>,
    pub model: String,
    pub embedding: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    messages: Vec<OutgoingMessage<'a>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Message content is either a bare string or a list of typed parts
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "message_type")]
pub enum LettaMessage {
    #[serde(rename = "assistant_message")]
    Assistant { content: MessageContent },
    #[serde(other)]
    Other,
}

/// Messages returned for one request, in order
#[derive(Debug, Clone, Deserialize)]
pub struct MessageBatch {
    pub messages: Vec<LettaMessage>,
}

impl MessageBatch {
    /// Content of the first assistant message, if any
    pub fn assistant_reply(&self) -> Option<String> {
        self.messages.iter().find_map(|message| match message {
            LettaMessage::Assistant { content } => Some(content.text()),
            LettaMessage::Other => None,
        })
    }
}

/// The parts of the agent API this client uses
#[async_trait]
pub trait AgentService: Send + Sync {
    async fn create_agent(&self, request: &CreateAgent) -> Result<Agent>;

    async fn send_message(&self, agent_id: &str, text: &str) -> Result<MessageBatch>;
}

#[derive(Clone)]
pub struct LettaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LettaClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Letta API error {}: {}", status, text));
        }

        Ok(response)
    }
}

#[async_trait]
impl AgentService for LettaClient {
    async fn create_agent(&self, request: &CreateAgent) -> Result<Agent> {
        let response = self.post_json("/v1/agents/", request).await?;
        let agent: Agent = response.json().await?;
        Ok(agent)
    }

    async fn send_message(&self, agent_id: &str, text: &str) -> Result<MessageBatch> {
        let request = SendMessageRequest {
            messages: vec![OutgoingMessage {
                role: "user",
                content: text,
            }],
        };

        let path = format!("/v1/agents/{}/messages", agent_id);
        let response = self.post_json(&path, &request).await?;
        let batch: MessageBatch = response.json().await?;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_reply_skips_other_message_types() {
        let batch: MessageBatch = serde_json::from_str(
            r#"{"messages":[
                {"message_type":"reasoning_message","reasoning":"thinking"},
                {"message_type":"assistant_message","content":"Hi, I'm TrustyKitty"},
                {"message_type":"assistant_message","content":"second"}
            ],"usage":{"total_tokens":12}}"#,
        )
        .unwrap();

        assert_eq!(batch.messages.len(), 3);
        assert_eq!(batch.assistant_reply().as_deref(), Some("Hi, I'm TrustyKitty"));
    }

    #[test]
    fn test_assistant_reply_joins_content_parts() {
        let batch: MessageBatch = serde_json::from_str(
            r#"{"messages":[{"message_type":"assistant_message","content":[
                {"type":"text","text":"Hello "},{"type":"text","text":"there"}
            ]}]}"#,
        )
        .unwrap();

        assert_eq!(batch.assistant_reply().as_deref(), Some("Hello there"));
    }

    #[test]
    fn test_no_assistant_reply() {
        let batch: MessageBatch =
            serde_json::from_str(r#"{"messages":[{"message_type":"tool_call_message"}]}"#).unwrap();
        assert_eq!(batch.assistant_reply(), None);
    }

    #[test]
    fn test_create_request_shape() {
        let request = CreateAgent {
            memory_blocks: vec![MemoryBlock {
                label: "human".to_string(),
                value: "v".to_string(),
                description: None,
            }],
            tools: vec!["web_search".to_string()],
            model: "openai/gpt-4.1".to_string(),
            embedding: "openai/text-embedding-3-small".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["memory_blocks"][0], serde_json::json!({"label": "human", "value": "v"}));
        assert_eq!(json["tools"][0], "web_search");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = LettaClient::with_base_url("key", "http://localhost:8283/");
        assert_eq!(client.base_url(), "http://localhost:8283");
    }
}
