//! Hosted-completion responder
//!
//! Sends the system prompt, the bounded recent context, and the new
//! utterance to the chat-completion collaborator. Supports exactly one
//! web-search tool round-trip per reply; nested tool calls are never
//! attempted. Request failures degrade to a retry without tools and then
//! to a generic apology that is still spoken aloud.

use async_trait::async_trait;

use crate::Result;
use crate::llm::{ChatClient, ChatMessage, ChatRequest, FunctionSpec, ToolCall, ToolSpec};
use crate::responder::Responder;
use crate::tools::{SearchTool, WEB_SEARCH_TOOL};
use crate::transcript::{Reply, Turn};

/// Spoken when the completion collaborator cannot be reached at all
const APOLOGY: &str = "Sorry, I'm having trouble thinking right now. Please try again.";

/// Hosted chat-completion responder
pub struct HostedResponder {
    client: Box<dyn ChatClient>,
    search: Option<Box<dyn SearchTool>>,
    model: String,
    system_prompt: String,
    max_tokens: u32,
}

impl HostedResponder {
    /// Create a responder over a completion client
    #[must_use]
    pub fn new(
        client: Box<dyn ChatClient>,
        model: String,
        system_prompt: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            search: None,
            model,
            system_prompt,
            max_tokens,
        }
    }

    /// Enable the web-search tool
    #[must_use]
    pub fn with_search(mut self, search: Box<dyn SearchTool>) -> Self {
        self.search = Some(search);
        self
    }

    fn request(&self, messages: Vec<ChatMessage>, tools: Option<Vec<ToolSpec>>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(self.max_tokens),
            tools,
        }
    }

    /// Role-tagged message list: system prompt, recent turns, new utterance
    fn build_messages(&self, utterance: &str, context: &[Turn]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(context.len() * 2 + 2);
        messages.push(ChatMessage::system(&self.system_prompt));
        for turn in context {
            messages.push(ChatMessage::user(&turn.utterance.text));
            messages.push(ChatMessage::assistant(&turn.reply.text));
        }
        messages.push(ChatMessage::user(utterance));
        messages
    }

    fn tool_specs(&self) -> Option<Vec<ToolSpec>> {
        self.search.as_ref()?;
        Some(vec![ToolSpec {
            kind: "function".to_string(),
            function: FunctionSpec {
                name: WEB_SEARCH_TOOL.to_string(),
                description: "Search the web for current information. \
                              Use only when the answer needs fresh facts."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                }),
            },
        }])
    }

    /// Execute one declared tool call, never failing
    async fn run_tool(&self, call: &ToolCall) -> String {
        if call.function.name != WEB_SEARCH_TOOL {
            return format!("Unknown tool: {}", call.function.name);
        }
        let Some(search) = self.search.as_ref() else {
            return "Web search is not configured.".to_string();
        };

        let query = serde_json::from_str::<serde_json::Value>(&call.function.arguments)
            .ok()
            .and_then(|args| args.get("query").and_then(|q| q.as_str()).map(String::from));

        match query {
            Some(query) => {
                tracing::info!(query = %query, "running web search tool");
                search.lookup(&query).await
            }
            None => {
                tracing::warn!(arguments = %call.function.arguments, "malformed tool arguments");
                "Could not parse the search arguments.".to_string()
            }
        }
    }

    /// Fold the tool results into one follow-up completion, without tools
    async fn follow_up(
        &self,
        mut messages: Vec<ChatMessage>,
        assistant: ChatMessage,
        calls: &[ToolCall],
    ) -> Reply {
        messages.push(assistant);
        for call in calls {
            let result = self.run_tool(call).await;
            messages.push(ChatMessage::tool(&call.id, &result));
        }

        // The follow-up request declares no tools, so a second round-trip
        // cannot occur
        match self.client.complete(&self.request(messages, None)).await {
            Ok(response) => Reply::new(response.text().unwrap_or(APOLOGY)),
            Err(e) => {
                tracing::warn!(error = %e, "follow-up completion failed");
                Reply::new(APOLOGY)
            }
        }
    }

    /// Retry once with tools disabled before giving up with an apology
    async fn degraded_retry(&self, messages: Vec<ChatMessage>) -> Reply {
        match self.client.complete(&self.request(messages, None)).await {
            Ok(response) => Reply::new(response.text().unwrap_or(APOLOGY)),
            Err(e) => {
                tracing::error!(error = %e, "degraded completion retry failed");
                Reply::new(APOLOGY)
            }
        }
    }
}

#[async_trait(?Send)]
impl Responder for HostedResponder {
    async fn respond(&self, utterance: &str, context: &[Turn]) -> Result<Reply> {
        let messages = self.build_messages(utterance, context);

        let first = self
            .client
            .complete(&self.request(messages.clone(), self.tool_specs()))
            .await;

        let reply = match first {
            Ok(response) => {
                if let Some(calls) = response.tool_calls() {
                    let calls = calls.to_vec();
                    let assistant = ChatMessage {
                        role: "assistant".to_string(),
                        content: response.text().map(String::from),
                        tool_calls: Some(calls.clone()),
                        tool_call_id: None,
                    };
                    self.follow_up(messages, assistant, &calls).await
                } else {
                    Reply::new(response.text().unwrap_or(APOLOGY))
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "completion failed, retrying without tools");
                self.degraded_retry(messages).await
            }
        };

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;
    use crate::llm::{ChatResponse, Choice, FunctionCall};
    use crate::transcript::Utterance;

    /// Scripted completion client recording every request it sees
    struct MockChat {
        script: RefCell<VecDeque<Result<ChatResponse>>>,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl MockChat {
        fn new(script: Vec<Result<ChatResponse>>) -> Rc<Self> {
            Rc::new(Self {
                script: RefCell::new(script.into_iter().collect()),
                requests: RefCell::new(Vec::new()),
            })
        }
    }

    #[async_trait(?Send)]
    impl ChatClient for Rc<MockChat> {
        async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
            self.requests.borrow_mut().push(request.clone());
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(crate::Error::Completion("script exhausted".to_string())))
        }
    }

    #[derive(Default)]
    struct MockSearch {
        calls: RefCell<Vec<String>>,
    }

    #[async_trait(?Send)]
    impl SearchTool for Rc<MockSearch> {
        async fn lookup(&self, query: &str) -> String {
            self.calls.borrow_mut().push(query.to_string());
            "Rust 1.88 released, details at https://example.com".to_string()
        }
    }

    fn text_response(text: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![Choice {
                message: ChatMessage::assistant(text),
                finish_reason: Some("stop".to_string()),
            }],
        }
    }

    fn tool_response(arguments: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![Choice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: None,
                    tool_calls: Some(vec![ToolCall {
                        id: "call-1".to_string(),
                        kind: "function".to_string(),
                        function: FunctionCall {
                            name: WEB_SEARCH_TOOL.to_string(),
                            arguments: arguments.to_string(),
                        },
                    }]),
                    tool_call_id: None,
                },
                finish_reason: Some("tool_calls".to_string()),
            }],
        }
    }

    fn responder(script: Vec<Result<ChatResponse>>) -> (HostedResponder, Rc<MockChat>) {
        let client = MockChat::new(script);
        let responder = HostedResponder::new(
            Box::new(Rc::clone(&client)),
            "llama-3.3-70b-versatile".to_string(),
            "You are Aura.".to_string(),
            150,
        );
        (responder, client)
    }

    #[tokio::test]
    async fn test_plain_completion() {
        let (responder, _) = responder(vec![Ok(text_response("Hi there"))]);
        let reply = responder.respond("hello", &[]).await.unwrap();
        assert_eq!(reply.text, "Hi there");
    }

    #[tokio::test]
    async fn test_context_window_becomes_messages() {
        let (responder, client) = responder(vec![Ok(text_response("ok"))]);
        let context = vec![
            Turn {
                utterance: Utterance::new("first question"),
                reply: Reply::new("first answer"),
            },
            Turn {
                utterance: Utterance::new("second question"),
                reply: Reply::new("second answer"),
            },
        ];

        responder.respond("third question", &context).await.unwrap();

        let requests = client.requests.borrow();
        let messages = &requests[0].messages;
        // system + 2 turns * 2 + new utterance
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content.as_deref(), Some("first question"));
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[5].content.as_deref(), Some("third question"));
    }

    #[tokio::test]
    async fn test_single_tool_round_trip() {
        let (responder, client) = responder(vec![
            Ok(tool_response(r#"{"query":"rust release"}"#)),
            Ok(text_response("Rust 1.88 is out.")),
        ]);
        let search = Rc::new(MockSearch::default());
        let responder = responder.with_search(Box::new(Rc::clone(&search)));

        let reply = responder.respond("any rust news", &[]).await.unwrap();

        assert_eq!(reply.text, "Rust 1.88 is out.");
        let requests = client.requests.borrow();
        // Exactly one follow-up, never two tool round-trips
        assert_eq!(requests.len(), 2);
        assert!(requests[0].tools.is_some());
        assert!(requests[1].tools.is_none(), "follow-up must declare no tools");
        assert!(requests[1].messages.iter().any(|m| m.role == "tool"));
        assert_eq!(search.calls.borrow().as_slice(), ["rust release"]);
    }

    #[tokio::test]
    async fn test_malformed_tool_arguments_still_answer() {
        let (responder, client) = responder(vec![
            Ok(tool_response("not json")),
            Ok(text_response("Here is what I know anyway.")),
        ]);
        let responder = responder.with_search(Box::new(Rc::new(MockSearch::default())));

        let reply = responder.respond("news?", &[]).await.unwrap();

        assert_eq!(reply.text, "Here is what I know anyway.");
        let requests = client.requests.borrow();
        let tool_msg = requests[1]
            .messages
            .iter()
            .find(|m| m.role == "tool")
            .unwrap();
        assert!(tool_msg.content.as_deref().unwrap().contains("Could not parse"));
    }

    #[tokio::test]
    async fn test_failure_retries_without_tools() {
        let (responder, client) = responder(vec![
            Err(crate::Error::Completion("timeout".to_string())),
            Ok(text_response("second try")),
        ]);

        let reply = responder.respond("hello", &[]).await.unwrap();

        assert_eq!(reply.text, "second try");
        let requests = client.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_none());
    }

    #[tokio::test]
    async fn test_double_failure_yields_spoken_apology() {
        let (responder, _) = responder(vec![
            Err(crate::Error::Completion("down".to_string())),
            Err(crate::Error::Completion("still down".to_string())),
        ]);

        let reply = responder.respond("hello", &[]).await.unwrap();
        assert_eq!(reply.text, APOLOGY);
    }
}
