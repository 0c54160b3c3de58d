use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::{Client, RequestBuilder, header};
use shared::models::{
    ConversationListResponse, ConversationSummary, CustomerMessageRequest, InboxStreamEvent,
    Message, MessageListResponse, OpenConversationRequest, PresenceHeartbeatRequest,
    PresenceSnapshot, ReplyRequest, ReplyResponse, TypingRequest, TypingStatusResponse,
};
use url::Url;

use crate::error::TransportError;

/// Stream of conversation events delivered over a push channel.
pub type EventStream = BoxStream<'static, InboxStreamEvent>;

/// REST + push surface the sync engine runs against.
///
/// The engine only depends on this trait; tests drive it with a mock and the
/// binaries use [`HttpTransport`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupportTransport: Send + Sync {
    async fn conversations(&self) -> Result<Vec<ConversationSummary>, TransportError>;

    async fn open_conversation(
        &self,
        request: OpenConversationRequest,
    ) -> Result<ConversationSummary, TransportError>;

    async fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, TransportError>;

    async fn send_reply(
        &self,
        conversation_id: i64,
        request: ReplyRequest,
    ) -> Result<Message, TransportError>;

    async fn send_customer_message(
        &self,
        request: CustomerMessageRequest,
    ) -> Result<Message, TransportError>;

    async fn mark_read(&self, conversation_id: i64) -> Result<(), TransportError>;

    async fn set_typing(&self, request: TypingRequest) -> Result<(), TransportError>;

    async fn typing_status(
        &self,
        conversation_id: i64,
        user_id: i64,
    ) -> Result<bool, TransportError>;

    async fn presence(&self, user_id: i64) -> Result<PresenceSnapshot, TransportError>;

    async fn heartbeat(&self, request: PresenceHeartbeatRequest) -> Result<(), TransportError>;

    /// Opens the conversation's push channel. The returned stream ends when
    /// the connection drops; the engine then falls back to polling.
    async fn subscribe(&self, conversation_id: i64) -> Result<EventStream, TransportError>;
}

/// Header carrying the admin token on `/api/admin` requests.
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// `reqwest`-backed transport for the Encore support API.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: Url,
    client: Client,
    admin_token: Option<String>,
}

impl HttpTransport {
    /// Creates a transport rooted at `base_url` (e.g. `http://localhost:8080`).
    ///
    /// # Errors
    /// Returns an error when the base URL cannot be parsed.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        Ok(Self {
            base_url: Url::parse(&base)?,
            client: Client::new(),
            admin_token: None,
        })
    }

    /// Attaches the shared secret sent on `/api/admin` requests.
    #[must_use]
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    fn api_url(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.admin_token {
            Some(token) => request.header(ADMIN_TOKEN_HEADER, token.as_str()),
            None => request,
        }
    }
}

#[async_trait]
impl SupportTransport for HttpTransport {
    async fn conversations(&self) -> Result<Vec<ConversationSummary>, TransportError> {
        let url = self.api_url("api/admin/support/conversations")?;
        let response: ConversationListResponse = self
            .authorize(self.client.get(url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.conversations)
    }

    async fn open_conversation(
        &self,
        request: OpenConversationRequest,
    ) -> Result<ConversationSummary, TransportError> {
        let url = self.api_url("api/admin/support/conversations")?;
        let response = self
            .authorize(self.client.post(url).json(&request))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    async fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, TransportError> {
        let url =
            self.api_url(&format!("api/admin/support/conversations/{conversation_id}/messages"))?;
        let response: MessageListResponse = self
            .authorize(self.client.get(url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.messages)
    }

    async fn send_reply(
        &self,
        conversation_id: i64,
        request: ReplyRequest,
    ) -> Result<Message, TransportError> {
        let url =
            self.api_url(&format!("api/admin/support/conversations/{conversation_id}/reply"))?;
        let response: ReplyResponse = self
            .authorize(self.client.post(url).json(&request))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.message)
    }

    async fn send_customer_message(
        &self,
        request: CustomerMessageRequest,
    ) -> Result<Message, TransportError> {
        let url = self.api_url("api/messages")?;
        let response: ReplyResponse = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.message)
    }

    async fn mark_read(&self, conversation_id: i64) -> Result<(), TransportError> {
        let url =
            self.api_url(&format!("api/admin/support/conversations/{conversation_id}/read"))?;
        self.authorize(self.client.post(url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn set_typing(&self, request: TypingRequest) -> Result<(), TransportError> {
        let url = self.api_url("api/messages/typing")?;
        self.client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn typing_status(
        &self,
        conversation_id: i64,
        user_id: i64,
    ) -> Result<bool, TransportError> {
        let url = self.api_url(&format!("api/messages/typing/{conversation_id}"))?;
        let response: TypingStatusResponse = self
            .client
            .get(url)
            .query(&[("user_id", user_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.is_typing)
    }

    async fn presence(&self, user_id: i64) -> Result<PresenceSnapshot, TransportError> {
        let url = self.api_url(&format!("api/presence/{user_id}"))?;
        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    async fn heartbeat(&self, request: PresenceHeartbeatRequest) -> Result<(), TransportError> {
        let url = self.api_url("api/presence/heartbeat")?;
        self.client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn subscribe(&self, conversation_id: i64) -> Result<EventStream, TransportError> {
        let url =
            self.api_url(&format!("api/admin/support/conversations/{conversation_id}/events"))?;
        let response = self
            .authorize(
                self.client
                    .get(url)
                    .header(header::ACCEPT, "text/event-stream"),
            )
            .send()
            .await?
            .error_for_status()?;

        let mut body = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut buffer = String::new();
            while let Some(chunk) = body.next().await {
                // A transport error ends the stream; the engine falls back to
                // polling rather than surfacing anything.
                let Ok(chunk) = chunk else { break };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim_end_matches('\r').to_string();
                    buffer.drain(..=newline);
                    if let Some(event) = parse_sse_data(&line) {
                        yield event;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Decodes one SSE line. Only single-line `data:` payloads are produced by
/// the server; comment, `event:` and `id:` lines carry nothing we need.
fn parse_sse_data(line: &str) -> Option<InboxStreamEvent> {
    let payload = line.strip_prefix("data:")?.trim_start();
    serde_json::from_str(payload).ok()
}
