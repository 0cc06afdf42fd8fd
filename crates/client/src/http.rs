use std::time::Duration;

use finassist_chat::{
    BoxFuture, ChatService, DecodeSnafu, Message, NetworkSnafu, SendReply, ServerSnafu,
    ServiceError, ServiceResult, UserId,
};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, ensure};

use crate::error::{BuildHttpClientSnafu, ClientResult, InvalidBaseUrlSnafu, OpaqueBaseUrlSnafu};
use crate::wire::{HistoryEntry, SendRequest, SendResponse};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            api_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        let api_token = api_token.into().trim().to_string();
        self.api_token = (!api_token.is_empty()).then_some(api_token);
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Chat backend reached over JSON/HTTP.
///
/// History: `GET {base}/chat/{user}/messages`. Send: `POST {base}/chat/{user}/messages`
/// with `{"text": ...}`.
pub struct HttpChatService {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpChatService {
    pub fn new(config: HttpClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|source| {
            InvalidBaseUrlSnafu {
                stage: "parse-base-url",
                base_url: config.base_url.clone(),
                details: source.to_string(),
            }
            .build()
        })?;
        ensure!(
            !base_url.cannot_be_a_base(),
            OpaqueBaseUrlSnafu {
                stage: "parse-base-url",
                base_url: config.base_url.clone(),
            }
        );

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context(BuildHttpClientSnafu {
                stage: "build-http-client",
            })?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn messages_url(&self, user_id: &UserId) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL always accepts path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["chat", user_id.as_str(), "messages"]);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        stage: &'static str,
    ) -> ServiceResult<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|source| {
                NetworkSnafu {
                    stage,
                    message: source.to_string(),
                }
                .build()
            })?;

        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|source| {
                NetworkSnafu {
                    stage,
                    message: source.to_string(),
                }
                .build()
            })?;

        if !status.is_success() {
            return Err(server_error(stage, status, &payload));
        }

        serde_json::from_slice(&payload).map_err(|source| {
            DecodeSnafu {
                stage,
                details: source.to_string(),
            }
            .build()
        })
    }
}

fn server_error(stage: &'static str, status: StatusCode, payload: &[u8]) -> ServiceError {
    ServerSnafu {
        stage,
        status: status.as_u16(),
        body: String::from_utf8_lossy(payload).trim(),
    }
    .build()
}

impl ChatService for HttpChatService {
    fn fetch_history<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, ServiceResult<Vec<Message>>> {
        Box::pin(async move {
            let url = self.messages_url(user_id);
            tracing::debug!(%url, "fetching chat history");

            let entries: Vec<HistoryEntry> = self
                .execute(self.client.get(url), "fetch-history")
                .await?;
            Ok::<_, ServiceError>(entries.into_iter().map(Message::from).collect())
        })
    }

    fn send_message<'a>(
        &'a self,
        user_id: &'a UserId,
        text: &'a str,
    ) -> BoxFuture<'a, ServiceResult<SendReply>> {
        Box::pin(async move {
            let url = self.messages_url(user_id);
            tracing::debug!(%url, chars = text.chars().count(), "sending chat message");

            let response: SendResponse = self
                .execute(
                    self.client.post(url).json(&SendRequest { text }),
                    "send-message",
                )
                .await?;
            ensure!(
                !response.reply_text.trim().is_empty(),
                DecodeSnafu {
                    stage: "send-message",
                    details: "reply text is blank",
                }
            );
            Ok::<_, ServiceError>(SendReply::from(response))
        })
    }
}
