use std::time::Duration;

use {
    async_trait::async_trait,
    jirabot_channels::{OutboundMessage, Transport, TransportEvent},
    jirabot_common::{RoomId, UserId},
    jirabot_config::ServerConfig,
    reqwest::{Client, RequestBuilder, Response, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::json,
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    outbound::MessageContent,
    sync::{SyncResponse, classify},
};

/// Extra time the HTTP client waits beyond the server-side long-poll timeout.
const SYNC_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

/// Longest response body quoted back in an error.
const MAX_ERROR_BODY: usize = 200;

/// Matrix client-server API transport.
pub struct MatrixClient {
    http: Client,
    base_url: String,
    user_id: UserId,
    access_token: Secret<String>,
    sync_timeout_ms: u64,
    skip_initial_backlog: bool,
    /// `next_batch` of the last processed sync; `None` before the first one.
    since: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct LoginResponse {
    user_id: String,
    access_token: String,
    #[serde(default)]
    device_id: Option<String>,
}

#[derive(Deserialize)]
struct JoinResponse {
    room_id: String,
}

#[derive(Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errcode: String,
    #[serde(default)]
    error: String,
}

impl MatrixClient {
    /// Log in with the configured password and return a ready transport.
    pub async fn login(config: &ServerConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.sync_timeout_ms) + SYNC_TIMEOUT_MARGIN)
            .build()?;
        let base_url = config.base_url();
        info!(username = %config.username, base_url = %base_url, "logging in to matrix");

        let resp = http
            .post(format!("{base_url}/_matrix/client/v3/login"))
            .json(&json!({
                "type": "m.login.password",
                "identifier": { "type": "m.id.user", "user": config.username },
                "password": config.password.expose_secret(),
                "initial_device_display_name": "jirabot",
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body: ErrorBody = resp.json().await.unwrap_or_default();
            return Err(Error::Auth {
                username: config.username.clone(),
                status: status.as_u16(),
                message: format!("{} {}", body.errcode, body.error).trim().to_string(),
            });
        }
        let resp = expect_success(resp, "login").await?;
        let login: LoginResponse = resp.json().await?;
        info!(
            user_id = %login.user_id,
            device_id = login.device_id.as_deref().unwrap_or("-"),
            "matrix login succeeded"
        );

        Ok(Self {
            http,
            base_url,
            user_id: UserId::from(login.user_id),
            access_token: Secret::new(login.access_token),
            sync_timeout_ms: config.sync_timeout_ms,
            skip_initial_backlog: true,
            since: Mutex::new(None),
        })
    }

    /// Whether messages of the first sync batch are dropped.
    #[must_use]
    pub fn with_initial_backlog_skipped(mut self, skip: bool) -> Self {
        self.skip_initial_backlog = skip;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/_matrix/client/v3{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.access_token.expose_secret())
    }

    async fn sync(&self, since: Option<&str>) -> Result<SyncResponse> {
        let timeout = if since.is_some() {
            self.sync_timeout_ms
        } else {
            0
        };
        let mut query = vec![("timeout", timeout.to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }

        let resp = self
            .authorized(self.http.get(self.url("/sync")))
            .query(&query)
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!(user_id = %self.user_id, "matrix access token rejected");
        }
        let resp = expect_success(resp, "sync").await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Transport for MatrixClient {
    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    async fn next_batch(&self) -> jirabot_channels::Result<Option<Vec<TransportEvent>>> {
        let mut since = self.since.lock().await;
        let first = since.is_none();
        let response = self
            .sync(since.as_deref())
            .await
            .map_err(|e| e.into_transport("sync"))?;

        let include_messages = !(first && self.skip_initial_backlog);
        let events = classify(&response, &self.user_id, include_messages);
        debug!(
            next_batch = %response.next_batch,
            events = events.len(),
            first,
            "matrix sync batch"
        );
        *since = Some(response.next_batch);
        Ok(Some(events))
    }

    async fn join_room(&self, room: &RoomId) -> jirabot_channels::Result<RoomId> {
        let operation = format!("join {room}");
        let path = format!("/join/{}", urlencoding::encode(room.as_str()));
        let resp = self
            .authorized(self.http.post(self.url(&path)))
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| Error::from(e).into_transport(&operation))?;
        let joined: JoinResponse = expect_success(resp, &operation)
            .await
            .map_err(|e| e.into_transport(&operation))?
            .json()
            .await
            .map_err(|e| Error::from(e).into_transport(&operation))?;
        let joined = RoomId::from(joined.room_id);
        if &joined == room {
            info!(room = %room, "joined room");
        } else {
            info!(room = %room, room_id = %joined, "joined room by alias");
        }
        Ok(joined)
    }

    async fn send_message(
        &self,
        room: &RoomId,
        message: &OutboundMessage,
    ) -> jirabot_channels::Result<()> {
        let operation = format!("send to {room}");
        let path = format!(
            "/rooms/{}/send/m.room.message/{}",
            urlencoding::encode(room.as_str()),
            uuid::Uuid::new_v4()
        );
        let resp = self
            .authorized(self.http.put(self.url(&path)))
            .json(&MessageContent::from(message))
            .send()
            .await
            .map_err(|e| Error::from(e).into_transport(&operation))?;
        expect_success(resp, &operation)
            .await
            .map_err(|e| e.into_transport(&operation))?;
        debug!(room = %room, "message sent");
        Ok(())
    }
}

async fn expect_success(resp: Response, operation: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status {
        operation: operation.to_string(),
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY).collect(),
    })
}
