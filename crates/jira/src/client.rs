use std::{sync::RwLock, time::Duration};

use {
    async_trait::async_trait,
    jirabot_config::{JiraAuthMode, JiraConfig},
    reqwest::{Client, RequestBuilder, Response, StatusCode, header},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    tracker::{Issue, IssueResult, IssueTracker},
};

/// Longest response body quoted back in an error.
const MAX_ERROR_BODY: usize = 200;

/// Jira REST client.
pub struct JiraClient {
    http: Client,
    base_url: String,
    username: String,
    password: Secret<String>,
    auth: JiraAuthMode,
    /// `name=value` cookie obtained from the session endpoint.
    session_cookie: RwLock<Option<Secret<String>>>,
}

#[derive(Deserialize)]
struct SessionResponse {
    session: SessionInfo,
}

#[derive(Deserialize)]
struct SessionInfo {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct IssueResponse {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Default, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
}

impl JiraClient {
    /// Build a client without contacting the server.
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            auth: config.auth,
            session_cookie: RwLock::new(None),
        })
    }

    /// Build a client and verify the credentials.
    pub async fn connect(config: &JiraConfig) -> Result<Self> {
        let client = Self::new(config)?;
        info!(
            username = %client.username,
            base_url = %client.base_url,
            auth = ?client.auth,
            "connecting to jira"
        );
        client.authenticate().await?;
        Ok(client)
    }

    /// Establish (or re-establish) the session, or check basic credentials.
    pub async fn authenticate(&self) -> Result<()> {
        match self.auth {
            JiraAuthMode::Session => self.acquire_session_cookie().await,
            JiraAuthMode::Basic => {
                let resp = self
                    .authorize(self.http.get(self.url("/rest/api/2/myself")))
                    .send()
                    .await?;
                self.check_auth(&resp)?;
                expect_success(resp, "credential check").await?;
                Ok(())
            },
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn acquire_session_cookie(&self) -> Result<()> {
        let resp = self
            .http
            .post(self.url("/rest/auth/1/session"))
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password.expose_secret(),
            }))
            .send()
            .await?;
        self.check_auth(&resp)?;
        let resp = expect_success(resp, "session login").await?;
        let body: SessionResponse = resp
            .json()
            .await
            .map_err(|source| Error::decode("session response", source))?;

        let cookie = format!("{}={}", body.session.name, body.session.value);
        *self
            .session_cookie
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(Secret::new(cookie));
        debug!(username = %self.username, "jira session established");
        Ok(())
    }

    async fn fetch_issue(&self, key: &str) -> Result<Response> {
        let url = format!(
            "{}?fields=summary",
            self.url(&format!("/rest/api/2/issue/{}", urlencoding::encode(key)))
        );
        Ok(self.authorize(self.http.get(url)).send().await?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth {
            JiraAuthMode::Basic => {
                request.basic_auth(&self.username, Some(self.password.expose_secret()))
            },
            JiraAuthMode::Session => {
                let cookie = self
                    .session_cookie
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .as_ref()
                    .map(|c| c.expose_secret().clone());
                match cookie {
                    Some(cookie) => request.header(header::COOKIE, cookie),
                    None => request,
                }
            },
        }
    }

    fn check_auth(&self, resp: &Response) -> Result<()> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth {
                username: self.username.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn lookup(&self, key: &str) -> Result<IssueResult> {
        let mut resp = self.fetch_issue(key).await?;

        if resp.status() == StatusCode::UNAUTHORIZED && self.auth == JiraAuthMode::Session {
            warn!(issue_key = key, "jira session expired, logging in again");
            self.acquire_session_cookie().await?;
            resp = self.fetch_issue(key).await?;
        }

        if resp.status() == StatusCode::NOT_FOUND {
            debug!(issue_key = key, "jira issue not found");
            return Ok(IssueResult::NotFound);
        }
        self.check_auth(&resp)?;
        let resp = expect_success(resp, &format!("issue {key}")).await?;
        let issue: IssueResponse = resp
            .json()
            .await
            .map_err(|source| Error::decode(format!("issue {key}"), source))?;

        Ok(IssueResult::Found(Issue {
            key: issue.key,
            summary: issue.fields.summary.unwrap_or_default(),
        }))
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
        body: truncate(&body, MAX_ERROR_BODY),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
