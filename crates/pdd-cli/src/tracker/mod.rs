//! Blocking HTTP clients for the supported issue trackers.

pub mod gitea;
pub mod github;

use std::time::Duration;

use clap::ValueEnum;
use pdd_core::vcs::{Issue, IssueAuthor, Operation, TransportError};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub use gitea::GiteaVcs;
pub use github::GithubVcs;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Supported tracker providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrackerKind {
    Gitea,
    Github,
}

impl TrackerKind {
    /// Provider name used in ledger keys and `.0nepdd.yml` alert sections.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gitea => "gitea",
            Self::Github => "github",
        }
    }
}

/// Issue as returned by both the Gitea and GitHub REST APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct WireIssue {
    pub number: u64,
    pub html_url: String,
    pub state: String,
    pub user: WireUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: u64,
    pub login: String,
}

impl From<WireIssue> for Issue {
    fn from(wire: WireIssue) -> Self {
        Self {
            author: IssueAuthor {
                id: wire.user.id.to_string(),
                username: wire.user.login,
            },
            href: wire.html_url,
            number: wire.number.to_string(),
            closed: wire.state.eq_ignore_ascii_case("closed"),
        }
    }
}

/// One request target: what is being done and to which issue or repo.
pub struct Call<'a> {
    pub operation: Operation,
    pub subject: &'a str,
}

/// JSON-over-HTTP plumbing shared by the tracker clients.
pub struct HttpClient {
    agent: ureq::Agent,
    accept: &'static str,
    authorization: Option<String>,
}

impl HttpClient {
    pub fn new(accept: &'static str, authorization: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pdd/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            accept,
            authorization,
        }
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = self.agent.request(method, url).set("Accept", self.accept);
        match &self.authorization {
            Some(auth) => request.set("Authorization", auth),
            None => request,
        }
    }

    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        call: &Call<'_>,
    ) -> Result<T, TransportError> {
        tracing::debug!(operation = %call.operation, url, "tracker request");
        let response = self
            .request("GET", url)
            .call()
            .map_err(|err| transport_error(call, err))?;
        decode(response, call)
    }

    pub fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        body: &serde_json::Value,
        call: &Call<'_>,
    ) -> Result<T, TransportError> {
        let response = self.send(method, url, body, call)?;
        decode(response, call)
    }

    /// Send a request whose response body is not needed.
    pub fn send_discard(
        &self,
        method: &str,
        url: &str,
        body: &serde_json::Value,
        call: &Call<'_>,
    ) -> Result<(), TransportError> {
        self.send(method, url, body, call).map(drop)
    }

    fn send(
        &self,
        method: &str,
        url: &str,
        body: &serde_json::Value,
        call: &Call<'_>,
    ) -> Result<ureq::Response, TransportError> {
        tracing::debug!(operation = %call.operation, method, url, "tracker request");
        self.request(method, url)
            .send_json(body)
            .map_err(|err| transport_error(call, err))
    }
}

fn decode<T: DeserializeOwned>(
    response: ureq::Response,
    call: &Call<'_>,
) -> Result<T, TransportError> {
    response
        .into_json::<T>()
        .map_err(|err| TransportError::Decode {
            operation: call.operation,
            subject: call.subject.to_string(),
            message: err.to_string(),
        })
}

fn transport_error(call: &Call<'_>, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(status, response) => TransportError::Status {
            operation: call.operation,
            subject: call.subject.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => TransportError::Network {
            operation: call.operation,
            subject: call.subject.to_string(),
            message: transport.to_string(),
        },
    }
}

/// Strip trailing slashes so URLs can be joined with `/`.
pub fn base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
