use pdd_core::config::RepoConfig;
use pdd_core::vcs::{Issue, Operation, RepoInfo, TransportError, Vcs};
use serde_json::json;

use super::{Call, HttpClient, WireIssue, base_url};

/// GitHub repository accessed through the REST API.
pub struct GithubVcs {
    http: HttpClient,
    api_url: String,
    web_url: String,
    repo: RepoInfo,
    config: RepoConfig,
}

impl GithubVcs {
    pub fn new(
        api_url: &str,
        web_url: &str,
        token: Option<&str>,
        repo: RepoInfo,
        config: RepoConfig,
    ) -> Self {
        Self {
            http: HttpClient::new(
                "application/vnd.github+json",
                token.map(|t| format!("Bearer {t}")),
            ),
            api_url: base_url(api_url),
            web_url: base_url(web_url),
            repo,
            config,
        }
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/issues", self.api_url, self.repo.full_name)
    }

    fn subject(&self, number: &str) -> String {
        format!("{}#{number}", self.repo.full_name)
    }
}

impl Vcs for GithubVcs {
    fn name(&self) -> &str {
        "github"
    }

    fn repo(&self) -> &RepoInfo {
        &self.repo
    }

    fn config(&self) -> &RepoConfig {
        &self.config
    }

    fn issue(&self, number: &str) -> Result<Issue, TransportError> {
        let subject = self.subject(number);
        let call = Call {
            operation: Operation::FetchIssue,
            subject: &subject,
        };
        let wire: WireIssue = self
            .http
            .get_json(&format!("{}/{number}", self.issues_url()), &call)?;
        Ok(wire.into())
    }

    fn create_issue(&self, title: &str, body: &str) -> Result<Option<Issue>, TransportError> {
        let call = Call {
            operation: Operation::CreateIssue,
            subject: &self.repo.full_name,
        };
        let wire: WireIssue = self.http.send_json(
            "POST",
            &self.issues_url(),
            &json!({ "title": title, "body": body }),
            &call,
        )?;
        Ok(Some(wire.into()))
    }

    fn close_issue(&self, number: &str) -> Result<(), TransportError> {
        let subject = self.subject(number);
        let call = Call {
            operation: Operation::CloseIssue,
            subject: &subject,
        };
        self.http.send_discard(
            "PATCH",
            &format!("{}/{number}", self.issues_url()),
            &json!({ "state": "closed", "state_reason": "completed" }),
            &call,
        )
    }

    fn add_comment(&self, number: &str, message: &str) -> Result<(), TransportError> {
        let subject = self.subject(number);
        let call = Call {
            operation: Operation::AddComment,
            subject: &subject,
        };
        self.http.send_discard(
            "POST",
            &format!("{}/{number}/comments", self.issues_url()),
            &json!({ "body": message }),
            &call,
        )
    }

    fn puzzle_link_for_commit(&self, sha: &str, file: &str, start: &str, stop: &str) -> String {
        format!(
            "{}/{}/blob/{sha}/{file}#L{start}-L{stop}",
            self.web_url, self.repo.full_name
        )
    }
}
