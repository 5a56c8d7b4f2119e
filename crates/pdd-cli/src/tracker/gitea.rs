use pdd_core::config::RepoConfig;
use pdd_core::vcs::{Issue, Operation, RepoInfo, TransportError, Vcs};
use serde_json::json;

use super::{Call, HttpClient, WireIssue, base_url};

/// Gitea repository accessed through the `/api/v1` REST API.
pub struct GiteaVcs {
    http: HttpClient,
    host: String,
    repo: RepoInfo,
    config: RepoConfig,
}

impl GiteaVcs {
    pub fn new(host: &str, token: Option<&str>, repo: RepoInfo, config: RepoConfig) -> Self {
        Self {
            http: HttpClient::new("application/json", token.map(|t| format!("token {t}"))),
            host: base_url(host),
            repo,
            config,
        }
    }

    fn issues_url(&self) -> String {
        format!("{}/api/v1/repos/{}/issues", self.host, self.repo.full_name)
    }

    fn subject(&self, number: &str) -> String {
        format!("{}#{number}", self.repo.full_name)
    }
}

impl Vcs for GiteaVcs {
    fn name(&self) -> &str {
        "gitea"
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
            &json!({ "state": "closed" }),
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
            "{}/{}/src/{sha}/{file}#L{start}-L{stop}",
            self.host, self.repo.full_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::stub;

    fn vcs(host: &str) -> GiteaVcs {
        GiteaVcs::new(
            host,
            Some("secret"),
            RepoInfo::new("owner/repo", "master"),
            RepoConfig::default(),
        )
    }

    #[test]
    fn issues_url_uses_api_v1() {
        assert_eq!(
            vcs("https://git.example.com/").issues_url(),
            "https://git.example.com/api/v1/repos/owner/repo/issues"
        );
    }

    #[test]
    fn puzzle_link_points_at_line_range() {
        assert_eq!(
            vcs("https://git.example.com").puzzle_link_for_commit("abc", "src/x.py", "3", "5"),
            "https://git.example.com/owner/repo/src/abc/src/x.py#L3-L5"
        );
    }

    #[test]
    fn close_patches_issue_state() {
        let (url, server) = stub::respond("201 Created", "{}");

        vcs(&url).close_issue("7").expect("closed");
        let (request_line, body) = server.join().expect("stub thread");

        assert_eq!(request_line, "PATCH /api/v1/repos/owner/repo/issues/7 HTTP/1.1");
        assert_eq!(body, r#"{"state":"closed"}"#);
    }

    #[test]
    fn rejected_comment_reports_status() {
        let (url, server) = stub::respond("403 Forbidden", "no access");

        let err = vcs(&url)
            .add_comment("7", "hello")
            .expect_err("forbidden");
        server.join().expect("stub thread");

        assert!(matches!(
            err,
            TransportError::Status { status: 403, ref body, .. } if body == "no access"
        ));
        assert_eq!(err.operation(), Operation::AddComment);
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        let err = vcs("http://127.0.0.1:1").issue("7").expect_err("refused");
        match err {
            TransportError::Network {
                operation, subject, ..
            } => {
                assert_eq!(operation, Operation::FetchIssue);
                assert_eq!(subject, "owner/repo#7");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
