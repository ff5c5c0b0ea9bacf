use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use reqwest::Client;
use reqwest::header::{HeaderMap, LINK};
use serde::Deserialize;
use serde_json::Value;

use crate::rate_limit;

const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const OWNED_REPOS_URL: &str = "https://api.github.com/user/repos?type=owner&per_page=100";
const USER_AGENT: &str = "readme-stats";

#[derive(Deserialize)]
struct CountObj {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

/// Contribution totals pulled in one GraphQL round trip.
#[derive(Debug)]
pub struct ContributionMetrics {
    pub contributions: u64,
    pub commits: u64,
    pub merged_prs: u64,
}

pub struct GithubClient {
    token: String,
    http: Client,
    graphql_url: String,
    repos_url: String,
}

impl GithubClient {
    /// Create a GitHub client for the given pre-issued access token.
    pub fn new(token: String) -> Self {
        Self::with_endpoints(token, GRAPHQL_URL.into(), OWNED_REPOS_URL.into())
    }

    /// Same as [`GithubClient::new`] but aimed at alternate endpoints.
    /// Tests use this to point the client at a local mock server.
    pub fn with_endpoints(token: String, graphql_url: String, repos_url: String) -> Self {
        Self {
            token,
            http: Client::new(),
            graphql_url,
            repos_url,
        }
    }

    /// Low-level GraphQL request with rate-limit and `errors` checking.
    async fn graphql(&self, query: &str) -> Result<Value> {
        let resp = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Network error sending GraphQL request: {e}"))?;

        rate_limit::pause_if_depleted(resp.headers()).await;

        let status = resp.status();
        let json: Value = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON from GitHub: {e}"))?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "GitHub API returned HTTP {}: {json:#}",
                status.as_u16()
            ));
        }

        // A 200 can still carry a top-level `errors` list; that is a hard
        // failure, no partial results are extracted.
        if let Some(errors) = json.get("errors") {
            return Err(anyhow::anyhow!("GraphQL reported errors: {errors:#}"));
        }

        Ok(json)
    }

    /// Fetch the current year's contribution count, the commit total summed
    /// across up to 100 repositories, and the merged pull-request count, all
    /// in a single query.
    ///
    /// `commitContributionsByRepository` is capped at 100 repositories by
    /// the API; commits in repositories beyond that page are not counted.
    pub async fn contribution_metrics(&self) -> Result<ContributionMetrics> {
        let year = Utc::now().year();
        let from = format!("{year}-01-01T00:00:00Z");
        let to = format!("{year}-12-31T23:59:59Z");

        let query = format!(
            r#"
            query {{
                viewer {{
                    contributionsCollection(from: "{from}", to: "{to}") {{
                        contributionCalendar {{
                            totalContributions
                        }}
                        commitContributionsByRepository(maxRepositories: 100) {{
                            contributions {{
                                totalCount
                            }}
                        }}
                    }}
                    pullRequests(first: 100, states: MERGED) {{
                        totalCount
                    }}
                }}
            }}
            "#
        );

        #[derive(Deserialize)]
        struct MetricsResponse {
            data: Option<MetricsData>,
        }
        #[derive(Deserialize)]
        struct MetricsData {
            viewer: Option<Viewer>,
        }
        #[derive(Deserialize)]
        struct Viewer {
            #[serde(rename = "contributionsCollection")]
            contributions_collection: ContributionsCollection,
            #[serde(rename = "pullRequests")]
            pull_requests: CountObj,
        }
        #[derive(Deserialize)]
        struct ContributionsCollection {
            #[serde(rename = "contributionCalendar")]
            contribution_calendar: Calendar,
            #[serde(rename = "commitContributionsByRepository")]
            commit_contributions_by_repository: Vec<RepoContributions>,
        }
        #[derive(Deserialize)]
        struct Calendar {
            #[serde(rename = "totalContributions")]
            total_contributions: u64,
        }
        #[derive(Deserialize)]
        struct RepoContributions {
            contributions: CountObj,
        }

        let json = self.graphql(&query).await?;
        let parsed: MetricsResponse = serde_json::from_value(json)
            .context("Failed to deserialize contribution metrics response")?;

        let viewer = parsed
            .data
            .and_then(|d| d.viewer)
            .ok_or_else(|| anyhow::anyhow!("GraphQL response missing viewer data"))?;

        let commits = viewer
            .contributions_collection
            .commit_contributions_by_repository
            .iter()
            .map(|r| r.contributions.total_count)
            .sum();

        Ok(ContributionMetrics {
            contributions: viewer
                .contributions_collection
                .contribution_calendar
                .total_contributions,
            commits,
            merged_prs: viewer.pull_requests.total_count,
        })
    }

    /// Sum stargazers across every owned repository, following the `Link`
    /// header's `rel="next"` URL until the listing is exhausted.
    pub async fn total_stars(&self) -> Result<u64> {
        #[derive(Deserialize)]
        struct Repo {
            stargazers_count: u64,
        }

        let mut stars = 0u64;
        let mut url = Some(self.repos_url.clone());

        while let Some(page_url) = url {
            let resp = self
                .http
                .get(&page_url)
                .bearer_auth(&self.token)
                .header("User-Agent", USER_AGENT)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("Network error listing repositories: {e}"))?;

            rate_limit::pause_if_depleted(resp.headers()).await;

            let status = resp.status();
            if !status.is_success() {
                return Err(anyhow::anyhow!(
                    "GitHub API returned HTTP {} listing repositories",
                    status.as_u16()
                ));
            }

            url = next_page_url(resp.headers());

            let repos: Vec<Repo> = resp
                .json()
                .await
                .context("Failed to deserialize repository listing")?;
            stars += repos.iter().map(|r| r.stargazers_count).sum::<u64>();
        }

        Ok(stars)
    }
}

/// First URL carrying `rel="next"` in an RFC 8288 `Link` header, verbatim.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(LINK)?.to_str().ok()?;

    for part in header.split(',') {
        let mut url = None;
        let mut is_next = false;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(segment[1..segment.len() - 1].to_string());
            } else if segment == r#"rel="next""# {
                is_next = true;
            }
        }

        if is_next {
            return url;
        }
    }

    None
}
