use serde::{Deserialize, Serialize};

/// Ordered set of lowercase trigger substrings.
///
/// Matching is a plain substring test against the lowercased input, so
/// "repo" also matches "repository" and "reports". Order only matters where
/// several sets are consulted in sequence (see [`OperationRouter`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() || out.contains(&keyword) {
                continue;
            }
            out.push(keyword);
        }
        Self { keywords: out }
    }

    /// Parses a comma separated list, e.g. from an environment variable.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Triggers that mean a prompt wants GitHub data.
    pub fn github_intent() -> Self {
        Self::new([
            "github",
            "repository",
            "repo",
            "issue",
            "pull request",
            "commit",
            "branch",
        ])
    }
}

/// Decides whether a prompt needs data from the Tool Server.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    triggers: KeywordSet,
}

impl IntentClassifier {
    pub fn new(triggers: KeywordSet) -> Self {
        Self { triggers }
    }

    pub fn requires_tools(&self, prompt: &str) -> bool {
        self.triggers.matches(prompt)
    }

    pub fn triggers(&self) -> &KeywordSet {
        &self.triggers
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(KeywordSet::github_intent())
    }
}

/// Category of GitHub operation the Tool Server is asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Repository,
    Issues,
    PullRequests,
    General,
}

/// First-match-wins mapping from query text to an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRouter {
    rules: Vec<(KeywordSet, Operation)>,
}

impl OperationRouter {
    pub fn new(rules: Vec<(KeywordSet, Operation)>) -> Self {
        Self { rules }
    }

    pub fn route(&self, query: &str) -> Operation {
        self.rules
            .iter()
            .find(|(keywords, _)| keywords.matches(query))
            .map(|(_, op)| *op)
            .unwrap_or(Operation::General)
    }

    /// Repository, then issues, then pull requests; anything else is general.
    pub fn github(repository: KeywordSet, issues: KeywordSet, pull_requests: KeywordSet) -> Self {
        Self::new(vec![
            (repository, Operation::Repository),
            (issues, Operation::Issues),
            (pull_requests, Operation::PullRequests),
        ])
    }

    pub fn repository_keywords() -> KeywordSet {
        KeywordSet::new(["repository", "repo"])
    }

    pub fn issue_keywords() -> KeywordSet {
        KeywordSet::new(["issue"])
    }

    pub fn pull_request_keywords() -> KeywordSet {
        KeywordSet::new(["pull request", "pr"])
    }
}

impl Default for OperationRouter {
    fn default() -> Self {
        Self::github(
            Self::repository_keywords(),
            Self::issue_keywords(),
            Self::pull_request_keywords(),
        )
    }
}
