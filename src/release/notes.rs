//! Release notes from merged pull requests
//!
//! The local merge log between two tags names the pull requests; their
//! titles, descriptions, labels and comments come from the hosting service.
//! Notes must be complete: a pull request without a description stops
//! generation instead of producing a hole in the notes.

use crate::core::error::{GitError, ReleaseError, ReleaseResult};
use crate::core::vcs::{MERGE_MARKER, SystemGit};
use crate::remote::{PullRequest, RemoteHost};
use crate::ui::progress::StepProgress;
use regex::Regex;
use std::sync::LazyLock;

static ISSUE_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\d+").expect("valid issue pattern"));

/// Jira instance linked from `<org>/ES...` branches
const JIRA_URL: &str = "https://jira.slac.stanford.edu/issues";

/// One merged pull request as seen in the local log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCommit {
  pub author: String,
  pub date: String,
  pub number: u64,
  /// Source branch as `owner/branch`
  pub branch: String,
}

/// Extract merged pull requests from `git log --pretty=medium` output
///
/// The merge line reads `Merge pull request #<n> from <branch>`. A marker
/// line that is not preceded by a commit header (a repeated mention in the
/// same message) is ignored.
pub fn parse_merge_log(log: &str) -> ReleaseResult<Vec<MergeCommit>> {
  let mut commits = Vec::new();
  let mut author: Option<String> = None;
  let mut date: Option<String> = None;

  for line in log.lines() {
    if let Some(rest) = line.strip_prefix("Author:") {
      author = Some(rest.trim_start().to_string());
    } else if let Some(rest) = line.strip_prefix("Date:") {
      date = Some(rest.trim_start().to_string());
    } else if line.contains(MERGE_MARKER) {
      let (Some(a), Some(d)) = (author.take(), date.take()) else {
        tracing::debug!(line, "merge marker outside a commit header, ignoring");
        continue;
      };

      let tokens: Vec<&str> = line.split_whitespace().collect();
      let number = tokens
        .get(3)
        .and_then(|t| t.strip_prefix('#'))
        .and_then(|n| n.parse::<u64>().ok());

      match (number, tokens.get(5)) {
        (Some(number), Some(branch)) => commits.push(MergeCommit {
          author: a,
          date: d,
          number,
          branch: branch.to_string(),
        }),
        _ => {
          return Err(ReleaseError::Git(GitError::MalformedLog {
            line: line.trim().to_string(),
          }));
        }
      }
    }
  }

  Ok(commits)
}

/// `#<digits>` references across texts, first occurrence order, no repeats
pub fn issue_references<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
  let mut issues: Vec<String> = Vec::new();

  for text in texts {
    for m in ISSUE_REF.find_iter(text) {
      if !issues.iter().any(|i| i == m.as_str()) {
        issues.push(m.as_str().to_string());
      }
    }
  }

  issues
}

/// Jira ticket for branches named `<org>/ES<ticket>`
pub fn jira_link(branch: &str, org: &str) -> Option<String> {
  let prefix = format!("{}/es", org.to_lowercase());
  if !branch.to_lowercase().starts_with(&prefix) {
    return None;
  }

  branch
    .split('/')
    .nth(1)
    .filter(|t| !t.is_empty())
    .map(|ticket| format!("{}/{}", JIRA_URL, ticket))
}

/// Pre-release branch merged into the default branch
pub fn is_release_candidate(base_label: &str, head_label: &str) -> bool {
  (base_label.contains("main") || base_label.contains("master")) && head_label.contains("pre-release")
}

/// Everything rendered for one pull request
#[derive(Debug, Clone)]
pub struct PullRequestRecord {
  pub number: u64,
  pub title: String,
  pub author: String,
  pub date: String,
  pub branch: String,
  pub body: String,
  pub additions: u64,
  pub deletions: u64,
  pub changed_files: u64,
  pub jira: Option<String>,
  /// Lowercase, comma-joined
  pub labels: Option<String>,
  /// Comma-joined `#n` references
  pub issues: Option<String>,
  pub release_candidate: bool,
}

impl PullRequestRecord {
  /// Combine the log entry with the hosted pull request
  ///
  /// Fails when the description is empty.
  pub fn build(commit: &MergeCommit, pr: &PullRequest, comments: &[String], org: &str, repo: &str) -> ReleaseResult<Self> {
    let body = require_description(pr, repo)?;

    let labels: Vec<String> = pr.labels.iter().map(|l| l.name.to_lowercase()).collect();
    let issues = issue_references(std::iter::once(body.as_str()).chain(comments.iter().map(|c| c.as_str())));

    Ok(Self {
      number: commit.number,
      title: pr.title.clone(),
      author: commit.author.clone(),
      date: commit.date.clone(),
      branch: commit.branch.clone(),
      body,
      additions: pr.additions,
      deletions: pr.deletions,
      changed_files: pr.changed_files,
      jira: jira_link(&commit.branch, org),
      labels: join(labels),
      issues: join(issues),
      release_candidate: is_release_candidate(&pr.base.label, &pr.head.label),
    })
  }

  /// Lines changed, used to order summary entries
  pub fn changes(&self) -> u64 {
    self.additions + self.deletions
  }

  fn pull_summary(&self) -> String {
    format!(
      "#{} ({} additions, {} deletions, {} files changed)",
      self.number, self.additions, self.deletions, self.changed_files
    )
  }
}

fn join(items: Vec<String>) -> Option<String> {
  if items.is_empty() { None } else { Some(items.join(", ")) }
}

fn require_description(pr: &PullRequest, repo: &str) -> ReleaseResult<String> {
  match pr.body.as_deref() {
    Some(body) if !body.trim().is_empty() => Ok(body.to_string()),
    _ => Err(ReleaseError::DataQuality {
      message: format!("Pull request #{} has an empty description.", pr.number),
      url: format!("https://github.com/{}/pull/{}", repo, pr.number),
    }),
  }
}

/// Summary sections, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
  InterfaceChange,
  Bug,
  Enhancement,
  Documentation,
  Unlabeled,
}

impl Bucket {
  pub const RENDER_ORDER: [Bucket; 5] = [
    Bucket::InterfaceChange,
    Bucket::Bug,
    Bucket::Enhancement,
    Bucket::Documentation,
    Bucket::Unlabeled,
  ];

  pub fn title(&self) -> &'static str {
    match self {
      Bucket::InterfaceChange => "Interface-change",
      Bucket::Bug => "Bug",
      Bucket::Enhancement => "Enhancement",
      Bucket::Documentation => "Documentation",
      Bucket::Unlabeled => "Unlabeled",
    }
  }

  /// Buckets a record belongs to; labels match case-insensitively as substrings
  pub fn classify(record: &PullRequestRecord) -> Vec<Bucket> {
    let labels = record.labels.as_deref().unwrap_or_default();
    let matched: Vec<Bucket> = Self::RENDER_ORDER
      .iter()
      .copied()
      .filter(|b| *b != Bucket::Unlabeled && labels.contains(&b.title().to_lowercase()))
      .collect();

    if matched.is_empty() {
      vec![Bucket::Unlabeled]
    } else {
      matched
    }
  }
}

/// Rendered notes for a tag range
#[derive(Debug, Clone)]
pub struct ReleaseNotes {
  pub old_tag: String,
  pub records: Vec<PullRequestRecord>,
}

impl ReleaseNotes {
  /// Markdown summary followed by per-PR details
  ///
  /// Release-candidate merges are left out of both sections.
  pub fn render(&self) -> String {
    let mut md = format!("# Pull Requests Since {}\n", self.old_tag);

    for bucket in Bucket::RENDER_ORDER {
      let mut entries: Vec<&PullRequestRecord> = self
        .records
        .iter()
        .filter(|r| Bucket::classify(r).contains(&bucket))
        .collect();
      entries.sort_by(|a, b| b.changes().cmp(&a.changes()));

      let mut section = String::new();
      for entry in entries.iter().filter(|r| !r.release_candidate) {
        section.push_str(&format!(" 1. #{} - {}\n", entry.number, entry.title));
      }

      if !section.is_empty() {
        md.push_str(&format!("### {}\n", bucket.title()));
        md.push_str(&section);
      }
    }

    md.push_str("# Pull Request Details\n");

    let mut details: Vec<&PullRequestRecord> = self.records.iter().filter(|r| !r.release_candidate).collect();
    details.sort_by_key(|r| r.number);

    for entry in details {
      md.push_str(&format!("### {}", entry.title));
      md.push_str("\n|||\n|---:|:---|\n");

      let pull = entry.pull_summary();
      let rows: [(&str, Option<&str>); 7] = [
        ("Author", Some(entry.author.as_str())),
        ("Date", Some(entry.date.as_str())),
        ("Pull", Some(pull.as_str())),
        ("Branch", Some(entry.branch.as_str())),
        ("Issues", entry.issues.as_deref()),
        ("Jira", entry.jira.as_deref()),
        ("Labels", entry.labels.as_deref()),
      ];
      for (name, value) in rows {
        if let Some(value) = value {
          md.push_str(&format!("|**{}:**|{}|\n", name, value));
        }
      }

      md.push_str("\n**Notes:**\n");
      for line in entry.body.lines() {
        md.push_str(&format!("> {}\n", line));
      }
      md.push_str("\n-------\n");
      md.push_str("\n\n");
    }

    md
  }
}

/// Fetch a record for every merged pull request, in log order
///
/// Stops at the first pull request without a description.
pub fn collect_records(
  commits: &[MergeCommit],
  host: &dyn RemoteHost,
  org: &str,
) -> ReleaseResult<Vec<PullRequestRecord>> {
  let mut records = Vec::with_capacity(commits.len());
  let mut progress = StepProgress::new(commits.len(), "Pull requests");

  for commit in commits {
    let pr = host.pull_request(commit.number)?;
    require_description(&pr, host.full_name())?;
    let comments = host.issue_comments(commit.number)?;

    records.push(PullRequestRecord::build(commit, &pr, &comments, org, host.full_name())?);
    progress.step(format!("#{}", commit.number));
  }

  Ok(records)
}

/// Release notes for `old...new`
pub fn generate(git: &SystemGit, host: &dyn RemoteHost, old_tag: &str, new_tag: &str, org: &str) -> ReleaseResult<String> {
  let log = git.merge_log(old_tag, new_tag)?;
  let commits = parse_merge_log(&log)?;
  tracing::debug!(count = commits.len(), "merged pull requests in {}...{}", old_tag, new_tag);

  let records = collect_records(&commits, host, org)?;

  Ok(
    ReleaseNotes {
      old_tag: old_tag.to_string(),
      records,
    }
    .render(),
  )
}
