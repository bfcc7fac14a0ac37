//! JSON fixture builders shaped like GitHub REST payloads.
//!
//! Only the fields the collectors read are populated.
//!
//! # Examples
//!
//! ```
//! use tally::contributions::test_support::{issue_json, pull_request_marker};
//!
//! let issue = issue_json(7, "alice", "2025-02-01T00:00:00Z");
//! assert_eq!(issue["user"]["login"], "alice");
//!
//! let disguised = pull_request_marker(issue);
//! assert!(disguised.get("pull_request").is_some());
//! ```

use serde_json::{Value, json};

/// A commit linked to `login` as both author and committer.
#[must_use]
pub fn commit_json(sha: &str, login: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "html_url": format!("https://github.com/o/r/commit/{sha}"),
        "commit": {
            "message": format!("Change {sha}\n\nLonger description"),
            "author": { "name": login, "date": date },
            "committer": { "name": login, "date": date }
        },
        "author": { "login": login },
        "committer": { "login": login }
    })
}

/// A commit whose author has no linked GitHub account.
#[must_use]
pub fn unlinked_commit_json(sha: &str, name: &str, committer_login: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "html_url": format!("https://github.com/o/r/commit/{sha}"),
        "commit": {
            "message": "Unlinked change",
            "author": { "name": name, "date": date }
        },
        "author": null,
        "committer": { "login": committer_login }
    })
}

/// A pull request opened by `login`.
#[must_use]
pub fn pull_request_json(number: u64, login: &str, created_at: &str, merged: bool) -> Value {
    json!({
        "number": number,
        "title": format!("Pull request {number}"),
        "state": if merged { "closed" } else { "open" },
        "created_at": created_at,
        "merged_at": if merged { Value::from(created_at) } else { Value::Null },
        "html_url": format!("https://github.com/o/r/pull/{number}"),
        "user": { "login": login }
    })
}

/// An issue opened by `login`.
#[must_use]
pub fn issue_json(number: u64, login: &str, created_at: &str) -> Value {
    json!({
        "number": number,
        "title": format!("Issue {number}"),
        "state": "open",
        "created_at": created_at,
        "html_url": format!("https://github.com/o/r/issues/{number}"),
        "user": { "login": login }
    })
}

/// Adds the `pull_request` object GitHub attaches to pull requests listed by
/// the issues endpoint.
#[must_use]
pub fn pull_request_marker(mut issue: Value) -> Value {
    if let Some(object) = issue.as_object_mut() {
        object.insert(
            "pull_request".to_owned(),
            json!({ "url": "https://api.github.com/repos/o/r/pulls/1" }),
        );
    }
    issue
}

/// A submitted review by `login`.
#[must_use]
pub fn review_json(login: &str, state: &str, submitted_at: &str) -> Value {
    json!({
        "user": { "login": login },
        "state": state,
        "submitted_at": submitted_at,
        "body": format!("{state} by {login}")
    })
}
