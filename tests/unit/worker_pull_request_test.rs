//! Pull request jobs: commits, files, status and labels

use kwalitee::api::branch_status_url;
use kwalitee::core::models::{CommentBody, StatusBody, VerdictState};
use kwalitee::worker::WorkerError;

use crate::common::fixtures::{
    BARE_PY, GOOD_MESSAGE, VALID_PY, World, commit_document, pull_request_url,
};
use crate::common::mocks::Call;

const FIRST: &str = "1111111111111111111111111111111111111111";
const HEAD: &str = "2222222222222222222222222222222222222222";
const LABEL: &str = "jane:feature";

fn status_url() -> String {
    branch_status_url("https://kwalitee.example.org", "invenio", "kwalitee", LABEL)
}

#[test]
fn clean_pull_request_moves_to_integration() {
    let world = World::new();
    let document = world.publish_pull_request(
        "Search facets",
        vec![commit_document(FIRST, GOOD_MESSAGE, &[]), commit_document(HEAD, GOOD_MESSAGE, &[])],
        &[("kwalitee/app.py", VALID_PY)],
        &["bug", "in_review"],
    );
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);

    let report = world.worker().pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();

    assert_eq!(report.verdict.state, VerdictState::Success);
    assert_eq!(report.verdict.content.commits, [FIRST, HEAD]);
    assert_eq!(report.labels.as_deref(), Some(&["bug".to_string(), "in_integration".to_string()][..]));
    assert_eq!(
        world.hosting.label_writes(),
        [(
            format!("{}/labels", document.issue_url),
            vec!["bug".to_string(), "in_integration".to_string()]
        )]
    );
    assert_eq!(
        world.hosting.statuses(),
        [(
            document.statuses_url,
            StatusBody::new("success", &status_url(), "[success] 0 errors", "kwalitee")
        )]
    );
    assert_eq!(world.reload_branch(branch.id).state, VerdictState::Success);
}

#[test]
fn checked_pull_request_is_not_checked_again() {
    let world = World::new();
    world.publish_pull_request(
        "Search facets",
        vec![commit_document(HEAD, GOOD_MESSAGE, &[])],
        &[("kwalitee/app.py", VALID_PY)],
        &[],
    );
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);
    let worker = world.worker();

    worker.pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();
    world.hosting.clear_calls();
    let second = worker.pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();

    assert!(world.hosting.calls().is_empty());
    assert!(second.labels.is_none());
    assert!(second.status.is_none());
    assert_eq!(second.verdict.state, VerdictState::Success);
}

#[test]
fn wip_pull_request_is_labelled_and_left_pending() {
    let world = World::new();
    let document = world.publish_pull_request(
        "WIP: search facets",
        vec![commit_document(HEAD, "Fix stuff.", &[])],
        &[("kwalitee/app.py", BARE_PY)],
        &["in_review"],
    );
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);

    let report = world.worker().pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();

    assert_eq!(report.verdict.state, VerdictState::Pending);
    assert!(report.verdict.content.files.is_none());
    assert!(report.status.is_none());
    assert_eq!(report.labels, Some(vec!["in_work".to_string()]));
    assert!(!world.hosting.calls().contains(&Call::Get(document.files_url)));
    assert!(world.hosting.comments().is_empty());
    assert!(!world.commit_verdict(HEAD).content.message_checked);
}

#[test]
fn message_findings_are_commented_without_reviewer_quorum() {
    let world = World::new();
    let commit = commit_document(HEAD, "search: fixes facets", &[]);
    let comments_url = commit.comments_url.clone();
    world.publish_pull_request(
        "Search facets",
        vec![commit],
        &[("kwalitee/app.py", VALID_PY)],
        &["in_work"],
    );
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);

    let report = world.worker().pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();

    assert_eq!(
        world.hosting.comments(),
        [(
            comments_url,
            CommentBody::Plain {
                body: "1: M101 signature is missing".to_string()
            }
        )]
    );
    assert_eq!(report.verdict.state, VerdictState::Error);
    assert_eq!(report.verdict.error_count, 2);
    assert_eq!(report.labels, Some(vec!["in_review".to_string()]));
    assert_eq!(report.status.unwrap().description, "[error] 2 errors");
    assert!(world.commit_verdict(HEAD).content.message_checked);
}

#[test]
fn file_findings_become_review_comments() {
    let world = World::new();
    let document = world.publish_pull_request(
        "Search facets",
        vec![commit_document(HEAD, GOOD_MESSAGE, &[])],
        &[("kwalitee/app.py", BARE_PY)],
        &[],
    );
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);

    let report = world.worker().pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();

    assert_eq!(
        world.hosting.comments(),
        [(
            document.review_comments_url,
            CommentBody::File {
                body: "1: L101 copyright is missing".to_string(),
                commit_id: HEAD.to_string(),
                path: "kwalitee/app.py".to_string(),
                position: 0,
            }
        )]
    );
    assert_eq!(report.verdict.error_count, 1);
    assert_eq!(report.verdict.state, VerdictState::Error);
}

#[test]
fn repository_file_overrides_the_checks() {
    let world = World::new();
    world.hosting.with(|s| {
        s.repository_files.insert(
            "invenio/kwalitee/master/.kwalitee.toml".to_string(),
            b"[checks]\ncheck_wip = true\n".to_vec(),
        );
    });
    world.publish_pull_request(
        "WIP: search facets",
        vec![commit_document(HEAD, GOOD_MESSAGE, &[])],
        &[("kwalitee/app.py", VALID_PY)],
        &[],
    );
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);

    let report = world.worker().pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();

    assert_eq!(report.verdict.state, VerdictState::Success);
    assert!(report.status.is_some());
    assert_eq!(report.labels, Some(vec!["in_work".to_string()]));
}

#[test]
fn unreadable_repository_file_is_ignored() {
    let world = World::new();
    world.hosting.with(|s| {
        s.repository_files.insert(
            "invenio/kwalitee/master/.kwalitee.toml".to_string(),
            b"[checks\n".to_vec(),
        );
    });
    world.publish_pull_request(
        "WIP: search facets",
        vec![commit_document(HEAD, GOOD_MESSAGE, &[])],
        &[],
        &[],
    );
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);

    let report = world.worker().pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();

    assert_eq!(report.verdict.state, VerdictState::Pending);
}

#[test]
fn failed_pull_request_fetch_aborts() {
    let world = World::new();
    world.publish_pull_request("Search facets", vec![commit_document(HEAD, GOOD_MESSAGE, &[])], &[], &[]);
    world.hosting.fail(&pull_request_url());
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);

    let err = world.worker().pull_request(branch.id, &pull_request_url(), &status_url()).unwrap_err();

    assert!(matches!(err, WorkerError::Hosting(_)));
    assert_eq!(world.reload_branch(branch.id).state, VerdictState::Pending);
    assert!(world.hosting.label_writes().is_empty());
}

#[test]
fn label_failures_keep_the_verdict() {
    let world = World::new();
    let document = world.publish_pull_request(
        "Search facets",
        vec![commit_document(HEAD, GOOD_MESSAGE, &[])],
        &[("kwalitee/app.py", VALID_PY)],
        &[],
    );
    world.hosting.fail(&document.issue_url);
    let branch = world.branch_verdict(&world.commit_verdict(HEAD), LABEL);

    let report = world.worker().pull_request(branch.id, &pull_request_url(), &status_url()).unwrap();

    assert!(report.labels.is_none());
    assert!(world.hosting.label_writes().is_empty());
    assert_eq!(world.reload_branch(branch.id).state, VerdictState::Success);
}
