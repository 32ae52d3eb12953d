//! Webhook deliveries through the dispatcher and into the worker

use std::sync::Arc;

use kwalitee::api::{Dispatcher, ErrorCode, WebhookEvent};
use kwalitee::core::models::VerdictState;
use kwalitee::worker::{Job, JobReport};

use crate::common::fixtures::{
    API, GOOD_MESSAGE, VALID_PY, World, commit_document, html_url, pull_request_html,
    pull_request_url,
};
use crate::common::mocks::RecordingQueue;

const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

fn dispatcher(world: &World, queue: Arc<RecordingQueue>) -> Dispatcher {
    Dispatcher::new(world.store.clone(), queue, Arc::new(world.config.clone()))
}

fn push_event(owner: &str) -> WebhookEvent {
    let body = serde_json::json!({
        "commits": [{"id": SHA, "url": html_url(SHA)}],
        "repository": {"name": "kwalitee", "owner": {"name": owner}},
    });
    WebhookEvent::parse(Some("push"), body.to_string().as_bytes()).unwrap()
}

fn pull_request_event(action: &str) -> WebhookEvent {
    let body = serde_json::json!({
        "action": action,
        "pull_request": {
            "url": pull_request_url(),
            "html_url": pull_request_html(),
            "title": "Search facets",
            "head": {"sha": SHA, "label": "jane:feature"},
        },
        "repository": {"name": "kwalitee", "owner": {"login": "invenio"}},
    });
    WebhookEvent::parse(Some("pull_request"), body.to_string().as_bytes()).unwrap()
}

#[test]
fn push_is_queued_with_api_and_status_urls() {
    let world = World::new();
    let queue = Arc::new(RecordingQueue::default());

    let ack = dispatcher(&world, queue.clone()).dispatch(&push_event("invenio")).unwrap();

    let status_url = format!("https://kwalitee.example.org/api/commits/invenio/kwalitee/{SHA}");
    assert_eq!(ack.state.as_deref(), Some("pending"));
    assert_eq!(ack.target_url.as_deref(), Some(status_url.as_str()));
    let verdict = world.commit_verdict(SHA);
    assert_eq!(
        queue.jobs(),
        [Job::Push {
            commit_id: verdict.id,
            commit_url: format!("{API}/repos/invenio/kwalitee/commits/{SHA}"),
            status_url,
        }]
    );
}

#[test]
fn queued_push_is_checked_by_the_worker() {
    let world = World::new();
    let queue = Arc::new(RecordingQueue::default());
    let dispatcher = dispatcher(&world, queue.clone());
    world.publish_commit(SHA, GOOD_MESSAGE, &[("kwalitee/app.py", VALID_PY)]);

    dispatcher.dispatch(&push_event("invenio")).unwrap();
    let jobs = queue.jobs();
    let report = world.worker().run(&jobs[0]).unwrap();

    assert!(matches!(report, JobReport::Push(ref r) if r.verdict.state == VerdictState::Success));
    let data = dispatcher.commit("invenio", "kwalitee", SHA).unwrap();
    assert_eq!(data.repository, "invenio/kwalitee");
    assert_eq!(data.verdict.state, VerdictState::Success);
    assert!(data.message.is_empty());
    assert_eq!(dispatcher.commits("invenio", "kwalitee").unwrap().commits.len(), 1);
}

#[test]
fn queued_pull_request_is_checked_by_the_worker() {
    let world = World::new();
    let queue = Arc::new(RecordingQueue::default());
    let dispatcher = dispatcher(&world, queue.clone());
    world.publish_pull_request(
        "Search facets",
        vec![commit_document(SHA, GOOD_MESSAGE, &[])],
        &[("kwalitee/app.py", VALID_PY)],
        &[],
    );

    let ack = dispatcher.dispatch(&pull_request_event("synchronize")).unwrap();
    assert_eq!(
        ack.target_url.as_deref(),
        Some("https://kwalitee.example.org/api/branches/invenio/kwalitee/jane:feature")
    );
    let jobs = queue.jobs();
    assert!(matches!(&jobs[..], [Job::PullRequest { pull_request_url: url, .. }] if *url == pull_request_url()));
    world.worker().run(&jobs[0]).unwrap();

    let data = dispatcher.branch("invenio", "kwalitee", "jane:feature").unwrap();
    assert_eq!(data.verdicts.len(), 1);
    assert_eq!(data.verdicts[0].state, VerdictState::Success);

    let head = dispatcher.branch_head("invenio", "kwalitee", "jane:feature", SHA).unwrap();
    assert_eq!(head.verdict.id, data.verdicts[0].id);
    assert_eq!(head.verdict.state, VerdictState::Success);
}

#[test]
fn closed_pull_request_is_rejected() {
    let world = World::new();
    let queue = Arc::new(RecordingQueue::default());

    let err = dispatcher(&world, queue.clone()).dispatch(&pull_request_event("closed")).unwrap_err();

    assert_eq!(err.code, ErrorCode::BadRequest);
    assert_eq!(err.message, "Pull request action closed is not supported");
    assert!(queue.jobs().is_empty());
}

#[test]
fn unregistered_owner_is_acknowledged_with_an_error() {
    let world = World::new();
    let queue = Arc::new(RecordingQueue::default());

    let ack = dispatcher(&world, queue.clone()).dispatch(&push_event("someone")).unwrap();

    assert_eq!(ack.state.as_deref(), Some("error"));
    assert_eq!(ack.description.as_deref(), Some("someone/kwalitee is not yet registered"));
    assert!(queue.jobs().is_empty());
}

#[test]
fn auto_create_registers_unknown_repositories() {
    let mut config = crate::common::fixtures::config();
    config.hosting.auto_create = true;
    let world = World::with_config(config);
    let queue = Arc::new(RecordingQueue::default());

    let ack = dispatcher(&world, queue.clone()).dispatch(&push_event("someone")).unwrap();

    assert_eq!(ack.state.as_deref(), Some("pending"));
    assert_eq!(queue.jobs().len(), 1);
}

#[test]
fn closed_queue_is_an_internal_error() {
    let world = World::new();
    let queue = Arc::new(RecordingQueue {
        closed: true,
        ..RecordingQueue::default()
    });

    let err = dispatcher(&world, queue).dispatch(&push_event("invenio")).unwrap_err();

    assert_eq!(err.status_code(), 500);
}

#[test]
fn unknown_commit_is_not_found() {
    let world = World::new();
    let dispatcher = dispatcher(&world, Arc::new(RecordingQueue::default()));

    let err = dispatcher.commit("invenio", "kwalitee", SHA).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = dispatcher.commits("invenio", "other").unwrap_err();
    assert_eq!(err.message, "invenio/other isn't registered yet.");
}
