//! Verdict state is derived from content alone

use kwalitee::adapters::SqliteVerdictStore;
use kwalitee::core::models::{
    BranchContent, CommitContent, FileReport, FileReports, Finding, FindingCode, VerdictState,
};
use kwalitee::core::ports::VerdictStore;
use proptest::prelude::*;

fn findings(lines: Vec<usize>) -> Vec<Finding> {
    lines.into_iter().map(|line| Finding::new(line, FindingCode::SignatureMissing)).collect()
}

fn files_strategy() -> impl Strategy<Value = Option<FileReports>> {
    prop::option::of(prop::collection::btree_map(
        "[a-z]{1,8}\\.py",
        prop::collection::vec(1usize..50, 0..3).prop_map(|lines| FileReport {
            sha: "abc".to_string(),
            errors: findings(lines),
        }),
        0..4,
    ))
}

fn content_strategy() -> impl Strategy<Value = CommitContent> {
    (prop::collection::vec(1usize..10, 0..4), any::<bool>(), files_strategy()).prop_map(
        |(message, message_checked, files)| CommitContent {
            message: findings(message),
            message_checked,
            files,
        },
    )
}

fn expected_state(count: usize, files_resolved: bool) -> VerdictState {
    match (files_resolved, count) {
        (false, _) => VerdictState::Pending,
        (true, 0) => VerdictState::Success,
        (true, _) => VerdictState::Error,
    }
}

proptest! {
    #[test]
    fn commit_state_survives_a_store_round_trip(content in content_strategy()) {
        let store = SqliteVerdictStore::in_memory().unwrap();
        let account = store.find_or_create_account("invenio").unwrap();
        let repository = store.find_or_create_repository(account.id, "kwalitee").unwrap();
        let mut verdict = store.find_or_create_commit(repository.id, "abc", "https://c").unwrap();

        verdict.set_content(content.clone());
        prop_assert!(store.save_commit(&verdict).unwrap());
        let stored = store.get_commit(verdict.id).unwrap().unwrap();

        let file_errors: usize =
            content.files.iter().flat_map(|f| f.values()).map(|r| r.errors.len()).sum();
        let count = content.message.len() + file_errors;
        prop_assert_eq!(stored.error_count, count);
        prop_assert_eq!(stored.state, expected_state(count, content.files.is_some()));
        prop_assert_eq!(stored.content.derive(), (stored.state, stored.error_count));
    }

    #[test]
    fn branch_counts_message_errors_of_listed_commits(
        first in content_strategy(),
        second in content_strategy(),
        files in files_strategy(),
    ) {
        let store = SqliteVerdictStore::in_memory().unwrap();
        let account = store.find_or_create_account("invenio").unwrap();
        let repository = store.find_or_create_repository(account.id, "kwalitee").unwrap();
        let mut a = store.find_or_create_commit(repository.id, "aaa", "https://a").unwrap();
        let mut b = store.find_or_create_commit(repository.id, "bbb", "https://b").unwrap();
        a.set_content(first);
        b.set_content(second);
        let mut branch = store
            .find_or_create_branch(b.id, "jane:feature", "https://pr", &BranchContent::default())
            .unwrap();

        let content = BranchContent {
            commits: vec![a.sha.clone(), b.sha.clone()],
            files,
        };
        branch.set_content(content.clone(), &[a.clone(), b.clone()]);

        let messages = a.message_error_count() + b.message_error_count();
        prop_assert_eq!(branch.content.derive(messages), (branch.state, branch.error_count));
        prop_assert_eq!(branch.state == VerdictState::Pending, content.files.is_none());
    }
}

#[test]
fn terminal_commit_is_not_overwritten() {
    let store = SqliteVerdictStore::in_memory().unwrap();
    let account = store.find_or_create_account("invenio").unwrap();
    let repository = store.find_or_create_repository(account.id, "kwalitee").unwrap();
    let mut verdict = store.find_or_create_commit(repository.id, "abc", "https://c").unwrap();

    verdict.set_files(FileReports::new());
    assert!(store.save_commit(&verdict).unwrap());
    verdict.set_message(findings(vec![1]));

    assert!(!store.save_commit(&verdict).unwrap());
    assert_eq!(store.get_commit(verdict.id).unwrap().unwrap().state, VerdictState::Success);
}

#[test]
fn find_or_create_returns_the_same_row() {
    let store = SqliteVerdictStore::in_memory().unwrap();
    let account = store.find_or_create_account("invenio").unwrap();
    let repository = store.find_or_create_repository(account.id, "kwalitee").unwrap();

    let first = store.find_or_create_commit(repository.id, "abc", "https://c").unwrap();
    let second = store.find_or_create_commit(repository.id, "abc", "https://other").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.url, "https://c");
}
