//! Commit message validation through the public API

use kwalitee::core::models::FindingCode;
use kwalitee::core::services::{MessageOptions, MessageValidator, check_message, is_wip};
use proptest::prelude::*;

fn options(components: &[&str]) -> MessageOptions {
    MessageOptions {
        components: components.iter().map(|c| (*c).to_string()).collect(),
        ..MessageOptions::default()
    }
}

fn rendered(message: &str, options: &MessageOptions) -> Vec<String> {
    check_message(message, options).iter().map(ToString::to_string).collect()
}

#[test]
fn unsigned_message_misses_signature_and_reviewers() {
    assert_eq!(
        rendered("utils: foo bar", &options(&["utils"])),
        ["1: M100 needs more reviewers", "1: M101 signature is missing"]
    );
}

#[test]
fn trusted_reviewer_satisfies_quorum() {
    let options = MessageOptions {
        trusted: vec!["john.doe@example.org".to_string()],
        ..options(&["search"])
    };
    let message = "search: hello\n\nSigned-off-by: a <john.doe@example.org>";
    assert!(rendered(message, &options).is_empty());
}

#[test]
fn alternative_signature_does_not_count_toward_quorum() {
    let message = "search: hello\n\n\
        Reported-by: Bob <bob@example.org>\n\
        Signed-off-by: Alice <alice@example.org>";
    let codes: Vec<FindingCode> =
        check_message(message, &options(&["search"])).into_iter().map(|f| f.code).collect();

    assert_eq!(codes, [FindingCode::NeedsMoreReviewers]);
}

#[test]
fn continuation_lines_need_two_spaces() {
    let message = "search: hello\n\n\
        * NEW adds facets\n  \
        continued with two spaces\n   \
        continued with three\n \
        continued with one\n\n\
        Signed-off-by: a <john.doe@example.org>";
    let options = MessageOptions {
        trusted: vec!["example.org".to_string()],
        ..options(&["search"])
    };

    let indents: Vec<usize> = check_message(message, &options)
        .into_iter()
        .filter(|f| f.code == FindingCode::BadIndent)
        .map(|f| f.line)
        .collect();

    assert_eq!(indents, [5, 6]);
}

#[test]
fn empty_message_is_a_single_empty_line() {
    let codes: Vec<FindingCode> =
        check_message("", &options(&[])).into_iter().map(|f| f.code).collect();

    assert_eq!(
        codes,
        [
            FindingCode::NeedsMoreReviewers,
            FindingCode::SignatureMissing,
            FindingCode::MissingComponent
        ]
    );
}

#[test]
fn empty_message_may_be_allowed() {
    let options = MessageOptions {
        allow_empty: true,
        ..options(&[])
    };
    assert!(check_message("  \n", &options).is_empty());
}

#[test]
fn wip_marker_is_a_leading_word() {
    assert!(is_wip("WIP"));
    assert!(is_wip("[wip] search facets"));
    assert!(!is_wip("wipe: caches"));
    assert!(!is_wip("search: wip"));
}

proptest! {
    #[test]
    fn validation_is_deterministic(message in "[ -~\n]{0,200}") {
        let validator = MessageValidator::new(options(&["search", "global"]));
        let first = validator.check(&message);
        prop_assert_eq!(&first, &validator.check(&message));

        let mut sorted = first.clone();
        sorted.sort();
        prop_assert_eq!(first, sorted);
    }

    #[test]
    fn findings_point_at_existing_lines(message in "[ -~\n]{0,200}") {
        let lines = message.split('\n').count();
        for finding in check_message(&message, &options(&["search"])) {
            prop_assert!(finding.line >= 1 && finding.line <= lines);
        }
    }
}
