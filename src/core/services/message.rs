//! Commit message validation
//!
//! Expected layout of a commit message:
//!
//! ```text
//! component: short description
//!
//! * LABEL bullet describing the change, continued on
//!   lines indented by two spaces.
//!
//! Signed-off-by: Jane Doe <jane@example.org>
//! ```
//!
//! The validator is pure: it never touches the network or the filesystem and
//! returns the same, identically ordered findings for the same input.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::models::{Finding, FindingCode};

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\r|\n").unwrap());
static BULLET_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\* (?P<label>[A-Z]{1,70}) ").unwrap());
static CONTINUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {2}\S").unwrap());
static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^<>]+)>").unwrap());
static WIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\W*wip\b").unwrap());

/// A recognised bullet label and the release-notes section it feeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletLabel {
    /// Upper-case label, e.g. `NEW`
    pub label: String,
    /// Section title, `None` for labels that do not appear in notes
    #[serde(default)]
    pub section: Option<String>,
}

impl BulletLabel {
    /// Label with an optional section
    #[must_use]
    pub fn new(label: &str, section: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            section: section.map(String::from),
        }
    }
}

/// Options of the commit message validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageOptions {
    /// Accepted component names (text before `:` on the first line)
    pub components: Vec<String>,
    /// Signatures counted toward the reviewer quorum, matched as literal
    /// line prefixes (no pattern syntax)
    pub signatures: Vec<String>,
    /// Signatures accepted but not counted, literal like `signatures`
    pub alt_signatures: Vec<String>,
    /// E-mail fragments of reviewers whose sign-off alone is enough
    pub trusted: Vec<String>,
    /// Maximum length of the first line
    pub max_first_line: usize,
    /// Maximum length of every other line
    pub max_line: usize,
    /// Reviewer quorum
    pub min_reviewers: usize,
    /// Recognised bullet labels
    pub bullet_labels: Vec<BulletLabel>,
    /// Accept an empty message without findings
    pub allow_empty: bool,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            signatures: [
                "Signed-off-by",
                "Co-authored-by",
                "Tested-by",
                "Reviewed-by",
                "Acked-by",
            ]
            .map(String::from)
            .to_vec(),
            alt_signatures: vec!["Reported-by".to_string()],
            trusted: Vec::new(),
            max_first_line: 50,
            max_line: 72,
            min_reviewers: 3,
            bullet_labels: vec![
                BulletLabel::new("SECURITY", Some("Security fixes")),
                BulletLabel::new("INCOMPATIBLE", Some("Incompatible changes")),
                BulletLabel::new("NEW", Some("New features")),
                BulletLabel::new("BETTER", Some("Improved features")),
                BulletLabel::new("FIX", Some("Bug fixes")),
                BulletLabel::new("NOTE", Some("Notes")),
                BulletLabel::new("AMENDS", None),
            ],
            allow_empty: false,
        }
    }
}

/// Compiled commit message validator
#[derive(Debug, Clone)]
pub struct MessageValidator {
    options: MessageOptions,
    labels: HashSet<String>,
    any_signature: Option<Regex>,
    alt_signature: Option<Regex>,
}

/// Regex matching any of `prefixes` at the start of a line
///
/// Prefixes are literal text: `Signed-off-by` matches itself only, and a
/// `.` or `*` in a configured signature carries no special meaning.
fn prefix_regex(prefixes: &[String]) -> Option<Regex> {
    if prefixes.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = prefixes.iter().map(|s| regex::escape(s)).collect();
    Regex::new(&format!("^({})", alternatives.join("|"))).ok()
}

impl MessageValidator {
    /// Compile the validator for a set of options
    #[must_use]
    pub fn new(options: MessageOptions) -> Self {
        let labels = options.bullet_labels.iter().map(|b| b.label.clone()).collect();
        let all: Vec<String> =
            options.signatures.iter().chain(&options.alt_signatures).cloned().collect();
        let any_signature = prefix_regex(&all);
        let alt_signature = prefix_regex(&options.alt_signatures);
        Self {
            options,
            labels,
            any_signature,
            alt_signature,
        }
    }

    /// Options the validator was built with
    #[must_use]
    pub const fn options(&self) -> &MessageOptions {
        &self.options
    }

    /// Validate a commit message, findings sorted by `(line, code)`
    #[must_use]
    pub fn check(&self, message: &str) -> Vec<Finding> {
        if self.options.allow_empty && message.trim().is_empty() {
            return Vec::new();
        }

        let lines: Vec<&str> = LINE_BREAK.split(message).collect();
        let first = lines.first().copied().unwrap_or_default();

        let mut findings = self.check_first_line(first);
        let (bullet_findings, candidates) = self.check_body(&lines);
        findings.extend(bullet_findings);
        findings.extend(self.check_signatures(&candidates));
        findings.sort();
        findings
    }

    fn check_first_line(&self, line: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        let length = line.chars().count();

        if length > self.options.max_first_line {
            findings.push(Finding::with_args(
                1,
                FindingCode::LineTooLong,
                [self.options.max_first_line, length],
            ));
        }
        if line.ends_with('.') {
            findings.push(Finding::new(1, FindingCode::TrailingDot));
        }
        match line.split_once(':') {
            None => findings.push(Finding::new(1, FindingCode::MissingComponent)),
            Some((component, _)) if !self.options.components.iter().any(|c| c == component) => {
                findings.push(Finding::with_args(1, FindingCode::UnrecognizedComponent, [component]));
            },
            Some(_) => {},
        }
        findings
    }

    /// Scan the lines after the first one.
    ///
    /// Returns the findings and the `(line number, text)` pairs that are
    /// neither bullets nor bullet continuations.
    fn check_body<'a>(&self, lines: &[&'a str]) -> (Vec<Finding>, Vec<(usize, &'a str)>) {
        let mut findings = Vec::new();
        let mut candidates: Vec<(usize, &'a str)> = Vec::new();
        let mut consumed: HashSet<usize> = HashSet::new();

        // `index` is the position in `lines`, line numbers are 1-based
        for (index, line) in lines.iter().enumerate().skip(1) {
            let lineno = index + 1;

            if line.starts_with('*') {
                if !candidates.is_empty() {
                    findings.push(Finding::new(lineno, FindingCode::BulletAfterSignature));
                }
                if !lines[index - 1].trim().is_empty() {
                    findings.push(Finding::new(lineno, FindingCode::MissingBlankBeforeBullet));
                }
                if let Some(caps) = BULLET_LABEL.captures(line) {
                    let label = &caps["label"];
                    if !self.labels.contains(label) {
                        findings.push(Finding::with_args(
                            lineno,
                            FindingCode::UnknownBulletLabel,
                            [label],
                        ));
                    }
                }
                for (offset, continued) in lines.iter().enumerate().skip(index + 1) {
                    if continued.trim().is_empty() {
                        break;
                    }
                    if CONTINUATION.is_match(continued) {
                        consumed.insert(offset);
                    } else {
                        findings.push(Finding::new(offset + 1, FindingCode::BadIndent));
                    }
                }
            } else if !consumed.contains(&index) && !line.trim().is_empty() {
                candidates.push((lineno, *line));
            }

            let length = line.chars().count();
            if length > self.options.max_line {
                findings.push(Finding::with_args(
                    lineno,
                    FindingCode::LineTooLong,
                    [self.options.max_line, length],
                ));
            }
        }

        (findings, candidates)
    }

    fn check_signatures(&self, candidates: &[(usize, &str)]) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut counted: Vec<&str> = Vec::new();

        for &(lineno, line) in candidates {
            let is_signature = self.any_signature.as_ref().is_some_and(|re| re.is_match(line));
            if !is_signature {
                findings.push(Finding::new(lineno, FindingCode::UnrecognizedSignature));
                continue;
            }
            if line.ends_with('.') {
                findings.push(Finding::new(lineno, FindingCode::TrailingDot));
            }
            let is_alt = self.alt_signature.as_ref().is_some_and(|re| re.is_match(line));
            if !is_alt {
                counted.push(line);
            }
        }

        if counted.is_empty() {
            findings.push(Finding::new(1, FindingCode::SignatureMissing));
            findings.push(Finding::new(1, FindingCode::NeedsMoreReviewers));
        } else if counted.len() < self.options.min_reviewers
            && !counted.iter().any(|line| self.is_trusted(line))
        {
            findings.push(Finding::new(1, FindingCode::NeedsMoreReviewers));
        }
        findings
    }

    fn is_trusted(&self, line: &str) -> bool {
        EMAIL.captures_iter(line).any(|caps| {
            let address = &caps[1];
            self.options
                .trusted
                .iter()
                .any(|fragment| !fragment.is_empty() && address.contains(fragment.as_str()))
        })
    }
}

/// Whether a component or title flags the work as in progress
///
/// Matches `wip` as the first word, case-insensitively, so `WIP: foo` and
/// `[wip] foo` qualify while `wipe: foo` does not.
#[must_use]
pub fn is_wip(text: &str) -> bool {
    WIP.is_match(text)
}

/// Validate `message` with `options`
#[must_use]
pub fn check_message(message: &str, options: &MessageOptions) -> Vec<Finding> {
    MessageValidator::new(options.clone()).check(message)
}
