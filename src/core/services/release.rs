//! Release notes from commit messages
//!
//! Labelled bullets (`* NEW ...`, `* FIX ...`) are collected per release
//! section, in the order the sections are configured. Commits named by a
//! later `AMENDS <sha>` bullet are left out, and ticket directives such as
//! `closes #12` are shortened to the bare reference.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::message::BulletLabel;

static AMENDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bAMENDS\s+([0-9a-f]{7,40})\b").unwrap());
static TICKET_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:closes|addresses|references) #").unwrap());

/// Width of a wrapped bullet, indentation included
const WRAP_WIDTH: usize = 70;

/// One bullet of the notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseNote {
    /// Component of the commit the bullet comes from
    pub component: Option<String>,
    /// Bullet text on a single line
    pub text: String,
}

/// Bullets of one label under its section title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSection {
    /// Bullet label feeding the section
    pub label: String,
    /// Section title
    pub title: String,
    /// Bullets in commit order
    pub notes: Vec<ReleaseNote>,
}

/// Shas referenced by `AMENDS` bullets, possibly abbreviated
fn amended(messages: &[(&str, &str)]) -> Vec<String> {
    messages
        .iter()
        .flat_map(|(_, message)| AMENDS.captures_iter(message).map(|caps| caps[1].to_string()))
        .collect()
}

fn component(message: &str) -> Option<String> {
    let title = message.lines().next()?;
    title.split_once(':').map(|(component, _)| component.trim().to_string())
}

/// Text of a `* LABEL text` paragraph, continuation lines joined
fn labelled(paragraph: &str, label: &str) -> Option<String> {
    let text = paragraph.strip_prefix("* ")?.strip_prefix(label)?.strip_prefix(' ')?;
    Some(text.replace("\n  ", " ").trim_end().to_string())
}

fn strip_ticket_directives(text: &str) -> String {
    TICKET_DIRECTIVE.replace_all(text, "#").into_owned()
}

/// Sections of the notes for `commits`, given as `(sha, message)` pairs
///
/// Labels without a section never appear; sections without bullets are
/// left out.
#[must_use]
pub fn release_notes(commits: &[(&str, &str)], labels: &[BulletLabel]) -> Vec<ReleaseSection> {
    let amended = amended(commits);
    let kept: Vec<(Option<String>, String)> = commits
        .iter()
        .filter(|(sha, _)| !amended.iter().any(|prefix| sha.starts_with(prefix.as_str())))
        .map(|(_, message)| (component(message), message.replace("\r\n", "\n")))
        .collect();

    labels
        .iter()
        .filter_map(|label| {
            let title = label.section.clone()?;
            let notes: Vec<ReleaseNote> = kept
                .iter()
                .flat_map(|(component, message)| {
                    message.split("\n\n").filter_map(|paragraph| {
                        labelled(paragraph, &label.label).map(|text| ReleaseNote {
                            component: component.clone(),
                            text: strip_ticket_directives(&text),
                        })
                    })
                })
                .collect();
            (!notes.is_empty()).then(|| ReleaseSection {
                label: label.label.clone(),
                title,
                notes,
            })
        })
        .collect()
}

/// Greedy word wrap of `text`
fn wrap(text: &str, first: &str, rest: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = first.to_string();
    let mut empty = true;
    for word in text.split_whitespace() {
        if !empty && line.chars().count() + 1 + word.chars().count() > WRAP_WIDTH {
            lines.push(std::mem::replace(&mut line, rest.to_string()));
            empty = true;
        }
        if !empty {
            line.push(' ');
        }
        line.push_str(word);
        empty = false;
    }
    lines.push(line);
    lines
}

/// Plain-text rendering, optionally grouped by component
#[must_use]
pub fn render_release_notes(sections: &[ReleaseSection], by_component: bool) -> String {
    let indent = if by_component { "  " } else { "" };
    let first = format!("{indent}- ");
    let rest = format!("{indent}  ");
    let mut out = Vec::new();

    for section in sections {
        out.push(section.title.clone());
        out.push("~".repeat(section.title.chars().count()));
        out.push(String::new());
        if by_component {
            let mut groups: BTreeMap<Option<&str>, Vec<&ReleaseNote>> = BTreeMap::new();
            for note in &section.notes {
                groups.entry(note.component.as_deref()).or_default().push(note);
            }
            for (component, notes) in groups {
                out.push(format!("+ {}", component.unwrap_or("other")));
                out.push(String::new());
                for note in notes {
                    out.extend(wrap(&note.text, &first, &rest));
                }
                out.push(String::new());
            }
        } else {
            for note in &section.notes {
                out.extend(wrap(&note.text, &first, &rest));
            }
            out.push(String::new());
        }
    }
    out.join("\n")
}
