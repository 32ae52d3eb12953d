//! Coded, line-located diagnostics
//!
//! A [`Finding`] is what every validator produces. Known codes carry a
//! message template; codes coming from external analyzers are opaque and
//! render their single argument verbatim.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Diagnostic code of a finding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FindingCode {
    /// M100: fewer counted signatures than the reviewer quorum
    NeedsMoreReviewers,
    /// M101: no counted signature at all
    SignatureMissing,
    /// M102: trailing line that is neither a bullet nor a known signature
    UnrecognizedSignature,
    /// M110: first line without `component:` prefix
    MissingComponent,
    /// M111: component not in the configured list
    UnrecognizedComponent,
    /// M120: bullet directly after a non-blank line
    MissingBlankBeforeBullet,
    /// M121: bullet continuation not indented by exactly two spaces
    BadIndent,
    /// M122: bullet label not in the configured labels
    UnknownBulletLabel,
    /// M130: bullet found after the signatures started
    BulletAfterSignature,
    /// M190: physical line longer than allowed
    LineTooLong,
    /// M191: line ends with a dot
    TrailingDot,
    /// L100: program name paragraphs are missing
    LicenseMissing,
    /// L101: no copyright line in the header
    CopyrightMissing,
    /// L102: copyright year differs from the expected one
    YearOutdated,
    /// L103: license paragraphs name different programs
    NotGplV2,
    /// L190: file is not valid in its declared encoding
    Undecodable,
    /// Code reported by an external analyzer, kept as-is
    External(String),
}

impl FindingCode {
    /// The short code, e.g. `M100` or `E501`
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NeedsMoreReviewers => "M100",
            Self::SignatureMissing => "M101",
            Self::UnrecognizedSignature => "M102",
            Self::MissingComponent => "M110",
            Self::UnrecognizedComponent => "M111",
            Self::MissingBlankBeforeBullet => "M120",
            Self::BadIndent => "M121",
            Self::UnknownBulletLabel => "M122",
            Self::BulletAfterSignature => "M130",
            Self::LineTooLong => "M190",
            Self::TrailingDot => "M191",
            Self::LicenseMissing => "L100",
            Self::CopyrightMissing => "L101",
            Self::YearOutdated => "L102",
            Self::NotGplV2 => "L103",
            Self::Undecodable => "L190",
            Self::External(code) => code,
        }
    }

    /// Message template; `{0}`, `{1}` are replaced by the finding arguments
    #[must_use]
    pub const fn template(&self) -> &'static str {
        match self {
            Self::NeedsMoreReviewers => "needs more reviewers",
            Self::SignatureMissing => "signature is missing",
            Self::UnrecognizedSignature => "unrecognized bullet/signature",
            Self::MissingComponent => "missing component name",
            Self::UnrecognizedComponent => "unrecognized component name: {0}",
            Self::MissingBlankBeforeBullet => "missing empty line before bullet",
            Self::BadIndent => "indentation of two spaces expected",
            Self::UnknownBulletLabel => "unrecognized bullet label: {0}",
            Self::BulletAfterSignature => "no bullets are allowed after signatures",
            Self::LineTooLong => "line is too long ({1} > {0})",
            Self::TrailingDot => "must not end with a dot '.'",
            Self::LicenseMissing => "license is missing",
            Self::CopyrightMissing => "copyright is missing",
            Self::YearOutdated => "copyright year is outdated, expected {0} but got {1}",
            Self::NotGplV2 => "license is not GNU GPLv2",
            Self::Undecodable => "file cannot be decoded as {0}",
            Self::External(_) => "{0}",
        }
    }
}

impl From<String> for FindingCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "M100" => Self::NeedsMoreReviewers,
            "M101" => Self::SignatureMissing,
            "M102" => Self::UnrecognizedSignature,
            "M110" => Self::MissingComponent,
            "M111" => Self::UnrecognizedComponent,
            "M120" => Self::MissingBlankBeforeBullet,
            "M121" => Self::BadIndent,
            "M122" => Self::UnknownBulletLabel,
            "M130" => Self::BulletAfterSignature,
            "M190" => Self::LineTooLong,
            "M191" => Self::TrailingDot,
            "L100" => Self::LicenseMissing,
            "L101" => Self::CopyrightMissing,
            "L102" => Self::YearOutdated,
            "L103" => Self::NotGplV2,
            "L190" => Self::Undecodable,
            _ => Self::External(code),
        }
    }
}

impl From<FindingCode> for String {
    fn from(code: FindingCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic: `(line, code, args)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    /// 1-based line number the finding refers to
    pub line: usize,
    /// Diagnostic code
    pub code: FindingCode,
    /// Values interpolated into the message template
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Finding {
    /// Finding without arguments
    #[must_use]
    pub const fn new(line: usize, code: FindingCode) -> Self {
        Self {
            line,
            code,
            args: Vec::new(),
        }
    }

    /// Finding with template arguments
    #[must_use]
    pub fn with_args<I, S>(line: usize, code: FindingCode, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            line,
            code,
            args: args.into_iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Finding coming from an external tool; `text` is rendered verbatim
    #[must_use]
    pub fn external(line: usize, code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            line,
            code: FindingCode::External(code.into()),
            args: vec![text.into()],
        }
    }

    /// Human message with arguments interpolated
    #[must_use]
    pub fn message(&self) -> String {
        let mut message = self.code.template().to_string();
        for (i, arg) in self.args.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), arg);
        }
        message
    }

    /// Whether this finding only asks for more reviewers
    #[must_use]
    pub fn is_reviewer_quorum(&self) -> bool {
        self.code == FindingCode::NeedsMoreReviewers
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.line, self.code, self.message())
    }
}

impl PartialOrd for Finding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Finding {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.code.as_str().cmp(other.code.as_str()))
            .then_with(|| self.args.cmp(&other.args))
    }
}

/// Render findings one per line
#[must_use]
pub fn render_all(findings: &[Finding]) -> Vec<String> {
    findings.iter().map(ToString::to_string).collect()
}
