//! License header validation
//!
//! Reads the leading comment block of a source file and checks that it
//! carries an up-to-date copyright line and the three GPL paragraphs naming
//! the same program.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::models::{Finding, FindingCode};

static PROGRAM_FREE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?P<program>.*?) is free software;").unwrap());
static PROGRAM_DISTRIBUTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?P<program>.*?) is distributed in").unwrap());
static PROGRAM_ALONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"GNU General Public License\s+along\s+with (?P<program>.*?)[;.]").unwrap()
});

/// Comment syntax of the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStyle {
    /// `#` lines (Python, shell) and `{#` (Jinja templates)
    #[default]
    Hash,
    /// `/*` opening and ` *` continuation lines (JavaScript, CSS)
    Block,
}

impl CommentStyle {
    fn is_comment(self, line: &str) -> bool {
        let blank = !line.is_empty() && line.chars().all(|c| c == '\r' || c == '\n');
        blank
            || match self {
                Self::Hash => line.starts_with('#') || line.starts_with("{#"),
                Self::Block => line.starts_with("/*") || line.starts_with(" *"),
            }
    }

    const fn starter(self) -> &'static str {
        match self {
            Self::Hash => "# ",
            Self::Block => " *",
        }
    }
}

/// Options of the license validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseOptions {
    /// Year the copyright must end with
    pub year: i32,
    /// Comment syntax
    pub style: CommentStyle,
    /// Codes dropped from the result
    pub ignore: HashSet<String>,
    /// Copyright holder expected after the year, if any
    pub holder: Option<String>,
}

impl Default for LicenseOptions {
    fn default() -> Self {
        Self {
            year: current_year(),
            style: CommentStyle::Hash,
            ignore: HashSet::new(),
            holder: None,
        }
    }
}

/// The current calendar year
#[must_use]
pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

fn copyright_regex(holder: Option<&str>) -> Regex {
    let tail = holder.map_or_else(
        || r"\b".to_string(),
        |h| format!(r"\s+{}\.?\s*$", regex::escape(h)),
    );
    Regex::new(&format!(
        r"(?m)^Copyright\s+(?:\([Cc]\)|©)\s+(?:\d{{4}},\s+)*(?P<year>\d{{4}}){tail}"
    ))
    .unwrap_or_else(|_| unreachable!("escaped holder always compiles"))
}

/// Leading comment block of a file
struct Header {
    /// Stripped block lines with their 0-based index
    lines: Vec<(usize, String)>,
    /// Concatenated block text
    text: String,
    /// Index of the first line after the block
    end: usize,
    /// The block ran to the end of the file
    reached_eof: bool,
}

/// Decode failure at a 0-based line index
struct Undecodable(usize);

fn read_header(content: &[u8], style: CommentStyle) -> Result<Header, Undecodable> {
    let mut header = Header {
        lines: Vec::new(),
        text: String::new(),
        end: 0,
        reached_eof: true,
    };

    for (index, raw) in content.split_inclusive(|&b| b == b'\n').enumerate() {
        let line = std::str::from_utf8(raw).map_err(|_| Undecodable(index))?;
        if !style.is_comment(line) {
            header.end = index;
            header.reached_eof = false;
            return Ok(header);
        }
        if let Some(rest) = line.strip_prefix(style.starter()) {
            let rest = rest.trim_start();
            header.text.push_str(rest);
            if !rest.ends_with('\n') {
                header.text.push('\n');
            }
            header.lines.push((index, rest.trim().to_string()));
        }
        header.end = index + 1;
    }
    Ok(header)
}

/// Check the license header of in-memory file content
#[must_use]
pub fn check_license_content(content: &[u8], options: &LicenseOptions) -> Vec<Finding> {
    let mut findings = match read_header(content, options.style) {
        Ok(header) => check_header(&header, options),
        Err(Undecodable(index)) => {
            vec![Finding::with_args(index + 1, FindingCode::Undecodable, ["utf-8"])]
        },
    };
    findings.retain(|f| !options.ignore.contains(f.code.as_str()));
    findings.sort();
    findings
}

/// Check the license header of the file at `path`
pub fn check_license(path: &Path, options: &LicenseOptions) -> std::io::Result<Vec<Finding>> {
    let content = fs::read(path)?;
    Ok(check_license_content(&content, options))
}

fn check_header(header: &Header, options: &LicenseOptions) -> Vec<Finding> {
    if header.reached_eof && header.text.trim().is_empty() {
        return Vec::new();
    }

    let copyright = copyright_regex(options.holder.as_deref());
    let Some(caps) = copyright.captures(&header.text) else {
        return vec![Finding::new(header.end + 1, FindingCode::CopyrightMissing)];
    };

    let year: i32 = caps["year"].parse().unwrap_or_default();
    if year != options.year {
        let matched = caps[0].trim();
        let index = header
            .lines
            .iter()
            .find(|(_, text)| text.starts_with(matched))
            .map_or(header.end, |(index, _)| *index);
        return vec![Finding::with_args(
            index + 1,
            FindingCode::YearOutdated,
            [options.year.to_string(), caps["year"].to_string()],
        )];
    }

    let last_line = header.end.max(1);
    let free = PROGRAM_FREE.captures(&header.text);
    let distributed = PROGRAM_DISTRIBUTED.captures(&header.text);
    let along = PROGRAM_ALONG.captures(&header.text);
    match (free, distributed, along) {
        (None, _, _) => vec![Finding::new(last_line, FindingCode::LicenseMissing)],
        (Some(free), Some(distributed), Some(along)) => {
            let name = free["program"].to_uppercase();
            if name == distributed["program"].to_uppercase()
                && name == along["program"].to_uppercase()
            {
                Vec::new()
            } else {
                vec![Finding::new(last_line, FindingCode::NotGplV2)]
            }
        },
        _ => vec![Finding::new(last_line, FindingCode::NotGplV2)],
    }
}
