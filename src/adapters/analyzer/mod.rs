//! External lint tools as [`FileAnalyzer`]s
//!
//! A [`CommandAnalyzer`] runs one program per file and reads findings from
//! its standard output, one per line, in the common
//! `path:line[:column]: CODE message` shape (flake8, pydocstyle with
//! `--format`, eslint `-f unix`, ...).
//!
//! Every run has a wall-clock deadline; a tool still running past it is
//! killed and reported as [`AnalyzerError::Timeout`].

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::LazyLock;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use regex::Regex;

use crate::config::AnalyzerConfig;
use crate::core::models::Finding;
use crate::core::ports::{AnalyzerError, FileAnalyzer};
use crate::core::services::AnalyzerRegistry;

static OUTPUT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^:]+:(?P<line>\d+)(?::\d+)?:\s*(?P<code>[A-Z]+[0-9]+)\s+(?P<text>.*?)\s*$")
        .unwrap()
});

/// Placeholder replaced by the checked file path
const PATH_PLACEHOLDER: &str = "{path}";

/// Interval between two exit checks of a running tool
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs an external program on each file
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    name: String,
    program: String,
    args: Vec<String>,
    extensions: Vec<String>,
    timeout: Duration,
}

/// What a finished tool wrote
struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl CommandAnalyzer {
    /// Analyzer from its configuration entry, `None` when the command is empty
    #[must_use]
    pub fn from_config(config: &AnalyzerConfig, timeout: Duration) -> Option<Self> {
        let (program, args) = config.command.split_first()?;
        Some(Self {
            name: config.name.clone(),
            program: program.clone(),
            args: args.to_vec(),
            extensions: config.extensions.iter().map(|e| e.trim_start_matches('.').to_string()).collect(),
            timeout,
        })
    }

    fn arguments(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        let mut args: Vec<String> =
            self.args.iter().map(|a| a.replace(PATH_PLACEHOLDER, &path)).collect();
        if !self.args.iter().any(|a| a.contains(PATH_PLACEHOLDER)) {
            args.push(path.into_owned());
        }
        args
    }

    /// Run the tool on `path`, killing it once the deadline passes
    fn run(&self, path: &Path) -> Result<Captured, AnalyzerError> {
        let mut child = Command::new(&self.program)
            .args(self.arguments(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AnalyzerError::Spawn {
                name: self.name.clone(),
                source,
            })?;

        // Pipes are drained on their own threads so a chatty tool never
        // blocks on a full buffer while we wait for it
        let stdout = child.stdout.take().map(collect);
        let stderr = child.stderr.take().map(collect);

        let status = self.wait(&mut child)?;
        Ok(Captured {
            status,
            stdout: joined(stdout),
            stderr: joined(stderr),
        })
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, AnalyzerError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if Instant::now() >= deadline => {
                    warn!("{} exceeded {}s, killing it", self.name, self.timeout.as_secs());
                    if let Err(e) = child.kill() {
                        warn!("Could not kill {}: {e}", self.name);
                    }
                    // Reap; the exit status of a killed tool carries nothing
                    let _ = child.wait();
                    return Err(AnalyzerError::Timeout {
                        name: self.name.clone(),
                        seconds: self.timeout.as_secs(),
                    });
                },
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(AnalyzerError::Output {
                        name: self.name.clone(),
                        message: e.to_string(),
                    });
                },
            }
        }
    }
}

fn collect(mut pipe: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buffer) {
            debug!("Analyzer pipe closed early: {e}");
        }
        buffer
    })
}

fn joined(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|handle| handle.join().ok()).unwrap_or_default()
}

/// Parse tool output into findings, ignoring lines of any other shape
#[must_use]
pub fn parse_output(output: &str) -> Vec<Finding> {
    output
        .lines()
        .filter_map(|line| OUTPUT_LINE.captures(line))
        .filter_map(|caps| {
            let line = caps["line"].parse().ok()?;
            Some(Finding::external(line, &caps["code"], &caps["text"]))
        })
        .collect()
}

impl FileAnalyzer for CommandAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies_to(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    fn analyze(&self, path: &Path) -> Result<Vec<Finding>, AnalyzerError> {
        let output = self.run(path)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let findings = parse_output(&stdout);
        debug!("{} reported {} finding(s) on {}", self.name, findings.len(), path.display());

        // Lint tools exit non-zero when they report something
        if findings.is_empty() && !output.status.success() {
            return Err(AnalyzerError::Output {
                name: self.name.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(findings)
    }
}

/// Registry holding one [`CommandAnalyzer`] per usable configuration entry
///
/// Each analyzer run is bounded by `timeout`.
#[must_use]
pub fn build_registry(configs: &[AnalyzerConfig], timeout: Duration) -> AnalyzerRegistry {
    let mut registry = AnalyzerRegistry::new();
    for config in configs {
        match CommandAnalyzer::from_config(config, timeout) {
            Some(analyzer) => registry.register(Box::new(analyzer)),
            None => warn!("Analyzer {} has an empty command, ignored", config.name),
        }
    }
    registry
}
