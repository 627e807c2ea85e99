//! Core configuration types.
//! - Config holds the run settings built from CLI flags.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::MARKER_SUFFIX_DEFAULT;

/// Program-defined verbosity levels exposed to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Warnings and errors (default)
    #[default]
    Normal,
    /// Progress lines (`--verbose`)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" | "warn" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one reorganize run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for collection directories
    pub source: PathBuf,
    /// Where children are promoted to; the resolved source when unset
    pub target: Option<PathBuf>,
    /// Case-sensitive name suffix that marks a collection directory
    pub marker_suffix: String,
    /// Report what would happen without touching the filesystem
    pub dry_run: bool,
    /// Skip the interactive free-space confirmation
    pub force: bool,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to an additional log file
    pub log_file: Option<PathBuf>,
    /// JSON log lines and JSON summary
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            target: None,
            marker_suffix: MARKER_SUFFIX_DEFAULT.to_string(),
            dry_run: false,
            force: false,
            log_level: LogLevel::Normal,
            log_file: None,
            json: false,
        }
    }
}

impl Config {
    /// Construct a Config for `source` (flatten in place); other fields use defaults.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Builder-style: promote children into `target` instead of the source.
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Builder-style: toggle dry-run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder-style: toggle force.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases_case_insensitively() {
        assert_eq!(LogLevel::parse("QUIET"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::parse("warn"), Some(LogLevel::Normal));
        assert_eq!(LogLevel::parse(" Verbose "), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn from_str_round_trips_display() {
        for lvl in [LogLevel::Quiet, LogLevel::Normal, LogLevel::Info, LogLevel::Debug] {
            assert_eq!(lvl.to_string().parse::<LogLevel>().unwrap(), lvl);
        }
        assert!("bogus".parse::<LogLevel>().is_err());
    }

    #[test]
    fn new_defaults_to_in_place_real_run() {
        let cfg = Config::new("/data");
        assert_eq!(cfg.source, PathBuf::from("/data"));
        assert!(cfg.target.is_none());
        assert_eq!(cfg.marker_suffix, "Collection");
        assert!(!cfg.dry_run);
        assert!(!cfg.force);
    }
}
