//! CLI definition and parsing.
//! Defines Args and the mapping from flags to a run Config.
//!
//! Notes:
//! - `--help` is a usage query: the binary prints usage and exits 1.
//! - Log level precedence: --debug > --log-level > --verbose > normal.

use clap::{CommandFactory, Parser, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::types::{Config, LogLevel};

/// Flatten `*Collection` directories: promote each collection's child
/// directories one level up into the target directory.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "reorganize",
    author,
    version,
    about = "Flatten directories ending in 'Collection' into their parent (or a target directory)",
    disable_help_flag = true
)]
pub struct Args {
    /// Directory containing the *Collection directories.
    #[arg(value_name = "SOURCE", value_hint = ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Directory that receives the promoted children (defaults to SOURCE).
    #[arg(value_name = "TARGET", value_hint = ValueHint::DirPath)]
    pub target: Option<PathBuf>,

    /// Dry-run: report what would move, touch nothing.
    #[arg(long, help = "Show what would be moved without changing anything")]
    pub dry_run: bool,

    /// Skip the free-space confirmation prompt (no effect with --dry-run).
    #[arg(short = 'f', long, help = "Proceed without asking when free space looks insufficient")]
    pub force: bool,

    #[arg(short = 'v', long, help = "Print progress lines (same as --log-level info)")]
    pub verbose: bool,

    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// One of: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL", help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<LogLevel>,

    /// Emit JSON log lines and a JSON summary.
    #[arg(long, help = "Emit logs and the final summary as JSON")]
    pub json: bool,

    #[arg(
        long,
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        help = "Also append logs to this file"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(short = 'h', long, help = "Print help (exits with status 1)")]
    pub help: bool,
}

impl Args {
    /// Strip shell-quoting leftovers: surrounding quotes and one trailing separator.
    /// Paths that are not valid UTF-8 are returned untouched.
    pub fn sanitize_path(p: &Path) -> PathBuf {
        let Some(raw) = p.to_str() else {
            return p.to_path_buf();
        };
        let trimmed = raw.trim();
        let unquoted = match trimmed.as_bytes() {
            [b'"', .., b'"'] | [b'\'', .., b'\''] => &trimmed[1..trimmed.len() - 1],
            _ => trimmed.trim_matches(|c| c == '"' || c == '\''),
        };

        let mut cleaned = unquoted.to_string();
        if cleaned.len() > 1 && (cleaned.ends_with('/') || cleaned.ends_with('\\')) {
            cleaned.pop();
        }
        PathBuf::from(cleaned)
    }

    /// Effective log level derived from the verbosity flags.
    pub fn effective_log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else if let Some(level) = self.log_level {
            level
        } else if self.verbose {
            LogLevel::Info
        } else {
            LogLevel::Normal
        }
    }

    /// Build the run Config; `None` when SOURCE was not given.
    pub fn to_config(&self) -> Option<Config> {
        let source = Self::sanitize_path(self.source.as_deref()?);
        let mut cfg = Config::new(source);
        if let Some(t) = self.target.as_deref() {
            cfg.target = Some(Self::sanitize_path(t));
        }
        self.apply_overrides(&mut cfg);
        Some(cfg)
    }

    /// Apply flag values to an existing Config (in-place).
    pub fn apply_overrides(&self, cfg: &mut Config) {
        cfg.log_level = self.effective_log_level();
        cfg.dry_run |= self.dry_run;
        cfg.force |= self.force;
        cfg.json |= self.json;
        if let Some(lf) = &self.log_file {
            cfg.log_file = Some(Self::sanitize_path(lf));
        }
    }
}

/// Rendered usage text.
pub fn usage() -> String {
    Args::command().render_help().to_string()
}

/// Parse process arguments without exiting; the caller decides exit codes.
pub fn try_parse() -> Result<Args, clap::Error> {
    Args::try_parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("reorganize").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn positional_source_and_target() {
        let a = parse(&["/media", "/flat"]);
        let cfg = a.to_config().unwrap();
        assert_eq!(cfg.source, PathBuf::from("/media"));
        assert_eq!(cfg.target, Some(PathBuf::from("/flat")));
        assert!(!cfg.dry_run);
    }

    #[test]
    fn missing_source_yields_no_config() {
        let a = parse(&["--dry-run"]);
        assert!(a.to_config().is_none());
    }

    #[test]
    fn flags_map_onto_config() {
        let cfg = parse(&["--dry-run", "-f", "--json", "--log-file", "/tmp/r.log", "/m"])
            .to_config()
            .unwrap();
        assert!(cfg.dry_run);
        assert!(cfg.force);
        assert!(cfg.json);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/r.log")));
        assert!(cfg.target.is_none());
    }

    #[test]
    fn log_level_precedence() {
        assert_eq!(parse(&["/m"]).effective_log_level(), LogLevel::Normal);
        assert_eq!(parse(&["-v", "/m"]).effective_log_level(), LogLevel::Info);
        assert_eq!(parse(&["-v", "--log-level", "quiet", "/m"]).effective_log_level(), LogLevel::Quiet);
        assert_eq!(parse(&["-d", "--log-level", "quiet", "/m"]).effective_log_level(), LogLevel::Debug);
    }

    #[test]
    fn invalid_log_level_is_a_parse_error() {
        assert!(Args::try_parse_from(["reorganize", "--log-level", "loud", "/m"]).is_err());
    }

    #[test]
    fn help_flag_is_captured_not_handled_by_clap() {
        let a = parse(&["--help"]);
        assert!(a.help);
        assert!(usage().contains("SOURCE"));
    }

    #[test]
    fn version_is_reported_by_clap() {
        let err = Args::try_parse_from(["reorganize", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn sanitize_strips_quotes_and_one_trailing_separator() {
        assert_eq!(Args::sanitize_path(Path::new("'/media/x/'")), PathBuf::from("/media/x"));
        assert_eq!(Args::sanitize_path(Path::new("\"/media/x\"")), PathBuf::from("/media/x"));
        assert_eq!(Args::sanitize_path(Path::new("/media//")), PathBuf::from("/media/"));
        assert_eq!(Args::sanitize_path(Path::new("/")), PathBuf::from("/"));
    }

    // macOS filesystems reject names that are not valid UTF-8.
    #[cfg(target_os = "linux")]
    #[test]
    fn latin1_directory_name_survives_sanitize() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let td = tempfile::tempdir().unwrap();
        let dir = td.path().join(OsStr::from_bytes(b"caf\xe9"));
        std::fs::create_dir(&dir).unwrap();

        let cleaned = Args::sanitize_path(&dir);
        assert_eq!(cleaned, dir);
        assert!(cleaned.is_dir());

        let args = Args { source: Some(dir.clone()), ..Args::default() };
        assert_eq!(args.to_config().unwrap().source, dir);
    }
}
