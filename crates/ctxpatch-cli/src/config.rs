use anyhow::{Context, Result};
use clap::Parser;
use ctxpatch_core::PatchOptions;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub options: PatchOptions,
}

impl Config {
    /// Command-line flags win over values read from the file.
    pub fn patch_options(&self, args: &Args) -> PatchOptions {
        let mut options = self.options.clone();
        if args.no_backup {
            options.create_backups = false;
        }
        options
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Apply a patch relative to the current directory
    ctxpatch fix.diff

    # Check whether a patch still applies without touching anything
    ctxpatch --dry-run -d ~/src/project fix.diff

    # Pipe a patch in
    git diff | ctxpatch -d ../other-checkout

FORMATS:
    Unified, context and normal diffs, git rename/copy headers and
    base64 binary sections (MIME: ...; encoding: base64; length: N).
    The root directory is adjusted upwards when the patch paths fit better there.

CONFIG:
    Default config location: ~/.config/ctxpatch/config.toml
    Use --ignore-config to use built-in defaults instead."#)]
pub struct Args {
    #[arg(help = "Patch file to apply [default: read from stdin]")]
    pub patch_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = ".",
        help = "Directory the patch paths are relative to"
    )]
    pub dir: PathBuf,

    #[arg(long, help = "Check that every hunk applies without writing anything")]
    pub dry_run: bool,

    #[arg(
        short,
        long,
        help = "Path to config file [default: ~/.config/ctxpatch/config.toml]"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Use built-in defaults, ignore config file")]
    pub ignore_config: bool,

    #[arg(long, help = "Do not write backup copies of modified files")]
    pub no_backup: bool,

    #[arg(short, long, help = "Log where each hunk was found")]
    pub verbose: bool,
}

/// Where the settings in use came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    BuiltIn,
    File(PathBuf),
    Created(PathBuf),
}

/// Loads the config named on the command line or the per-user default. A missing
/// file is written out with the defaults so it can be edited later.
pub fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    if args.ignore_config {
        return Ok((Config::default(), ConfigOrigin::BuiltIn));
    }

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    if config_path.exists() {
        let config = read_config(&config_path)?;
        return Ok((config, ConfigOrigin::File(config_path)));
    }

    let config = Config::default();
    write_config(&config_path, &config)?;
    Ok((config, ConfigOrigin::Created(config_path)))
}

fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config file at {:?}", path))
}

fn write_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory at {:?}", parent))?;
    }
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, toml_string)
        .with_context(|| format!("Failed to write default config to {:?}", path))
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "ctxpatch")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["ctxpatch"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_args_defaults() {
        let args = args(&[]);
        assert_eq!(args.patch_file, None);
        assert_eq!(args.dir, PathBuf::from("."));
        assert!(!args.dry_run);
        assert!(!args.no_backup);
    }

    #[test]
    fn test_args_full() {
        let args = args(&["-d", "/tmp/work", "--dry-run", "-v", "--no-backup", "fix.diff"]);
        assert_eq!(args.patch_file, Some(PathBuf::from("fix.diff")));
        assert_eq!(args.dir, PathBuf::from("/tmp/work"));
        assert!(args.dry_run);
        assert!(args.verbose);
        assert!(args.no_backup);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = "backup_suffix = \".bak\"\nmax_ancestors = 3";
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.options.backup_suffix, ".bak");
        assert_eq!(config.options.max_ancestors, 3);
        assert!(config.options.create_backups);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_no_backup_flag_overrides_file() {
        let config: Config = toml::from_str("create_backups = true").unwrap();
        let options = config.patch_options(&args(&["--no-backup"]));
        assert!(!options.create_backups);
    }

    #[test]
    fn test_load_config_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let path_arg = path.to_string_lossy().to_string();

        let (config, origin) = load_config(&args(&["-c", &path_arg])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(origin, ConfigOrigin::Created(path.clone()));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("backup_suffix = \".original~\""));
        assert!(written.contains("max_ancestors = 64"));
    }

    #[test]
    fn test_load_config_reads_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "create_backups = false\n").unwrap();
        let path_arg = path.to_string_lossy().to_string();

        let (config, origin) = load_config(&args(&["--config", &path_arg])).unwrap();
        assert!(!config.options.create_backups);
        assert_eq!(origin, ConfigOrigin::File(path));
    }

    #[test]
    fn test_ignore_config_skips_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not toml").unwrap();
        let path_arg = path.to_string_lossy().to_string();

        let (config, origin) = load_config(&args(&["-c", &path_arg, "--ignore-config"])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(origin, ConfigOrigin::BuiltIn);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_ancestors = \"many\"").unwrap();
        let path_arg = path.to_string_lossy().to_string();

        assert!(load_config(&args(&["-c", &path_arg])).is_err());
    }
}
