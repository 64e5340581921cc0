use clap::Parser;
use std::path::PathBuf;
use crate::{ChangeTrackError, Result};

pub const DEFAULT_STATE_FILE_NAME: &str = "changetrack-state.json";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directories to scan
    #[arg(value_name = "PATH", required_unless_present_any = ["list", "forget"])]
    pub paths: Vec<String>,

    /// Location of the JSON state file (overrides --use-temp-path and --state-file-name)
    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Keep the state file in the system temp directory instead of next to the executable
    #[arg(long, default_value_t = false)]
    pub use_temp_path: bool,

    /// File name of the state file
    #[arg(long, default_value = DEFAULT_STATE_FILE_NAME)]
    pub state_file_name: String,

    /// Exclude entries whose name matches this glob
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Number of files fingerprinted in parallel
    #[arg(short = 'j', long, default_value_t = crate::scanner::local::DEFAULT_PARALLEL)]
    pub parallel: usize,

    /// Compare against the stored state without saving the new one
    #[arg(short = 'n', long, default_value_t = false)]
    pub dry_run: bool,

    /// Print the change set as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Show progress while fingerprinting
    #[arg(short = 'P', long, default_value_t = false)]
    pub progress: bool,

    /// List tracked directories
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Stop tracking a directory
    #[arg(long, value_name = "PATH")]
    pub forget: Option<String>,

    /// Suppress non-error messages
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Where the state file lives: an explicit `--state-file`, else the temp
    /// directory or the executable's directory joined with the file name.
    pub fn resolved_state_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.state_file {
            return Ok(path.clone());
        }
        if self.state_file_name.trim().is_empty() {
            return Err(ChangeTrackError::Config("state file name is empty".into()));
        }

        let base = if self.use_temp_path {
            std::env::temp_dir()
        } else {
            let exe = std::env::current_exe()?;
            exe.parent()
                .map(|p| p.to_path_buf())
                .ok_or_else(|| ChangeTrackError::Config(format!("executable {:?} has no parent directory", exe)))?
        };

        Ok(base.join(&self.state_file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["changetrack", "/data"]);
        assert_eq!(args.paths, vec!["/data".to_string()]);
        assert_eq!(args.parallel, 4);
        assert_eq!(args.state_file_name, DEFAULT_STATE_FILE_NAME);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_paths_required_unless_listing() {
        assert!(Args::try_parse_from(["changetrack"]).is_err());
        assert!(Args::try_parse_from(["changetrack", "--list"]).is_ok());
        assert!(Args::try_parse_from(["changetrack", "--forget", "/data"]).is_ok());
    }

    #[test]
    fn test_state_path_resolution() {
        let args = Args::parse_from(["changetrack", "--state-file", "/tmp/x.json", "/data"]);
        assert_eq!(args.resolved_state_path().unwrap(), PathBuf::from("/tmp/x.json"));

        let args = Args::parse_from(["changetrack", "--use-temp-path", "--state-file-name", "s.json", "/data"]);
        assert_eq!(args.resolved_state_path().unwrap(), std::env::temp_dir().join("s.json"));

        let args = Args::parse_from(["changetrack", "--state-file-name", " ", "/data"]);
        assert!(matches!(args.resolved_state_path(), Err(ChangeTrackError::Config(_))));
    }
}
