//! Configuration management for labserve.
//!
//! Settings come from command-line arguments via clap, with `LABSERVE_`
//! environment variables as a fallback and defaults for everything:
//!
//! - `LABSERVE_HOST` - Server bind address (default: 127.0.0.1)
//! - `LABSERVE_PORT` - Server port (default: 8000)
//! - `LABSERVE_ROOT` - Directory to serve (default: current directory)
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use labserve::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Serving {} on {}", config.root.display(), config.bind_address());
//! ```

use std::path::PathBuf;

use clap::Parser;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host (loopback only).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default directory to serve.
pub const DEFAULT_ROOT: &str = ".";

// =============================================================================
// CLI Arguments
// =============================================================================

/// labserve - serve a project's published outputs read-only.
///
/// Exposes `project_journal/`, `figure_aggregator/` and the `output/` subtree
/// of numbered analysis directories (`NN_name/`). PDFs open in a live-reloading
/// viewer.
#[derive(Parser, Debug, Clone)]
#[command(name = "labserve")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "LABSERVE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "LABSERVE_PORT")]
    pub port: u16,

    /// Directory to serve.
    #[arg(short, long, default_value = DEFAULT_ROOT, env = "LABSERVE_ROOT")]
    pub root: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.root.exists() {
            return Err(format!("Directory does not exist: {}", self.root.display()));
        }
        if !self.root.is_dir() {
            return Err(format!("Not a directory: {}", self.root.display()));
        }
        Ok(())
    }

    /// Absolute form of the served root. Call `validate()` first.
    pub fn resolved_root(&self) -> Result<PathBuf, String> {
        std::fs::canonicalize(&self.root)
            .map_err(|e| format!("Cannot resolve {}: {}", self.root.display(), e))
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Command a remote user runs locally to reach this server over SSH.
    ///
    /// Wildcard bind addresses are forwarded to loopback, and only the first
    /// label of the host name is used.
    pub fn ssh_forward_command(&self, user: &str, hostname: &str) -> String {
        let remote_host = match self.host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
            host => host,
        };
        let short_host = hostname.split('.').next().unwrap_or(hostname);
        format!(
            "ssh -N -L {port}:{remote_host}:{port} {user}@{short_host}",
            port = self.port
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
