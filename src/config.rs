use std::fmt;
use std::net::SocketAddr;

use clap::{ArgAction, Parser};

use crate::github::{GitHubConfig, DEFAULT_API_BASE_URL};

/// Runtime settings, from flags or environment variables
#[derive(Parser, Clone)]
#[command(
    name = "gitlink",
    version,
    about = "Serve direct download links for files and directories of public GitHub repositories"
)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "GITLINK_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Token sent to GitHub with every request
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Root of the GitHub REST API
    #[arg(long, env = "GITLINK_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// User-Agent header for outgoing requests
    #[arg(long, env = "GITLINK_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Maximum GitHub requests in flight per download (0 = unlimited)
    #[arg(long, env = "GITLINK_MAX_CONCURRENCY", default_value_t = 16)]
    pub max_concurrency: usize,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Config {
    pub fn github_config(&self) -> GitHubConfig {
        let defaults = GitHubConfig::default();
        GitHubConfig {
            api_base_url: self.api_base_url.clone(),
            token: self.github_token.clone(),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind", &self.bind)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("user_agent", &self.user_agent)
            .field("max_concurrency", &self.max_concurrency)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "gitlink",
            "--bind",
            "0.0.0.0:8080",
            "--github-token",
            "secret",
            "--api-base-url",
            "http://localhost:9999",
            "--max-concurrency",
            "4",
            "-vv",
        ])
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.log_level(), "trace");

        let github = config.github_config();
        assert_eq!(github.api_base_url, "http://localhost:9999");
        assert_eq!(github.token.as_deref(), Some("secret"));
        assert!(github.user_agent.starts_with("gitlink/"));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Config::try_parse_from(["gitlink", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config =
            Config::try_parse_from(["gitlink", "--github-token", "ghp_supersecret"]).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("ghp_supersecret"));
        assert!(debug.contains("<redacted>"));
    }
}
