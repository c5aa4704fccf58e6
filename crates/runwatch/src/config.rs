// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the runwatch server.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "runwatch", about = "Live CI run monitor")]
pub struct MonitorConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "RUNWATCH_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "RUNWATCH_PORT")]
    pub port: u16,

    /// Upstream API base URL.
    #[arg(long, default_value = "https://api.github.com", env = "RUNWATCH_API_BASE")]
    pub api_base: String,

    /// Poll interval for the active watch in milliseconds.
    #[arg(long, default_value_t = 5000, env = "RUNWATCH_POLL_MS")]
    pub poll_ms: u64,

    /// Delay between a trigger commit and run discovery in milliseconds.
    #[arg(long, default_value_t = 2000, env = "RUNWATCH_DISCOVER_DELAY_MS")]
    pub discover_delay_ms: u64,

    /// Page size used when locating the watched run in the run list.
    #[arg(long, default_value_t = 10, env = "RUNWATCH_RUNS_PAGE")]
    pub runs_page: u32,

    /// Minimum remaining token lifetime handed to callers, in seconds.
    #[arg(long, default_value_t = 300, env = "RUNWATCH_TOKEN_MARGIN_SECS")]
    pub token_margin_secs: u64,

    /// Lead time before expiry for the scheduled token renewal, in seconds.
    #[arg(long, default_value_t = 600, env = "RUNWATCH_RENEW_LEAD_SECS")]
    pub renew_lead_secs: u64,

    /// Directory holding one file per secret (secret-store mount).
    /// Secrets found here win over the flags below.
    #[arg(long, env = "RUNWATCH_SECRETS_DIR")]
    pub secrets_dir: Option<std::path::PathBuf>,

    /// Repository owner.
    #[arg(long, env = "RUNWATCH_REPO_OWNER")]
    pub owner: Option<String>,

    /// Repository name.
    #[arg(long, env = "RUNWATCH_REPO_NAME")]
    pub repo: Option<String>,

    /// App identity used as the assertion issuer.
    #[arg(long, env = "RUNWATCH_APP_ID")]
    pub app_id: Option<String>,

    /// Installation the minted tokens are scoped to.
    #[arg(long, env = "RUNWATCH_INSTALLATION_ID")]
    pub installation_id: Option<String>,

    /// Path to the PEM-encoded signing key.
    #[arg(long, env = "RUNWATCH_PRIVATE_KEY_PATH")]
    pub private_key_path: Option<std::path::PathBuf>,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_ms)
    }

    pub fn discover_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.discover_delay_ms)
    }

    pub fn token_margin(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.token_margin_secs)
    }

    pub fn renew_lead(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.renew_lead_secs)
    }
}
