use {
    alloy::signers::local::PrivateKeySigner,
    clap::Parser,
    std::{path::PathBuf, time::Duration},
    tracing::Level,
    url::Url,
};

#[derive(Parser)]
#[clap(name = "deploy", about = "Deploys the contracts of a deployment plan")]
pub struct Arguments {
    /// Network to deploy to. Must be configured in the `[networks]` table of
    /// the deployment plan.
    #[clap(long, env)]
    pub network: String,

    /// Path of the TOML deployment plan.
    #[clap(long, env, default_value = "deploy.toml")]
    pub plan: PathBuf,

    /// The Ethereum node URL to connect to. Overrides the node URL of the
    /// network in the deployment plan.
    #[clap(long, env)]
    pub node_url: Option<Url>,

    /// Private key of the account that signs all transactions.
    #[clap(long, env, hide_env_values = true)]
    pub private_key: PrivateKeySigner,

    /// Root directory of the compiled contract artifacts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Directory holding one deployment manifest per network.
    #[clap(long, env, default_value = "deployments")]
    pub manifest_dir: PathBuf,

    /// Number of blocks a transaction needs to be buried under before it
    /// counts as confirmed.
    #[clap(long, env, default_value = "1")]
    pub confirmations: u64,

    /// How long to wait for a deployment to be confirmed before giving up.
    #[clap(
        long,
        env,
        default_value = "5m",
        value_parser = humantime::parse_duration,
    )]
    pub confirmation_timeout: Duration,

    #[clap(long, env, default_value = "warn,deployer=debug,chain=debug")]
    pub log_filter: String,

    /// Log events at or above this level go to stderr instead of stdout.
    /// Defaults to `error`.
    #[clap(long, env)]
    pub stderr_threshold: Option<Level>,

    /// Output logs as JSON.
    #[clap(long, env)]
    pub use_json_logs: bool,
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "network: {}", self.network)?;
        writeln!(f, "plan: {:?}", self.plan)?;
        writeln!(f, "node_url: {:?}", self.node_url.as_ref().map(Url::as_str))?;
        writeln!(f, "private_key: SECRET")?;
        writeln!(f, "deployer: {}", self.private_key.address())?;
        writeln!(f, "artifacts: {:?}", self.artifacts)?;
        writeln!(f, "manifest_dir: {:?}", self.manifest_dir)?;
        writeln!(f, "confirmations: {}", self.confirmations)?;
        writeln!(f, "confirmation_timeout: {:?}", self.confirmation_timeout)?;
        writeln!(f, "log_filter: {}", self.log_filter)?;
        writeln!(f, "stderr_threshold: {:?}", self.stderr_threshold)?;
        writeln!(f, "use_json_logs: {}", self.use_json_logs)?;
        Ok(())
    }
}
