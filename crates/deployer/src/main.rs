use {clap::Parser, std::process::ExitCode};

#[tokio::main]
async fn main() -> ExitCode {
    let args = deployer::arguments::Arguments::parse();
    let mut config = observe::Config::default().with_env_filter(&args.log_filter);
    if let Some(threshold) = args.stderr_threshold {
        config = config.with_stderr_threshold(threshold);
    }
    if args.use_json_logs {
        config = config.with_json_format();
    }
    observe::tracing::initialize(&config);
    tracing::info!("running deployer with validated arguments:\n{}", args);

    // Confirmed deployments are final, so an interrupted run is only reported.
    tokio::select! {
        result = deployer::run(args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                tracing::error!("deployment failed: {err:?}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::error!("deployment interrupted");
            ExitCode::FAILURE
        }
    }
}
