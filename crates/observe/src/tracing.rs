use {
    crate::Config,
    std::{io::IsTerminal, panic::PanicHookInfo},
    time::macros::format_description,
    tracing::Level,
    tracing_subscriber::{
        EnvFilter,
        Layer,
        fmt::{time::UtcTime, writer::MakeWriterExt as _},
        prelude::*,
        util::SubscriberInitExt,
    },
};

/// Initializes tracing setup that is shared between the binaries.
/// `env_filter` has similar syntax to env_logger. It is documented at
/// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn initialize(config: &Config) {
    set_tracing_subscriber(config);
    std::panic::set_hook(Box::new(tracing_panic_hook));
}

fn set_tracing_subscriber(config: &Config) {
    let stderr_threshold = config.stderr_threshold.unwrap_or(Level::ERROR);
    let writer = std::io::stdout
        .with_min_level(stderr_threshold)
        .or_else(std::io::stderr);
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_timer(timer);
    let fmt_layer = if config.use_json_format {
        fmt_layer.json().boxed()
    } else {
        fmt_layer
            .with_ansi(std::io::stdout().is_terminal())
            .boxed()
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.env_filter))
        .with(fmt_layer)
        .init();
}

/// Panic hook that prints roughly the same message as the default panic hook
/// but uses tracing:error instead of stderr.
///
/// Useful when we want panic messages to have the proper log format.
fn tracing_panic_hook(panic: &PanicHookInfo) {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("<unnamed>");
    let backtrace = std::backtrace::Backtrace::force_capture();
    tracing::error!("thread '{name}' {panic}\nstack backtrace:\n{backtrace}");
}
