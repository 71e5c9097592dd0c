use clap::{Arg, ArgMatches, Command};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{prelude::*, EnvFilter};

pub fn logging_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("log_filter")
                .long("log-filter")
                .short('l')
                .help("Filter level of severity and targets of logging messages.")
                .default_value("warn"),
        )
        .arg(
            Arg::new("log_sink")
                .long("log-sink")
                .help("Destination of logging messages.")
                .possible_values(["stderr"])
                .default_value("stderr"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(clap::ArgAction::SetTrue)
                .help("Suppress the progress bar."),
        )
}

pub fn set_up_logging(arg_matches: &ArgMatches) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_new(
            arg_matches.value_of("log_filter").unwrap(),
        )?)
        .init();

    Ok(())
}

pub fn create_and_config_progress_bar(global_matches: &ArgMatches) -> ProgressBar {
    if global_matches.get_one::<bool>("quiet").cloned().unwrap_or(false) {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{bar:40} {bytes}/{total_bytes} ({bytes_per_sec}, eta {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
