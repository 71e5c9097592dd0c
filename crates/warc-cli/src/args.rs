use clap::Command;

pub fn root_command<'h>() -> Command<'h> {
    let command = Command::new(clap::crate_name!())
        .about("Inspect, verify, and transform WARC files")
        .version(clap::crate_version!())
        .subcommand_required(true)
        .subcommand(Command::new("crash_error").hide(true))
        .subcommand(Command::new("crash_panic").hide(true))
        .subcommand(crate::warc::create_command());

    crate::logging::logging_args(command)
}
