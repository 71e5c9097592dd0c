mod dump;
mod read;

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

const ABOUT: &str = "Process WARC files";
const ABOUT_LONG: &str = "Read, verify, and transform WARC files and records";
const DUMP_ABOUT: &str = "Transform WARC files to JSON formatted output";
const LIST_ABOUT: &str = "Listing of file contents using header fields";
const CHECKSUM_ABOUT: &str = "Verifies checksums";
const CHECKSUM_ABOUT_LONG: &str = "Verifies WARC record checksums.

This processes each WARC record for a 'WARC-Block-Digest' field. If the record \
includes this field, the checksum is computed for the record's block.

The output is formatted as the record's ID, a space, and one of 'ok', 'fail', \
or 'skip'.
";
const INPUT_WARC_FILE_HELP: &str = "Path to WARC file";
const OUTPUT_FILE_HELP: &str = "Path to output file";
const OVERWRITE_HELP: &str = "Allow overwriting existing files";
const OUTPUT_AS_JSON_HELP: &str = "Format the output as JSON";
const SHOW_FIELD_WITH_NAME_HELP: &str = "Show values with the given field name";
const INCLUDE_FILE_HELP: &str = "Include filename and file position";

pub fn create_command() -> Command<'static> {
    let dump_command = Command::new("dump")
        .about(DUMP_ABOUT)
        .arg(
            Arg::new("input")
                .required(true)
                .multiple_values(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help(INPUT_WARC_FILE_HELP),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .takes_value(true)
                .default_value("-")
                .value_parser(clap::value_parser!(PathBuf))
                .help(OUTPUT_FILE_HELP),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .action(ArgAction::SetTrue)
                .help(OVERWRITE_HELP),
        );
    let list_command = Command::new("list")
        .about(LIST_ABOUT)
        .arg(
            Arg::new("input")
                .required(true)
                .multiple_values(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help(INPUT_WARC_FILE_HELP),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .takes_value(true)
                .default_value("-")
                .value_parser(clap::value_parser!(PathBuf))
                .help(OUTPUT_FILE_HELP),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .action(ArgAction::SetTrue)
                .help(OVERWRITE_HELP),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .takes_value(true)
                .action(ArgAction::Append)
                .default_values(&[
                    "WARC-Date",
                    "WARC-Type",
                    "Content-Type",
                    "Content-Length",
                    "WARC-Target-URI",
                ])
                .help(SHOW_FIELD_WITH_NAME_HELP),
        )
        .arg(
            Arg::new("include_file")
                .long("include-file")
                .action(ArgAction::SetTrue)
                .help(INCLUDE_FILE_HELP),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help(OUTPUT_AS_JSON_HELP),
        );

    let checksum_command = Command::new("checksum")
        .about(CHECKSUM_ABOUT)
        .long_about(CHECKSUM_ABOUT_LONG)
        .arg(
            Arg::new("input")
                .required(true)
                .multiple_values(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help(INPUT_WARC_FILE_HELP),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .takes_value(true)
                .default_value("-")
                .value_parser(clap::value_parser!(PathBuf))
                .help(OUTPUT_FILE_HELP),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .action(ArgAction::SetTrue)
                .help(OVERWRITE_HELP),
        );

    Command::new("warc")
        .about(ABOUT)
        .long_about(ABOUT_LONG)
        .subcommand_required(true)
        .subcommand(dump_command)
        .subcommand(list_command)
        .subcommand(checksum_command)
}

pub fn run(global_matches: &ArgMatches, arg_matches: &ArgMatches) -> anyhow::Result<()> {
    match arg_matches.subcommand() {
        Some(("dump", sub_matches)) => dump::handle_dump_command(global_matches, sub_matches),
        Some(("list", sub_matches)) => read::handle_list_command(global_matches, sub_matches),
        Some(("checksum", sub_matches)) => {
            read::handle_checksum_command(global_matches, sub_matches)
        }
        _ => unreachable!(),
    }
}
