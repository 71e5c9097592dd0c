use std::{
    io::{Read, Write},
    path::Path,
};

use clap::ArgMatches;
use warc::{Reader, RecordMetadata, WarcError};

use crate::argtypes::{MultiInput, OutputStream};

pub fn read_warc_files_loop<FH, FB, FF>(
    global_matches: &ArgMatches,
    sub_matches: &ArgMatches,
    mut header_callback: FH,
    mut body_callback: FB,
    mut footer_callback: FF,
) -> anyhow::Result<()>
where
    FH: FnMut(&Path, &mut OutputStream, &RecordMetadata) -> anyhow::Result<()>,
    FB: FnMut(&mut OutputStream, &[u8], usize) -> anyhow::Result<()>,
    FF: FnMut(&mut OutputStream) -> anyhow::Result<()>,
{
    let mut multi_input = MultiInput::from_args(global_matches, sub_matches)?;
    let mut output = OutputStream::from_args(sub_matches)?;

    let mut buffer = vec![0u8; 16384];

    while let Some((path, file)) = multi_input.next_file()? {
        let mut reader = Reader::new(file);

        loop {
            let metadata = reader.begin_record()?;

            let metadata = match metadata {
                Some(metadata) => metadata,
                None => break,
            };

            header_callback(&path, &mut output, &metadata)?;

            let mut block = reader.read_block();
            loop {
                let amount = block.read(&mut buffer)?;

                if amount == 0 {
                    break;
                }

                body_callback(&mut output, &buffer, amount)?;
                multi_input.progress_bar.inc(amount as u64);
            }

            reader.end_record()?;
            footer_callback(&mut output)?;
        }
    }

    multi_input.progress_bar.finish_and_clear();

    Ok(())
}

pub fn handle_list_command(
    global_matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> anyhow::Result<()> {
    let names = sub_matches
        .get_many::<String>("name")
        .unwrap()
        .collect::<Vec<&String>>();
    let is_json = sub_matches.get_one::<bool>("json").cloned().unwrap();
    let include_file = sub_matches
        .get_one::<bool>("include_file")
        .cloned()
        .unwrap();

    read_warc_files_loop(
        global_matches,
        sub_matches,
        |input_path, output, metadata| {
            let mut line_buffer = Vec::new();

            if include_file {
                line_buffer.push(input_path.to_string_lossy().into_owned());
                line_buffer.push(metadata.offset().to_string());
            }

            for name in &names {
                match metadata.header().get_str(name.as_str()) {
                    Some(value) => line_buffer.push(value.to_string()),
                    None => line_buffer.push(String::new()),
                }
            }

            if is_json {
                output.write_all(serde_json::to_string(&line_buffer)?.as_bytes())?;
                output.write_all(b"\n")?;
            } else {
                let mut writer = csv::Writer::from_writer(Vec::new());
                writer.serialize(&line_buffer)?;
                output.write_all(&writer.into_inner()?)?;
            }

            Ok(())
        },
        |_output, _buffer, _amount| Ok(()),
        |_output| Ok(()),
    )
}

/// Verifies each record's `WARC-Block-Digest`, reusing the library's own
/// [warc::digest::DigestReader]/[warc::digest::LabelledDigest::verify]
/// pipeline rather than hashing independently.
///
/// This command reads records directly through [Reader] instead of
/// [read_warc_files_loop], since verifying a digest requires teeing the
/// block through a hasher as it's read, not just observing chunks after
/// the fact.
pub fn handle_checksum_command(
    global_matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> anyhow::Result<()> {
    let mut multi_input = MultiInput::from_args(global_matches, sub_matches)?;
    let mut output = OutputStream::from_args(sub_matches)?;

    while let Some((_path, file)) = multi_input.next_file()? {
        let mut reader = Reader::new(file);

        while let Some(metadata) = reader.begin_record()? {
            let record_id = metadata
                .header()
                .get_str("WARC-Record-ID")
                .unwrap_or_default();
            write!(output, "{record_id} ")?;

            if metadata.header().get_str("WARC-Block-Digest").is_some() {
                match reader.verify_block_digest(&metadata) {
                    Ok(bytes) => {
                        multi_input.progress_bar.inc(bytes.len() as u64);
                        writeln!(output, "ok")?;
                    }
                    Err(WarcError::DigestMismatch { .. }) => writeln!(output, "fail")?,
                    Err(error) => return Err(error.into()),
                }
            } else {
                let amount = std::io::copy(&mut reader.read_block(), &mut std::io::sink())?;
                multi_input.progress_bar.inc(amount);
                writeln!(output, "skip")?;
            }

            reader.end_record()?;
        }
    }

    multi_input.progress_bar.finish_and_clear();
    Ok(())
}
