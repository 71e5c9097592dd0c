use std::{
    cell::RefCell,
    io::{Read, Write},
    rc::Rc,
};

use clap::ArgMatches;
use serde::Serialize;
use warc::{
    header::HeaderMap,
    warc::{classify_block, BlockKind, HttpBlock, HttpMessage},
    RecordMetadata,
};

use crate::argtypes::OutputStream;

use super::read::read_warc_files_loop;

#[derive(Serialize)]
enum DumpElement<'a> {
    Header {
        version: &'a str,
        fields: &'a HeaderMap,
    },
    /// A start-line and header block decoded from an `application/http`
    /// block by the typed block dispatcher, emitted ahead of its payload.
    HttpMessage {
        start_line: String,
        fields: &'a HeaderMap,
    },
    Block {
        data: &'a [u8],
    },
    EndOfRecord,
}

pub fn handle_dump_command(
    global_matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> anyhow::Result<()> {
    let current_metadata: Rc<RefCell<Option<RecordMetadata>>> = Rc::new(RefCell::new(None));
    let block_bytes: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

    read_warc_files_loop(
        global_matches,
        sub_matches,
        |_input_path, output: &mut OutputStream, metadata| {
            let metadata_string = serde_json::to_string(&DumpElement::Header {
                version: metadata.version(),
                fields: metadata.header(),
            })?;
            output.write_all(metadata_string.as_bytes())?;
            output.write_all(b"\n")?;

            *current_metadata.borrow_mut() = Some(metadata.clone());
            block_bytes.borrow_mut().clear();

            Ok(())
        },
        |_output, buffer, amount| {
            block_bytes.borrow_mut().extend_from_slice(&buffer[0..amount]);
            Ok(())
        },
        |output| {
            let metadata = current_metadata
                .borrow_mut()
                .take()
                .expect("header_callback always runs before footer_callback");
            let data = block_bytes.borrow_mut().split_off(0);

            let block = classify_block(&metadata.record_type(), metadata.header());
            let http_message = if block.kind == BlockKind::Http {
                decode_http_message(&block, data.clone())
            } else {
                None
            };

            if let Some((start_line, fields, payload)) = http_message {
                let message_string = serde_json::to_string(&DumpElement::HttpMessage {
                    start_line,
                    fields: &fields,
                })?;
                output.write_all(message_string.as_bytes())?;
                output.write_all(b"\n")?;

                let block_string = serde_json::to_string(&DumpElement::Block { data: &payload })?;
                output.write_all(block_string.as_bytes())?;
                output.write_all(b"\n")?;
            } else {
                let block_string = serde_json::to_string(&DumpElement::Block { data: &data })?;
                output.write_all(block_string.as_bytes())?;
                output.write_all(b"\n")?;
            }

            let end_string = serde_json::to_string(&DumpElement::EndOfRecord)?;
            output.write_all(end_string.as_bytes())?;
            output.write_all(b"\n")?;

            Ok(())
        },
    )
}

/// Parses `data` as an `application/http` block, returning its decoded
/// start-line, headers, and remaining payload. Returns `None` if `data`
/// doesn't parse as HTTP, falling back to dumping it as a raw block.
fn decode_http_message(
    block: &warc::warc::Block,
    data: Vec<u8>,
) -> Option<(String, HeaderMap, Vec<u8>)> {
    let msgtype_hint = block
        .content_type
        .as_ref()
        .and_then(|media_type| media_type.parameter("msgtype"))
        .map(str::to_string);

    let mut http_block = HttpBlock::new(std::io::Cursor::new(data), msgtype_hint);

    let (start_line, fields) = match http_block.message().ok()? {
        HttpMessage::Request(request) => (request.request_line.to_string(), request.fields.clone()),
        HttpMessage::Response(response) => (response.status_line.to_string(), response.fields.clone()),
    };

    let mut payload = Vec::new();
    http_block.payload().ok()?.read_to_end(&mut payload).ok()?;

    Some((start_line, fields, payload))
}
