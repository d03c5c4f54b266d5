//! Envelope parsing and construction.
//!
//! Parsing walks the document once, capturing the header `Action` element
//! and the byte range of the `Body` children. The fragment is kept as raw
//! XML so the payload codec sees exactly what the client sent.

use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::content::SoapVersion;
use crate::errors::CodecError;

/// The parts of an incoming envelope the dispatcher cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapEnvelope {
    pub version: SoapVersion,
    /// `<Action>` header content, when present and non-empty.
    pub action: Option<String>,
    /// Raw XML between `<Body>` and `</Body>`, whitespace-trimmed.
    pub body_xml: String,
}

fn local_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.local_name().as_ref()).into_owned()
}

/// Parse an envelope, detecting the version from the root namespace when
/// it differs from the transport-negotiated one.
pub fn parse_envelope(
    bytes: &[u8],
    default_version: SoapVersion,
) -> Result<SoapEnvelope, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|err| CodecError::Xml(err.to_string()))?;
    let mut reader = Reader::from_str(text);

    let mut version = default_version;
    let mut action: Option<String> = None;
    let mut body_start: Option<usize> = None;
    let mut body_range: Option<(usize, usize)> = None;
    let mut in_header = false;
    let mut saw_envelope = false;
    let mut depth = 0usize;

    loop {
        // buffer_position reports u64; the document is already in memory
        let event_start = reader.buffer_position() as usize;
        match reader
            .read_event()
            .map_err(|err| CodecError::Xml(err.to_string()))?
        {
            Event::Eof => break,
            Event::Start(e) => {
                let local = local_name(e.name());
                depth += 1;
                if depth == 1 {
                    if local != "Envelope" {
                        return Err(CodecError::Xml(format!(
                            "expected an Envelope root, found {local}"
                        )));
                    }
                    saw_envelope = true;
                    for attr in e.attributes().flatten() {
                        if let Ok(value) = attr.unescape_value() {
                            if value == SoapVersion::Soap11.envelope_namespace() {
                                version = SoapVersion::Soap11;
                            } else if value == SoapVersion::Soap12.envelope_namespace() {
                                version = SoapVersion::Soap12;
                            }
                        }
                    }
                } else if depth == 2 && local == "Header" {
                    in_header = true;
                } else if depth == 2 && local == "Body" {
                    body_start = Some(reader.buffer_position() as usize);
                } else if depth == 3 && in_header && local == "Action" {
                    let content = reader
                        .read_text(e.name())
                        .map_err(|err| CodecError::Xml(err.to_string()))?;
                    let trimmed = content.trim();
                    if !trimmed.is_empty() {
                        action = Some(trimmed.to_string());
                    }
                    // read_text consumed the closing tag
                    depth -= 1;
                }
            }
            Event::End(e) => {
                let local = local_name(e.name());
                if depth == 2 {
                    if local == "Body" {
                        if let Some(start) = body_start.take() {
                            body_range = Some((start, event_start));
                        }
                    } else if local == "Header" {
                        in_header = false;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    if !saw_envelope {
        return Err(CodecError::Xml("document has no Envelope root".to_string()));
    }

    let body_xml = match body_range {
        Some((start, end)) if end > start => text[start..end].trim().to_string(),
        _ => String::new(),
    };

    Ok(SoapEnvelope {
        version,
        action,
        body_xml,
    })
}

/// Wrap a serialized body fragment in a reply envelope.
pub fn build_envelope(version: SoapVersion, body_xml: &str) -> String {
    format!(
        "<soap:Envelope xmlns:soap=\"{}\"><soap:Body>{}</soap:Body></soap:Envelope>",
        version.envelope_namespace(),
        body_xml
    )
}

/// Build the fault element for the given version, ready to be placed in a
/// reply envelope's body.
pub fn build_fault_body(version: SoapVersion, is_client: bool, message: &str) -> String {
    let message = escape(message);
    match version {
        SoapVersion::Soap11 => {
            let code = if is_client { "Client" } else { "Server" };
            format!(
                "<soap:Fault><faultcode>soap:{code}</faultcode>\
                 <faultstring>{message}</faultstring></soap:Fault>"
            )
        }
        SoapVersion::Soap12 => {
            let code = if is_client { "Sender" } else { "Receiver" };
            format!(
                "<soap:Fault><soap:Code><soap:Value>soap:{code}</soap:Value></soap:Code>\
                 <soap:Reason><soap:Text xml:lang=\"en\">{message}</soap:Text></soap:Reason>\
                 </soap:Fault>"
            )
        }
    }
}

/// Local name of the first element in a fragment.
pub fn root_local_name(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().ok()? {
            Event::Start(e) | Event::Empty(e) => return Some(local_name(e.name())),
            Event::Eof => return None,
            _ => {}
        }
    }
}

/// Rewrite a fragment with every namespace prefix and xmlns declaration
/// dropped, leaving plain local names for the codec.
pub fn strip_prefixes(xml: &str) -> Result<String, CodecError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    loop {
        match reader
            .read_event()
            .map_err(|err| CodecError::Xml(err.to_string()))?
        {
            Event::Eof => break,
            event => {
                let rewritten = match event {
                    Event::Start(e) => Event::Start(strip_element(&e)?),
                    Event::Empty(e) => Event::Empty(strip_element(&e)?),
                    Event::End(e) => Event::End(BytesEnd::new(local_name(e.name()))),
                    other => other,
                };
                writer
                    .write_event(rewritten)
                    .map_err(|err| CodecError::Xml(err.to_string()))?;
            }
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|err| CodecError::Xml(err.to_string()))
}

fn strip_element(e: &BytesStart<'_>) -> Result<BytesStart<'static>, CodecError> {
    let mut out = BytesStart::new(local_name(e.name()));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| CodecError::Xml(err.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| CodecError::Xml(err.to_string()))?;
        out.push_attribute((key.as_str(), value.as_ref()));
    }
    Ok(out)
}
