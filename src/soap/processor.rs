//! Action resolution and body payload handling.

use std::any::Any;

use crate::errors::{CodecError, DispatchError};
use crate::registry::{Operation, XmlStrategy};
use crate::serializers::BoxedValue;
use crate::soap::envelope::{root_local_name, strip_prefixes};
use crate::transport::TransportRequest;

/// Normalize an action value: strip surrounding quotes, then keep the
/// trailing segment of a URI-shaped action.
fn action_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return None;
    }
    let name = trimmed.rsplit('/').find(|s| !s.is_empty()).unwrap_or(trimmed);
    Some(name.to_string())
}

/// Resolve the operation name for an envelope. Precedence: transport
/// `SOAPAction` header, envelope `Action` header, body root element.
pub fn resolve_action(
    request: &TransportRequest,
    body_xml: &str,
    envelope_action: Option<&str>,
) -> Option<String> {
    if let Some(header) = request.header_str("soapaction") {
        if let Some(name) = action_name(header) {
            return Some(name);
        }
    }
    if let Some(action) = envelope_action {
        if let Some(name) = action_name(action) {
            return Some(name);
        }
    }
    root_local_name(body_xml)
}

/// Deserialize the body fragment into the operation's request type. On
/// failure the diagnostic carries the type name and the attempted XML.
pub fn decode_request(operation: &Operation, body_xml: &str) -> Result<BoxedValue, DispatchError> {
    let codec = &operation.request_codec;
    let fragment;
    let input = match operation.xml_strategy {
        XmlStrategy::Contract => body_xml,
        XmlStrategy::Reflective => {
            fragment = strip_prefixes(body_xml).map_err(|source| {
                DispatchError::RequestBinding {
                    type_name: codec.type_name().to_string(),
                    source,
                }
            })?;
            &fragment
        }
    };

    codec
        .decode(crate::content::Format::Xml, input.as_bytes())
        .map_err(|cause| DispatchError::Serialization {
            content_type: "text/xml".to_string(),
            source: CodecError::Xml(format!(
                "could not deserialize {} from body {:?}: {}",
                codec.type_name(),
                body_xml,
                cause
            )),
        })
}

/// Serialize a response payload into the reply body fragment.
pub fn encode_reply(operation: &Operation, payload: &dyn Any) -> Result<String, DispatchError> {
    let codec = operation
        .response_codec
        .as_ref()
        .ok_or_else(|| DispatchError::fault(&operation.name, "one-way operation has no reply"))?;
    let bytes = codec
        .encode(crate::content::Format::Xml, payload)
        .map_err(|source| DispatchError::Serialization {
            content_type: "text/xml".to_string(),
            source,
        })?;
    String::from_utf8(bytes).map_err(|err| DispatchError::Serialization {
        content_type: "text/xml".to_string(),
        source: CodecError::Xml(err.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::OperationDef;
    use http::Method;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct GetOrder {
        id: u32,
    }
    #[derive(Debug, Default, Serialize, Deserialize)]
    struct OrderResponse {
        total: u32,
    }

    fn op(def: OperationDef) -> Operation {
        Operation::reply::<GetOrder, OrderResponse, _, _>(def, |_r, _a| async {
            Ok(OrderResponse { total: 0 })
        })
    }

    #[test]
    fn header_beats_envelope_beats_body() {
        let body = "<Baz/>";
        let request = TransportRequest::new(Method::POST, "/soap")
            .with_header("SOAPAction", "\"http://example.org/Foo\"");
        assert_eq!(
            resolve_action(&request, body, Some("Bar")).as_deref(),
            Some("Foo")
        );

        let bare = TransportRequest::new(Method::POST, "/soap");
        assert_eq!(
            resolve_action(&bare, body, Some("urn:svc/Bar")).as_deref(),
            Some("Bar")
        );
        assert_eq!(resolve_action(&bare, body, None).as_deref(), Some("Baz"));
    }

    #[test]
    fn empty_action_header_falls_through() {
        let request =
            TransportRequest::new(Method::POST, "/soap").with_header("SOAPAction", "\"\"");
        assert_eq!(
            resolve_action(&request, "<Baz/>", None).as_deref(),
            Some("Baz")
        );
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Audit {
        #[serde(rename = "@channel")]
        channel: String,
    }
    #[derive(Debug, Default, Serialize, Deserialize)]
    struct AuditResponse;

    fn audit_op(def: OperationDef) -> Operation {
        Operation::reply::<Audit, AuditResponse, _, _>(def, |_r, _a| async { Ok(AuditResponse) })
    }

    #[test]
    fn contract_strategy_matches_elements_by_local_name() {
        // element names bind by local part under either strategy
        let operation = op(OperationDef::new());
        let boxed = decode_request(
            &operation,
            "<ns:GetOrder xmlns:ns=\"urn:x\"><ns:id>7</ns:id></ns:GetOrder>",
        )
        .unwrap();
        assert_eq!(
            boxed.downcast_ref::<GetOrder>().unwrap(),
            &GetOrder { id: 7 }
        );
    }

    #[test]
    fn contract_strategy_keeps_attribute_prefixes() {
        // a prefixed attribute stays qualified, so the required field is
        // missing and the diagnostic names the type
        let operation = audit_op(OperationDef::new());
        let err = decode_request(&operation, "<Audit xmlns:ns=\"urn:x\" ns:channel=\"web\"/>")
            .unwrap_err();
        assert!(matches!(err, DispatchError::Serialization { .. }));
        let detail = err.detail();
        assert!(detail.contains("Audit"), "diagnostic names the type: {detail}");
    }

    #[test]
    fn reflective_strategy_strips_attribute_prefixes() {
        let operation = audit_op(OperationDef::new().xml_strategy(XmlStrategy::Reflective));
        let boxed = decode_request(
            &operation,
            "<ns:Audit xmlns:ns=\"urn:x\" ns:channel=\"web\"/>",
        )
        .unwrap();
        assert_eq!(
            boxed.downcast_ref::<Audit>().unwrap(),
            &Audit {
                channel: "web".to_string()
            }
        );
    }

    #[test]
    fn reflective_strategy_tolerates_prefixes() {
        let operation = op(OperationDef::new().xml_strategy(XmlStrategy::Reflective));
        let boxed = decode_request(
            &operation,
            "<ns:GetOrder xmlns:ns=\"urn:x\"><ns:id>7</ns:id></ns:GetOrder>",
        )
        .unwrap();
        assert_eq!(
            boxed.downcast_ref::<GetOrder>().unwrap(),
            &GetOrder { id: 7 }
        );
    }

    #[test]
    fn reply_fragment_uses_the_response_root() {
        let operation = op(OperationDef::new());
        let xml = encode_reply(&operation, &OrderResponse { total: 9 }).unwrap();
        assert!(xml.starts_with("<OrderResponse>"));
        assert!(xml.contains("<total>9</total>"));
    }
}
