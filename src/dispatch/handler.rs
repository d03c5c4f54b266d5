//! Per-variant request processing: generic wire formats and SOAP.

use std::any::Any;

use http::{Method, StatusCode};
use tracing::debug;

use crate::content::{Format, SoapVersion};
use crate::dispatch::RequestContext;
use crate::errors::DispatchError;
use crate::filters::FilterChain;
use crate::host::HostState;
use crate::registry::Operation;
use crate::serializers::BoxedValue;
use crate::soap::{build_envelope, decode_request, encode_reply, parse_envelope, resolve_action};

/// Run a routed request through the generic pipeline: bind, filter,
/// invoke, filter, serialize.
pub(crate) async fn process_generic(
    host: &HostState,
    ctx: &mut RequestContext,
    operation: &Operation,
) -> Result<(), DispatchError> {
    let chain = FilterChain::new(
        host.pre_request_filters(),
        host.request_filters(),
        host.response_filters(),
    );
    if chain.run_pre(ctx)? {
        return Ok(());
    }

    let mut payload = bind_request(host, ctx, operation)?;
    if chain.run_request(ctx, &operation.request_filters, payload.as_mut())? {
        return Ok(());
    }

    host.container().resolve(&operation.name);
    let invoked = (operation.invoker)(payload, ctx.attributes).await;
    host.container().release(&operation.name);

    match invoked? {
        Some(mut reply) => {
            if chain.run_response(ctx, &operation.response_filters, reply.as_mut())? {
                return Ok(());
            }
            write_reply(host, ctx, operation, reply.as_ref())
        }
        None => {
            // one-way over a generic format: acknowledged, no body
            ctx.response.set_status(StatusCode::NO_CONTENT);
            ctx.response.close();
            Ok(())
        }
    }
}

/// Build the request instance. Precedence: custom binder, query binding
/// for body-less verbs, form fields, body decode, default instance; route
/// and query pairs are overlaid last.
fn bind_request(
    host: &HostState,
    ctx: &RequestContext,
    operation: &Operation,
) -> Result<BoxedValue, DispatchError> {
    let codec = &operation.request_codec;
    if let Some(binder) = host.binder_for(codec.type_name()) {
        return binder(&ctx.request);
    }

    let type_name = codec.type_name();
    let bind_err = |source| DispatchError::RequestBinding {
        type_name: type_name.to_string(),
        source,
    };

    let method = &ctx.request.method;
    let query_bound =
        *method == Method::GET || *method == Method::DELETE || *method == Method::OPTIONS;

    let base = if query_bound {
        codec.default_value()
    } else if ctx
        .request
        .content_type()
        .is_some_and(|ct| ct.eq_ignore_ascii_case("application/x-www-form-urlencoded"))
    {
        let fields = ctx.request.form_fields();
        codec
            .merge_pairs(codec.default_value(), &fields)
            .map_err(bind_err)?
    } else if !ctx.request.body.is_empty() {
        match ctx.request.content_type() {
            // body tagged with a type nothing can decode: empty instance
            Some(ct) if host.content_types().lookup(ct).is_none() => codec.default_value(),
            _ => codec
                .decode(ctx.format, &ctx.request.body)
                .map_err(bind_err)?,
        }
    } else {
        codec.default_value()
    };

    let merged = codec.merge_pairs(base, &ctx.route_params).map_err(bind_err)?;
    codec.merge_pairs(merged, &ctx.request.query).map_err(bind_err)
}

/// Serialize the reply in the negotiated format, honoring the JSONP and
/// debug-inspection switches.
fn write_reply(
    host: &HostState,
    ctx: &mut RequestContext,
    operation: &Operation,
    payload: &dyn Any,
) -> Result<(), DispatchError> {
    let codec = operation
        .response_codec
        .as_ref()
        .ok_or_else(|| DispatchError::fault(&operation.name, "operation has no response type"))?;

    if ctx.request.query_value("debug") == Some("inspect") {
        let tree = codec
            .inspect(payload)
            .map_err(|source| DispatchError::Serialization {
                content_type: "text/plain".to_string(),
                source,
            })?;
        let mut out = String::new();
        flatten("", &tree, &mut out);
        ctx.response.set_content_type("text/plain; charset=utf-8");
        ctx.response.write_body(out.as_bytes())?;
        ctx.response.close();
        return Ok(());
    }

    let format = ctx.format;
    let bytes = codec
        .encode(format, payload)
        .map_err(|source| DispatchError::Serialization {
            content_type: format.content_type().to_string(),
            source,
        })?;

    if format == Format::Json && host.config().allow_jsonp_requests {
        let callback = ctx
            .request
            .query_value("callback")
            .filter(|cb| is_valid_callback(cb))
            .map(str::to_string);
        let precompressed = ctx
            .response
            .headers()
            .contains_key(http::header::CONTENT_ENCODING);
        if let (Some(callback), false) = (callback, precompressed) {
            ctx.response
                .set_content_type("application/javascript; charset=utf-8");
            ctx.response.write_body(callback.as_bytes())?;
            ctx.response.write_body(b"(")?;
            ctx.response.write_body(&bytes)?;
            ctx.response.write_body(b")")?;
            ctx.response.close();
            return Ok(());
        }
    }

    ctx.response.set_content_type(format.content_type());
    ctx.response.write_body(&bytes)?;
    ctx.response.close();
    Ok(())
}

fn is_valid_callback(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$'))
}

/// Dotted-path flattening of a value tree for the inspection view.
fn flatten(prefix: &str, value: &serde_json::Value, out: &mut String) {
    use std::fmt::Write;
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(&format!("{prefix}[{index}]"), child, out);
            }
        }
        scalar => {
            let _ = writeln!(out, "{prefix}: {scalar}");
        }
    }
}

/// Run a SOAP request: parse the envelope, resolve the action, then the
/// same filter/invoke stages with envelope-shaped output.
pub(crate) async fn process_soap(
    host: &HostState,
    ctx: &mut RequestContext,
    transport_version: SoapVersion,
) -> Result<(), DispatchError> {
    let body = ctx.request.body.clone();
    let envelope = parse_envelope(&body, transport_version).map_err(|source| {
        DispatchError::RequestBinding {
            type_name: "Envelope".to_string(),
            source,
        }
    })?;
    let version = envelope.version;
    ctx.format = match version {
        SoapVersion::Soap11 => Format::Soap11,
        SoapVersion::Soap12 => Format::Soap12,
    };

    let action = resolve_action(&ctx.request, &envelope.body_xml, envelope.action.as_deref())
        .ok_or_else(|| DispatchError::UnknownOperation {
            name: "(unresolved action)".to_string(),
        })?;
    let operation = host
        .registry()
        .find(&action, &ctx.request.method)
        .ok_or_else(|| DispatchError::UnknownOperation { name: action })?;

    ctx.operation_name = operation.name.clone();
    if operation.one_way {
        // fire-and-forget: failures surface as status only
        ctx.suppress_error_body = true;
    }
    host.check_restriction(&operation, ctx.attributes)?;
    debug!(
        request_id = %ctx.request_id,
        operation = %operation.key(),
        version = ?version,
        "resolved soap action"
    );

    let mut payload = decode_request(&operation, &envelope.body_xml)?;

    let chain = FilterChain::new(
        host.pre_request_filters(),
        host.request_filters(),
        host.response_filters(),
    );
    let mut handled = chain.run_pre(ctx)?;
    if !handled {
        handled = chain.run_request(ctx, &operation.request_filters, payload.as_mut())?;
    }
    if handled {
        return finish_handled(ctx, &operation, version);
    }

    host.container().resolve(&operation.name);
    let invoked = (operation.invoker)(payload, ctx.attributes).await;
    host.container().release(&operation.name);

    match invoked? {
        Some(mut reply) => {
            let handled = chain.run_response(ctx, &operation.response_filters, reply.as_mut())?;
            if handled && ctx.response.bytes_written() > 0 {
                return Ok(());
            }
            write_soap_reply(ctx, &operation, version, reply.as_ref())
        }
        None => {
            // one-way: acknowledged, never an envelope
            ctx.response.set_status(StatusCode::ACCEPTED);
            ctx.response.close();
            Ok(())
        }
    }
}

/// A filter terminated the pipeline. The reply message pattern still owes
/// the caller an envelope when nothing was written.
fn finish_handled(
    ctx: &mut RequestContext,
    operation: &Operation,
    version: SoapVersion,
) -> Result<(), DispatchError> {
    if operation.one_way || ctx.response.bytes_written() > 0 {
        return Ok(());
    }
    if let Some(codec) = &operation.response_codec {
        let default_reply = codec.default_value();
        return write_soap_reply(ctx, operation, version, default_reply.as_ref());
    }
    Ok(())
}

fn write_soap_reply(
    ctx: &mut RequestContext,
    operation: &Operation,
    version: SoapVersion,
    payload: &dyn Any,
) -> Result<(), DispatchError> {
    let fragment = encode_reply(operation, payload)?;
    let envelope = build_envelope(version, &fragment);
    ctx.response.set_content_type(version.content_type());
    ctx.response.write_body(envelope.as_bytes())?;
    ctx.response.close();
    Ok(())
}
