//! Unified error-to-response rendering.
//!
//! Every pipeline failure funnels through [`ExceptionTranslator::handle`]:
//! custom hook first, then the default envelope rendering in the request's
//! negotiated format, then finalization. A failure while writing the error
//! body is logged and swallowed; the original error always wins.

use std::sync::Arc;

use tracing::{error, warn};

use crate::dispatch::RequestContext;
use crate::errors::{DispatchError, ErrorEnvelope};
use crate::host::HostState;
use crate::serializers::encode_body;
use crate::soap::{build_envelope, build_fault_body};

/// Host-installed hook consulted before the default rendering. `Ok(())`
/// means the hook produced the response; an error falls back to status-only
/// handling.
pub type ErrorHook =
    Arc<dyn Fn(&mut RequestContext, &DispatchError) -> Result<(), DispatchError> + Send + Sync>;

pub struct ExceptionTranslator;

impl ExceptionTranslator {
    /// Render `error` into the response and finalize it. Returns the
    /// original error so the dispatcher can surface it to the caller.
    pub fn handle(
        host: &HostState,
        ctx: &mut RequestContext,
        operation: &str,
        error: DispatchError,
    ) -> DispatchError {
        let headers_already_started = ctx.response.headers_started();

        if error.is_client_error() {
            warn!(
                request_id = %ctx.request_id,
                operation,
                code = error.error_code(),
                error = %error,
                "request failed"
            );
        } else {
            error!(
                request_id = %ctx.request_id,
                operation,
                code = error.error_code(),
                error = %error,
                "request failed"
            );
        }

        if let Some(hook) = host.error_hook() {
            let hook = hook.clone();
            match hook(ctx, &error) {
                Ok(()) => {
                    finalize(ctx, headers_already_started);
                    return error;
                }
                Err(hook_error) => {
                    error!(
                        request_id = %ctx.request_id,
                        operation,
                        hook_error = %hook_error,
                        "error hook failed; falling back to status-only response"
                    );
                    ctx.response.set_status(host.status_for(&error));
                    finalize(ctx, headers_already_started);
                    return error;
                }
            }
        }

        let status = host.status_for(&error);
        ctx.response.set_status(status);

        let write_body = host.config().write_errors_to_response
            && !ctx.suppress_error_body
            && !ctx.response.is_closed();
        if write_body {
            let envelope =
                ErrorEnvelope::new(status, &error, host.config().return_error_detail);
            if let Err(write_error) = render_body(ctx, &envelope) {
                error!(
                    request_id = %ctx.request_id,
                    operation,
                    write_error = %write_error,
                    "failed to write error body; surfacing the original error"
                );
            }
        }

        finalize(ctx, headers_already_started);
        error
    }
}

fn render_body(ctx: &mut RequestContext, envelope: &ErrorEnvelope) -> Result<(), DispatchError> {
    let format = ctx.format;
    let (content_type, bytes) = match format.soap_version() {
        Some(version) => {
            let fault = build_fault_body(
                version,
                http::StatusCode::from_u16(envelope.status)
                    .map(|s| s.is_client_error())
                    .unwrap_or(false),
                &envelope.message,
            );
            (
                version.content_type(),
                build_envelope(version, &fault).into_bytes(),
            )
        }
        None => {
            let bytes = encode_body(format, envelope).map_err(|source| {
                DispatchError::Serialization {
                    content_type: format.content_type().to_string(),
                    source,
                }
            })?;
            (format.content_type(), bytes)
        }
    };
    ctx.response.set_content_type(content_type);
    ctx.response.write_body(&bytes)?;
    ctx.response.close();
    Ok(())
}

fn finalize(ctx: &mut RequestContext, headers_already_started: bool) {
    // degraded no-headers mode when the header block preceded the failure
    ctx.response.finalize(!headers_already_started);
}
