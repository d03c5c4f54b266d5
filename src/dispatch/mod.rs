//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! TransportRequest + ResponseTransport
//!     → route match (suffix strip) → format negotiation
//!     → RequestContext
//!     → handler.rs (generic or SOAP variant)
//!         bind → pre filters → request filters → invoke
//!         → response filters → serialize
//!     → on any failure: ExceptionTranslator
//!     → DispatchOutcome (finalized response + result)
//! ```
//!
//! # Design Decisions
//! - The dispatcher owns the context for the request's whole lifetime;
//!   nothing per-request is shared
//! - Route matching runs before negotiation so a path suffix can win
//! - Every exit path finalizes the response exactly once

pub mod context;
pub mod handler;

use std::sync::Arc;

use tracing::debug;

use crate::content::{AccessResult, ContentFormatResolver, Format};
use crate::errors::{DispatchError, ExceptionTranslator};
use crate::host::HostState;
use crate::registry::RequestAttributes;
use crate::routing::{MatchResult, RouteMatch};
use crate::transport::{ResponseTransport, TransportRequest};

pub use context::RequestContext;

/// The finalized response plus the pipeline result. The error, when
/// present, is the original failure; the response already reflects it.
pub struct DispatchOutcome {
    pub response: Box<dyn ResponseTransport>,
    pub result: Result<(), DispatchError>,
}

/// Entry point a hosting transport drives. Cheap to clone; all state lives
/// in the shared [`HostState`].
#[derive(Clone)]
pub struct Dispatcher {
    host: Arc<HostState>,
}

impl Dispatcher {
    pub fn new(host: Arc<HostState>) -> Self {
        Self { host }
    }

    pub async fn dispatch(
        &self,
        request: TransportRequest,
        response: Box<dyn ResponseTransport>,
    ) -> DispatchOutcome {
        self.dispatch_with_attributes(request, response, RequestAttributes::empty())
            .await
    }

    /// Dispatch with caller-supplied connection attributes (secure,
    /// localhost, ...) merged into the request's attribute set.
    pub async fn dispatch_with_attributes(
        &self,
        request: TransportRequest,
        response: Box<dyn ResponseTransport>,
        caller: RequestAttributes,
    ) -> DispatchOutcome {
        let host = &self.host;
        let method = request.method.clone();
        let path = request.path.clone();

        let route = host.routes().match_request(
            host.registry(),
            &method,
            &path,
            host.config().allow_route_content_type_extensions,
        );
        let suffix = match &route {
            MatchResult::Found(m) => m.suffix_format,
            MatchResult::NotFound => None,
        };

        let resolver = ContentFormatResolver::new(host.config(), host.content_types());
        let (format, denied) = match resolver.resolve(&request, suffix) {
            AccessResult::Allowed(format) => (format, None),
            // render the refusal in the host default format
            AccessResult::Denied { content_type } => (
                host.content_types()
                    .lookup(&host.config().default_content_type)
                    .unwrap_or(Format::Json),
                Some(content_type),
            ),
        };

        let mut ctx = RequestContext::new(request, response, format, String::new());
        ctx.attributes =
            caller | RequestAttributes::from_method(&method) | RequestAttributes::from_format(format);
        debug!(
            request_id = %ctx.request_id,
            method = %method,
            path = %path,
            format = ?format,
            "dispatching request"
        );

        let result = match self.run(&mut ctx, route, denied).await {
            Ok(()) => {
                if !ctx.response.is_finalized() {
                    ctx.response.finalize(true);
                }
                Ok(())
            }
            Err(error) => {
                let operation = ctx.operation_name.clone();
                Err(ExceptionTranslator::handle(host, &mut ctx, &operation, error))
            }
        };

        DispatchOutcome {
            response: ctx.response,
            result,
        }
    }

    async fn run(
        &self,
        ctx: &mut RequestContext,
        route: MatchResult,
        denied: Option<String>,
    ) -> Result<(), DispatchError> {
        let host = &self.host;
        if !host.is_ready() {
            return Err(DispatchError::Lifecycle(
                "host is still configuring".to_string(),
            ));
        }
        if let Some(content_type) = denied {
            return Err(DispatchError::UnauthorizedFormat { content_type });
        }

        if let Some(version) = ctx.format.soap_version() {
            return handler::process_soap(host, ctx, version).await;
        }

        match route {
            MatchResult::Found(RouteMatch {
                operation, params, ..
            }) => {
                ctx.operation_name = operation.name.clone();
                ctx.route_params = params;
                host.check_restriction(&operation, ctx.attributes)?;
                handler::process_generic(host, ctx, &operation).await
            }
            MatchResult::NotFound => Err(DispatchError::RouteNotFound {
                method: ctx.request.method.to_string(),
                path: ctx.request.path.clone(),
            }),
        }
    }
}
