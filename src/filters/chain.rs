//! Ordered filter execution with short-circuit semantics.

use std::any::Any;
use std::sync::Arc;

use crate::dispatch::RequestContext;
use crate::errors::DispatchError;

/// Raw filter run before the request object is constructed.
pub type PreRequestFilter =
    Arc<dyn Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync>;

/// Request/response filter: sees the context and the (erased) payload.
pub type GlobalFilter =
    Arc<dyn Fn(&mut RequestContext, &mut dyn Any) -> Result<(), DispatchError> + Send + Sync>;

/// A filter attached to one operation with an explicit signed priority.
///
/// All filters with `priority < 0` run strictly before the global list;
/// the rest run strictly after. Ties keep declaration order (the operation
/// sorts its list with a stable sort at registration).
#[derive(Clone)]
pub struct AttributeFilter {
    pub priority: i32,
    pub filter: GlobalFilter,
}

impl std::fmt::Debug for AttributeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeFilter")
            .field("priority", &self.priority)
            .finish()
    }
}

/// Borrowed view over the host's global filter lists, executing one
/// request's filter stages.
pub struct FilterChain<'a> {
    pre_request: &'a [PreRequestFilter],
    request_global: &'a [GlobalFilter],
    response_global: &'a [GlobalFilter],
}

impl<'a> FilterChain<'a> {
    pub fn new(
        pre_request: &'a [PreRequestFilter],
        request_global: &'a [GlobalFilter],
        response_global: &'a [GlobalFilter],
    ) -> Self {
        Self {
            pre_request,
            request_global,
            response_global,
        }
    }

    /// Run the raw pre-request list. Returns `true` if a filter terminated
    /// the response (the pipeline must stop without touching the body).
    pub fn run_pre(&self, ctx: &mut RequestContext) -> Result<bool, DispatchError> {
        for filter in self.pre_request {
            filter(ctx)?;
            if ctx.response.is_closed() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Request-side stage: negative-priority attributes, then the global
    /// list in registration order, then the rest.
    pub fn run_request(
        &self,
        ctx: &mut RequestContext,
        attributes: &[AttributeFilter],
        payload: &mut dyn Any,
    ) -> Result<bool, DispatchError> {
        self.run_stage(ctx, self.request_global, attributes, payload)
    }

    /// Response-side stage, symmetric to the request side.
    pub fn run_response(
        &self,
        ctx: &mut RequestContext,
        attributes: &[AttributeFilter],
        payload: &mut dyn Any,
    ) -> Result<bool, DispatchError> {
        self.run_stage(ctx, self.response_global, attributes, payload)
    }

    fn run_stage(
        &self,
        ctx: &mut RequestContext,
        globals: &[GlobalFilter],
        attributes: &[AttributeFilter],
        payload: &mut dyn Any,
    ) -> Result<bool, DispatchError> {
        let split = attributes.partition_point(|a| a.priority < 0);
        let (negative, non_negative) = attributes.split_at(split);

        for attr in negative {
            (attr.filter)(ctx, payload)?;
            if ctx.response.is_closed() {
                return Ok(true);
            }
        }
        for filter in globals {
            filter(ctx, payload)?;
            if ctx.response.is_closed() {
                return Ok(true);
            }
        }
        for attr in non_negative {
            (attr.filter)(ctx, payload)?;
            if ctx.response.is_closed() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Format;
    use crate::dispatch::RequestContext;
    use crate::transport::{BufferedResponse, TransportRequest};
    use http::Method;
    use std::sync::Mutex;

    fn context() -> RequestContext {
        RequestContext::new(
            TransportRequest::new(Method::GET, "/t"),
            Box::new(BufferedResponse::new()),
            Format::Json,
            "Test".to_string(),
        )
    }

    fn recording(log: Arc<Mutex<Vec<String>>>, tag: &str) -> GlobalFilter {
        let tag = tag.to_string();
        Arc::new(move |_, _| {
            log.lock().unwrap().push(tag.clone());
            Ok(())
        })
    }

    #[test]
    fn globals_run_between_priority_groups() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let globals = vec![recording(log.clone(), "global")];
        let mut attributes: Vec<AttributeFilter> = [3, -5, 0, -1]
            .into_iter()
            .map(|priority| AttributeFilter {
                priority,
                filter: recording(log.clone(), &priority.to_string()),
            })
            .collect();
        attributes.sort_by_key(|a| a.priority);

        let chain = FilterChain::new(&[], &globals, &[]);
        let mut ctx = context();
        let mut payload = ();
        let handled = chain
            .run_request(&mut ctx, &attributes, &mut payload)
            .unwrap();
        assert!(!handled);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["-5", "-1", "global", "0", "3"]
        );
    }

    #[test]
    fn closing_response_stops_the_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let closer: GlobalFilter = {
            let log = log.clone();
            Arc::new(move |ctx, _| {
                log.lock().unwrap().push("closer".to_string());
                ctx.response.write_body(b"done")?;
                ctx.response.close();
                Ok(())
            })
        };
        let globals = vec![closer, recording(log.clone(), "unreached")];
        let chain = FilterChain::new(&[], &globals, &[]);
        let mut ctx = context();
        let mut payload = ();
        let handled = chain.run_request(&mut ctx, &[], &mut payload).unwrap();
        assert!(handled);
        assert_eq!(*log.lock().unwrap(), vec!["closer"]);
        assert_eq!(ctx.response.body(), b"done");
    }

    #[test]
    fn pre_request_filters_short_circuit_too() {
        let pre: PreRequestFilter = Arc::new(|ctx| {
            ctx.response.close();
            Ok(())
        });
        let chain = FilterChain::new(std::slice::from_ref(&pre), &[], &[]);
        let mut ctx = context();
        assert!(chain.run_pre(&mut ctx).unwrap());
    }

    #[test]
    fn filter_errors_propagate() {
        let failing: GlobalFilter =
            Arc::new(|_, _| Err(DispatchError::fault("Test", "filter blew up")));
        let globals = vec![failing];
        let chain = FilterChain::new(&[], &globals, &[]);
        let mut ctx = context();
        let mut payload = ();
        assert!(chain.run_request(&mut ctx, &[], &mut payload).is_err());
    }
}
