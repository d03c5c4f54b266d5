//! Operation metadata and the once-bound invoker.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dispatch::RequestContext;
use crate::errors::DispatchError;
use crate::filters::{AttributeFilter, GlobalFilter};
use crate::registry::attributes::{MetadataVisibility, RequestAttributes};
use crate::serializers::{short_type_name, BoxedValue, TypedCodec};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The bound call into application code: erased request in, optional erased
/// response out. Built once at registration, never re-derived per request.
pub type Invoker = Arc<
    dyn Fn(BoxedValue, RequestAttributes) -> BoxFuture<Result<Option<BoxedValue>, DispatchError>>
        + Send
        + Sync,
>;

/// HTTP method constraint on an operation registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatch {
    /// Wildcard marker: the operation answers any verb.
    Any,
    Exact(Method),
}

impl MethodMatch {
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodMatch::Any => true,
            MethodMatch::Exact(m) => m == method,
        }
    }
}

/// XML serialization strategy for SOAP bodies. `Contract` is the schema
/// shape the type declares; `Reflective` is the per-type opt-in that
/// tolerates namespace-prefixed input and mirrors on the reply side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlStrategy {
    #[default]
    Contract,
    Reflective,
}

/// Declarative part of an operation registration.
pub struct OperationDef {
    pub(crate) name: Option<String>,
    pub(crate) method: MethodMatch,
    pub(crate) routes: Vec<String>,
    pub(crate) request_filters: Vec<AttributeFilter>,
    pub(crate) response_filters: Vec<AttributeFilter>,
    pub(crate) restrict_to: Option<RequestAttributes>,
    pub(crate) xml_strategy: XmlStrategy,
    pub(crate) visibility: MetadataVisibility,
}

impl Default for OperationDef {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationDef {
    pub fn new() -> Self {
        Self {
            name: None,
            method: MethodMatch::Any,
            routes: Vec::new(),
            request_filters: Vec::new(),
            response_filters: Vec::new(),
            restrict_to: None,
            xml_strategy: XmlStrategy::Contract,
            visibility: MetadataVisibility::default(),
        }
    }

    /// Override the operation name (default: the request type's short name).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = MethodMatch::Exact(method);
        self
    }

    pub fn any_method(mut self) -> Self {
        self.method = MethodMatch::Any;
        self
    }

    /// Bind a path template (`/orders/{Id}`, `/files/{Path*}`).
    pub fn route(mut self, template: impl Into<String>) -> Self {
        self.routes.push(template.into());
        self
    }

    /// Attach a request-side filter with an explicit priority.
    pub fn request_filter<F>(mut self, priority: i32, filter: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut dyn std::any::Any) -> Result<(), DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.request_filters.push(AttributeFilter {
            priority,
            filter: Arc::new(filter) as GlobalFilter,
        });
        self
    }

    /// Attach a response-side filter with an explicit priority.
    pub fn response_filter<F>(mut self, priority: i32, filter: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut dyn std::any::Any) -> Result<(), DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.response_filters.push(AttributeFilter {
            priority,
            filter: Arc::new(filter) as GlobalFilter,
        });
        self
    }

    /// Restrict the operation to callers holding at least one of `mask`.
    pub fn restrict(mut self, mask: RequestAttributes) -> Self {
        self.restrict_to = Some(mask);
        self
    }

    pub fn xml_strategy(mut self, strategy: XmlStrategy) -> Self {
        self.xml_strategy = strategy;
        self
    }

    pub fn visibility(mut self, scope: MetadataVisibility) -> Self {
        self.visibility = scope;
        self
    }
}

/// A registered operation: identity, bound invoker, codecs, filters, and
/// access flags. Immutable once the host reaches its ready state.
pub struct Operation {
    pub name: String,
    pub method: MethodMatch,
    pub invoker: Invoker,
    pub request_codec: TypedCodec,
    pub response_codec: Option<TypedCodec>,
    pub request_filters: Vec<AttributeFilter>,
    pub response_filters: Vec<AttributeFilter>,
    pub restrict_to: Option<RequestAttributes>,
    pub xml_strategy: XmlStrategy,
    pub one_way: bool,
    pub visibility: MetadataVisibility,
    pub routes: Vec<String>,
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("one_way", &self.one_way)
            .finish()
    }
}

impl Operation {
    /// Register a request/reply operation.
    pub fn reply<Req, Res, F, Fut>(def: OperationDef, handler: F) -> Self
    where
        Req: Serialize + DeserializeOwned + Default + Send + 'static,
        Res: Serialize + DeserializeOwned + Default + Send + 'static,
        F: Fn(Req, RequestAttributes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, DispatchError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let invoker: Invoker = Arc::new(move |boxed, attrs| {
            let handler = handler.clone();
            match boxed.downcast::<Req>() {
                Ok(request) => {
                    let fut = handler(*request, attrs);
                    Box::pin(async move {
                        fut.await.map(|res| Some(Box::new(res) as BoxedValue))
                    })
                }
                Err(_) => Box::pin(async {
                    Err(DispatchError::fault(
                        short_type_name::<Req>(),
                        "request payload type mismatch",
                    ))
                }),
            }
        });
        Self::assemble::<Req>(def, invoker, Some(TypedCodec::of::<Res>()), false)
    }

    /// Register a one-way operation: no response type, no reply body.
    pub fn one_way<Req, F, Fut>(def: OperationDef, handler: F) -> Self
    where
        Req: Serialize + DeserializeOwned + Default + Send + 'static,
        F: Fn(Req, RequestAttributes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DispatchError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let invoker: Invoker = Arc::new(move |boxed, attrs| {
            let handler = handler.clone();
            match boxed.downcast::<Req>() {
                Ok(request) => {
                    let fut = handler(*request, attrs);
                    Box::pin(async move { fut.await.map(|()| None) })
                }
                Err(_) => Box::pin(async {
                    Err(DispatchError::fault(
                        short_type_name::<Req>(),
                        "request payload type mismatch",
                    ))
                }),
            }
        });
        Self::assemble::<Req>(def, invoker, None, true)
    }

    fn assemble<Req>(
        def: OperationDef,
        invoker: Invoker,
        response_codec: Option<TypedCodec>,
        one_way: bool,
    ) -> Self
    where
        Req: Serialize + DeserializeOwned + Default + Send + 'static,
    {
        let mut request_filters = def.request_filters;
        let mut response_filters = def.response_filters;
        // stable: ties keep declaration order
        request_filters.sort_by_key(|f| f.priority);
        response_filters.sort_by_key(|f| f.priority);

        Self {
            name: def
                .name
                .unwrap_or_else(|| short_type_name::<Req>().to_string()),
            method: def.method,
            invoker,
            request_codec: TypedCodec::of::<Req>(),
            response_codec,
            request_filters,
            response_filters,
            restrict_to: def.restrict_to,
            xml_strategy: def.xml_strategy,
            one_way,
            visibility: def.visibility,
            routes: def.routes,
        }
    }

    /// Key form used in logs: `"POST CreateOrder"` or `"ANY Ping"`.
    pub fn key(&self) -> String {
        match &self.method {
            MethodMatch::Any => format!("ANY {}", self.name),
            MethodMatch::Exact(m) => format!("{} {}", m, self.name),
        }
    }
}
