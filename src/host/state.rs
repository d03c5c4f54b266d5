//! The host's central state and its two-phase lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use http::StatusCode;
use tracing::info;

use crate::config::HostConfig;
use crate::content::{ContentTypeRegistry, Format};
use crate::errors::{DispatchError, ErrorHook};
use crate::filters::{GlobalFilter, PreRequestFilter};
use crate::registry::{
    NullContainer, Operation, OperationRegistry, RequestAttributes, ServiceContainer,
};
use crate::routing::{FallbackResolver, RoutePathMatcher, RouteTemplate};
use crate::serializers::BoxedValue;
use crate::transport::TransportRequest;

/// Replaces the default request-binding path for one request type.
pub type RequestBinder =
    Arc<dyn Fn(&TransportRequest) -> Result<BoxedValue, DispatchError> + Send + Sync>;

/// Everything the dispatcher reads per request: registry, routes, filters,
/// hooks, config. Mutable only during the configuring phase; `into_ready`
/// freezes it behind an `Arc` for lock-free concurrent reads.
pub struct HostState {
    config: HostConfig,
    registry: OperationRegistry,
    routes: RoutePathMatcher,
    content_types: ContentTypeRegistry,
    pre_request_filters: Vec<PreRequestFilter>,
    request_filters: Vec<GlobalFilter>,
    response_filters: Vec<GlobalFilter>,
    binders: HashMap<&'static str, RequestBinder>,
    error_hook: Option<ErrorHook>,
    error_status_overrides: HashMap<String, StatusCode>,
    container: Arc<dyn ServiceContainer>,
    ready: AtomicBool,
}

impl Default for HostState {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl HostState {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            registry: OperationRegistry::new(),
            routes: RoutePathMatcher::new(),
            content_types: ContentTypeRegistry::default(),
            pre_request_filters: Vec::new(),
            request_filters: Vec::new(),
            response_filters: Vec::new(),
            binders: HashMap::new(),
            error_hook: None,
            error_status_overrides: HashMap::new(),
            container: Arc::new(NullContainer),
            ready: AtomicBool::new(false),
        }
    }

    fn ensure_configuring(&self) -> Result<(), DispatchError> {
        if self.ready.load(Ordering::Acquire) {
            return Err(DispatchError::Lifecycle(
                "host is ready; registration is closed".to_string(),
            ));
        }
        Ok(())
    }

    /// Register an operation and bind its route templates.
    pub fn register(&mut self, operation: Operation) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        let routes = operation.routes.clone();
        let op = self.registry.insert(operation);
        for pattern in routes {
            let template = RouteTemplate::parse(&pattern, &op.name)?;
            self.routes.add_template(template);
        }
        info!(operation = %op.key(), "registered operation");
        Ok(())
    }

    /// Filter run before any request binding happens.
    pub fn add_pre_request_filter(&mut self, filter: PreRequestFilter) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        self.pre_request_filters.push(filter);
        Ok(())
    }

    /// Global request filter; runs between negative- and non-negative-
    /// priority attribute filters.
    pub fn add_request_filter(&mut self, filter: GlobalFilter) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        self.request_filters.push(filter);
        Ok(())
    }

    pub fn add_response_filter(&mut self, filter: GlobalFilter) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        self.response_filters.push(filter);
        Ok(())
    }

    /// Install the custom error hook consulted before the default error
    /// rendering.
    pub fn set_error_hook(&mut self, hook: ErrorHook) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        self.error_hook = Some(hook);
        Ok(())
    }

    /// Map an error code (`"route_not_found"`, `"operation_fault"`, ...) to
    /// a status other than its built-in one.
    pub fn map_error_status(
        &mut self,
        code: impl Into<String>,
        status: StatusCode,
    ) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        self.error_status_overrides.insert(code.into(), status);
        Ok(())
    }

    /// Last-chance route resolver, consulted after every template misses.
    pub fn set_fallback_resolver(&mut self, resolver: FallbackResolver) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        self.routes.set_fallback(resolver);
        Ok(())
    }

    /// Replace the default binding path for the named request type.
    pub fn register_binder(
        &mut self,
        type_name: &'static str,
        binder: RequestBinder,
    ) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        self.binders.insert(type_name, binder);
        Ok(())
    }

    /// Alias an additional content type onto a wire format.
    pub fn register_content_type(
        &mut self,
        content_type: impl Into<String>,
        format: Format,
    ) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        let content_type = content_type.into();
        self.content_types.register(&content_type, format);
        Ok(())
    }

    pub fn set_container(&mut self, container: Arc<dyn ServiceContainer>) -> Result<(), DispatchError> {
        self.ensure_configuring()?;
        self.container = container;
        Ok(())
    }

    /// One-way transition out of the configuring phase. After this the
    /// state is shared and read-only.
    pub fn into_ready(self) -> Arc<HostState> {
        self.ready.store(true, Ordering::Release);
        info!(
            operations = self.registry.len(),
            routes = self.routes.template_count(),
            "host ready"
        );
        Arc::new(self)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &RoutePathMatcher {
        &self.routes
    }

    pub fn content_types(&self) -> &ContentTypeRegistry {
        &self.content_types
    }

    pub fn pre_request_filters(&self) -> &[PreRequestFilter] {
        &self.pre_request_filters
    }

    pub fn request_filters(&self) -> &[GlobalFilter] {
        &self.request_filters
    }

    pub fn response_filters(&self) -> &[GlobalFilter] {
        &self.response_filters
    }

    pub fn binder_for(&self, type_name: &str) -> Option<&RequestBinder> {
        self.binders.get(type_name)
    }

    pub fn error_hook(&self) -> Option<&ErrorHook> {
        self.error_hook.as_ref()
    }

    pub fn container(&self) -> &dyn ServiceContainer {
        self.container.as_ref()
    }

    /// Status for an error, honoring registered overrides.
    pub fn status_for(&self, error: &DispatchError) -> StatusCode {
        if let Some(status) = self.error_status_overrides.get(error.error_code()) {
            return *status;
        }
        error.status_code()
    }

    /// Enforce an operation's access restriction against the caller's
    /// attribute set.
    pub fn check_restriction(
        &self,
        operation: &Operation,
        attributes: RequestAttributes,
    ) -> Result<(), DispatchError> {
        if let Some(mask) = operation.restrict_to {
            if !mask.intersects(attributes) {
                return Err(DispatchError::UnauthorizedAccess {
                    operation: operation.name.clone(),
                });
            }
        }
        Ok(())
    }
}
