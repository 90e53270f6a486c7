//! Route access guard
//!
//! Explicit per-route enforcement. Each endpoint group declares a
//! [`RequiredAccess`] in a [`RouteTable`]; an [`InterceptorChain`] runs
//! before the handler and a [`CapabilityInterceptor`] evaluates the
//! requirement by calling the resolver directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use policy_authz::{
//!     AuthorizationResolver, CapabilityInterceptor, GuardRequest, InterceptorChain,
//!     RequiredAccess, RouteTable,
//! };
//! use policy_store::MemoryPolicyRepository;
//! use policy_types::Action;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), policy_authz::AuthzError> {
//! let resolver = AuthorizationResolver::new(Arc::new(MemoryPolicyRepository::new()));
//! let routes = RouteTable::new()
//!     .route("/health", RequiredAccess::Open)
//!     .route("/payments", RequiredAccess::Action(Action::new("payments.view")?))
//!     .route(
//!         "/payments/delete",
//!         RequiredAccess::action_on(Action::new("payments.delete")?, "account"),
//!     );
//!
//! let chain = InterceptorChain::new().with(CapabilityInterceptor::new(resolver, routes));
//! chain.run(&GuardRequest::anonymous("/health")).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use policy_types::Action;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{AuthzError, AuthzResult};
use crate::resolver::{AuthorizationResolver, Caller};

/// Access class required by an endpoint group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredAccess {
    /// No identity or permission required
    Open,
    /// Action on the configured default resource (`*` unless overridden)
    Action(Action),
    /// Action on the resource id named by a request parameter
    ActionOn {
        action: Action,
        resource_param: String,
    },
}

impl RequiredAccess {
    /// Require `action` on the resource taken from `resource_param`.
    pub fn action_on(action: Action, resource_param: impl Into<String>) -> Self {
        Self::ActionOn {
            action,
            resource_param: resource_param.into(),
        }
    }
}

/// Route prefix → required access.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<(String, RequiredAccess)>,
}

impl RouteTable {
    /// Create an empty table. Every route is refused until declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the access required under a route prefix.
    ///
    /// Redeclaring a prefix replaces its requirement.
    pub fn route(mut self, prefix: impl Into<String>, access: RequiredAccess) -> Self {
        let prefix = normalize(&prefix.into());
        self.routes.retain(|(p, _)| *p != prefix);
        self.routes.push((prefix, access));
        self
    }

    /// Resolve the requirement for a route; the longest matching prefix
    /// wins. Prefixes match on path-segment boundaries.
    pub fn resolve(&self, route: &str) -> Option<&RequiredAccess> {
        let route = normalize(route);
        self.routes
            .iter()
            .filter(|(prefix, _)| covers(prefix, &route))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, access)| access)
    }
}

fn normalize(route: &str) -> String {
    let trimmed = route.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn covers(prefix: &str, route: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match route.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// A request as seen by the guard.
#[derive(Debug, Clone, Default)]
pub struct GuardRequest {
    /// Request path
    pub route: String,
    /// Identity asserted by the authentication layer, if any
    pub caller: Option<Caller>,
    /// Path and query parameters
    pub params: HashMap<String, String>,
}

impl GuardRequest {
    /// Request from an authenticated caller.
    pub fn new(route: impl Into<String>, caller: Caller) -> Self {
        Self {
            route: route.into(),
            caller: Some(caller),
            params: HashMap::new(),
        }
    }

    /// Request without an identity.
    pub fn anonymous(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            ..Self::default()
        }
    }

    /// Add a request parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// A step run before the handler. Returning an error rejects the request.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, request: &GuardRequest) -> AuthzResult<()>;
}

/// Ordered interceptors; the first rejection stops the chain.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

impl InterceptorChain {
    /// Create an empty chain, which admits every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor.
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Run every interceptor in order.
    pub async fn run(&self, request: &GuardRequest) -> AuthzResult<()> {
        for interceptor in &self.interceptors {
            interceptor.intercept(request).await?;
        }
        Ok(())
    }
}

/// Enforces the route table against the policy resolver.
#[derive(Debug, Clone)]
pub struct CapabilityInterceptor {
    resolver: AuthorizationResolver,
    routes: Arc<RouteTable>,
}

impl CapabilityInterceptor {
    pub fn new(resolver: AuthorizationResolver, routes: RouteTable) -> Self {
        Self {
            resolver,
            routes: Arc::new(routes),
        }
    }
}

#[async_trait]
impl Interceptor for CapabilityInterceptor {
    #[instrument(skip(self, request), fields(route = %request.route))]
    async fn intercept(&self, request: &GuardRequest) -> AuthzResult<()> {
        let Some(access) = self.routes.resolve(&request.route) else {
            warn!("Route has no declared access requirement");
            return Err(AuthzError::Forbidden("route not declared".to_string()));
        };

        let (action, resource_param) = match access {
            RequiredAccess::Open => return Ok(()),
            RequiredAccess::Action(action) => (action, None),
            RequiredAccess::ActionOn {
                action,
                resource_param,
            } => (action, Some(resource_param)),
        };

        let caller = request.caller.as_ref().ok_or(AuthzError::Unauthenticated)?;

        let resource_id = match resource_param {
            None => self.resolver.config().default_resource.as_str(),
            Some(param) => match request.params.get(param) {
                Some(value) => value.as_str(),
                None => {
                    warn!(param = %param, "Resource parameter missing");
                    return Err(AuthzError::Forbidden(format!(
                        "missing resource parameter: {param}"
                    )));
                }
            },
        };

        let subjects = caller.subjects()?;
        let decision = self
            .resolver
            .check_authorization(&caller.profile_id, &subjects, action, resource_id)
            .await?;

        if decision.allowed {
            debug!(user_id = %caller.user_id, action = %action, "Access granted");
            Ok(())
        } else {
            warn!(
                user_id = %caller.user_id,
                action = %action,
                reason = %decision.reason,
                "Access denied"
            );
            Err(AuthzError::Forbidden(decision.reason))
        }
    }
}
