//! Permission checks.
//!
//! The controller only sees a [`PermissionOracle`]. Hosts that integrate a
//! real permission plugin wrap it in a [`PermissionBackend`] and chain it;
//! with no backend installed every check falls back to the operator level.

use super::actor::Actor;

/// Answers whether an actor may use a capability. Must be total: internal
/// failures degrade to the level fallback instead of erroring.
pub trait PermissionOracle: Send + Sync {
    fn check(&self, actor: &dyn Actor, node: &str, fallback_level: u8) -> bool;
}

/// One permission provider. `None` means it has no opinion (not installed,
/// node unknown, lookup failed) and the next backend is asked.
pub trait PermissionBackend: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, actor: &dyn Actor, node: &str) -> Option<bool>;
}

/// Grants when the actor's operator level reaches the fallback level.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpLevelFallback;

impl PermissionOracle for OpLevelFallback {
    fn check(&self, actor: &dyn Actor, _node: &str, fallback_level: u8) -> bool {
        actor.permission_level() >= fallback_level
    }
}

/// Ordered backends; the first one with an opinion wins.
#[derive(Default)]
pub struct PermissionChain {
    backends: Vec<Box<dyn PermissionBackend>>,
}

impl PermissionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: impl PermissionBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for PermissionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.backends.iter().map(|b| b.name()))
            .finish()
    }
}

impl PermissionOracle for PermissionChain {
    fn check(&self, actor: &dyn Actor, node: &str, fallback_level: u8) -> bool {
        for backend in &self.backends {
            if let Some(allowed) = backend.check(actor, node) {
                tracing::trace!(backend = backend.name(), node, allowed, "permission resolved");
                return allowed;
            }
        }
        OpLevelFallback.check(actor, node, fallback_level)
    }
}
