//! Backend registry: typed lookup from [`BackendKind`] to an instance.

use std::collections::HashMap;

use tracing::debug;

use crate::backend::{BackendKind, EngineContext, HotspotBackend};
use crate::backends::{MobileHotspotBackend, NetshBackend, PowerShellBackend};
use crate::error::{CoreError, CoreResult};

/// A registry of backend instances, at most one per kind.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendKind, Box<dyn HotspotBackend>>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Registry holding the three built-in strategies over one context.
    pub fn standard(ctx: &EngineContext) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MobileHotspotBackend::new(ctx.clone())));
        registry.register(Box::new(NetshBackend::new(ctx.clone())));
        registry.register(Box::new(PowerShellBackend::new(ctx.clone())));
        registry
    }

    /// Register a backend under its `kind()`, replacing any previous one.
    pub fn register(&mut self, backend: Box<dyn HotspotBackend>) {
        let kind = backend.kind();
        debug!("Registering backend: {}", kind);
        self.backends.insert(kind, backend);
    }

    pub fn get(&self, kind: BackendKind) -> Option<&dyn HotspotBackend> {
        self.backends.get(&kind).map(|b| b.as_ref())
    }

    pub fn get_mut(&mut self, kind: BackendKind) -> Option<&mut (dyn HotspotBackend + 'static)> {
        self.backends.get_mut(&kind).map(|b| b.as_mut())
    }

    /// Get a backend, returning an error if it is not registered.
    pub fn get_required(&self, kind: BackendKind) -> CoreResult<&dyn HotspotBackend> {
        self.get(kind).ok_or(CoreError::BackendNotRegistered(kind))
    }

    pub fn get_required_mut(&mut self, kind: BackendKind) -> CoreResult<&mut (dyn HotspotBackend + 'static)> {
        self.get_mut(kind).ok_or(CoreError::BackendNotRegistered(kind))
    }

    pub fn contains(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// Registered kinds in priority order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        BackendKind::PRIORITY
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn unregister(&mut self, kind: BackendKind) -> Option<Box<dyn HotspotBackend>> {
        debug!("Unregistering backend: {}", kind);
        self.backends.remove(&kind)
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.kinds())
            .finish()
    }
}
