//! Component lifecycle.
//!
//! Components are constructed with their collaborators passed in
//! explicitly, then driven through `initialize → start → stop` by a
//! [`ServiceHost`]. Initialization failures abort startup before any
//! component is started.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::error::ConfigError;

/// A component with an explicit lifecycle.
pub trait Service {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Validate configuration and prepare internal state.
    fn initialize(&mut self) -> Result<(), ConfigError>;

    /// Begin serving requests.
    fn start(&mut self) {}

    /// Stop serving and release owned resources.
    fn stop(&mut self) {}
}

/// Owns a set of services and drives their lifecycle in order.
///
/// Services are initialized and started in registration order and stopped
/// in reverse order.
#[derive(Default)]
pub struct ServiceHost {
    services: Vec<Box<dyn Service>>,
    running: bool,
}

impl ServiceHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service (builder pattern).
    #[must_use]
    pub fn with(mut self, service: impl Service + 'static) -> Self {
        self.services.push(Box::new(service));
        self
    }

    /// Initialize every service, then start them all.
    ///
    /// If any initialization fails nothing is started.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        for service in &mut self.services {
            debug!(service = service.name(), "initializing");
            service.initialize()?;
        }
        for service in &mut self.services {
            info!(service = service.name(), "starting");
            service.start();
        }
        self.running = true;
        Ok(())
    }

    /// Stop every service in reverse order. No-op if not running.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        for service in self.services.iter_mut().rev() {
            info!(service = service.name(), "stopping");
            service.stop();
        }
        self.running = false;
    }

    /// Whether `start` has succeeded and `stop` has not been called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Shared services: the host drives the lifecycle while callers keep a
/// handle for requests.
impl<S: Service> Service for Arc<Mutex<S>> {
    fn name(&self) -> &'static str {
        self.lock().unwrap_or_else(|e| e.into_inner()).name()
    }

    fn initialize(&mut self) -> Result<(), ConfigError> {
        self.lock().unwrap_or_else(|e| e.into_inner()).initialize()
    }

    fn start(&mut self) {
        self.lock().unwrap_or_else(|e| e.into_inner()).start();
    }

    fn stop(&mut self) {
        self.lock().unwrap_or_else(|e| e.into_inner()).stop();
    }
}

impl Drop for ServiceHost {
    fn drop(&mut self) {
        self.stop();
    }
}
