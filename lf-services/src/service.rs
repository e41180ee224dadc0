//! Service trait and lifecycle management.
//!
//! Every service implements `Service`, which provides a standard lifecycle
//! (init, shutdown) and a health check used by `lostfound status`.

use lf_core::error::LfResult;

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Service has been created but not initialized.
    Created,
    /// Service is running and ready.
    Running,
    /// Service has been stopped.
    Stopped,
    /// Service encountered a fatal error.
    Failed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Trait that all lost & found services implement.
///
/// Services are initialized in dependency order by the ServiceRegistry.
pub trait Service: Send + Sync {
    /// Human-readable name of this service.
    fn name(&self) -> &str;

    /// Current state of this service.
    fn state(&self) -> ServiceState;

    /// Initialize the service. Called once during application startup.
    fn init(&mut self) -> LfResult<()>;

    /// Gracefully shut down the service.
    fn shutdown(&mut self) -> LfResult<()>;

    /// Health check. Returns true if the service is operational.
    fn is_healthy(&self) -> bool {
        self.state() == ServiceState::Running
    }
}

/// Fail with `ServiceNotInitialized` unless the service is running.
pub(crate) fn ensure_running(name: &str, state: ServiceState) -> LfResult<()> {
    if state == ServiceState::Running {
        Ok(())
    } else {
        Err(lf_core::error::LfError::ServiceNotInitialized(format!(
            "{name} is {state}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestService {
        state: ServiceState,
    }

    impl Service for TestService {
        fn name(&self) -> &str {
            "test"
        }
        fn state(&self) -> ServiceState {
            self.state
        }
        fn init(&mut self) -> LfResult<()> {
            self.state = ServiceState::Running;
            Ok(())
        }
        fn shutdown(&mut self) -> LfResult<()> {
            self.state = ServiceState::Stopped;
            Ok(())
        }
    }

    #[test]
    fn test_service_lifecycle() {
        let mut svc = TestService {
            state: ServiceState::Created,
        };
        assert!(!svc.is_healthy());
        assert!(ensure_running(svc.name(), svc.state()).is_err());
        svc.init().unwrap();
        assert!(svc.is_healthy());
        assert!(ensure_running(svc.name(), svc.state()).is_ok());
        svc.shutdown().unwrap();
        assert!(!svc.is_healthy());
    }
}
