use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A flag set from a listener callback and read by a wait loop.
///
/// Clones share the same flag, so one clone can be handed to the component
/// that fires events while another is polled by the test.
#[derive(Debug, Clone, Default)]
pub struct EventFlag {
    fired: Arc<AtomicBool>,
    name_filter: Option<Arc<str>>,
}

impl EventFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag that only fires for events carrying `name`.
    pub fn for_name(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            name_filter: Some(Arc::from(name)),
        }
    }

    pub fn name_filter(&self) -> Option<&str> {
        self.name_filter.as_deref()
    }

    /// Listener entry point: record an event from the source called `name`.
    pub fn record(&self, name: &str) {
        match self.name_filter.as_deref() {
            Some(expected) if expected != name => {
                log::trace!("Ignoring event from {name}, waiting for {expected}");
            }
            _ => self.signal(),
        }
    }

    pub fn signal(&self) {
        self.fired.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.fired.store(false, Ordering::Release);
    }

    pub fn predicate(&self) -> impl FnMut() -> Result<bool, Infallible> + '_ {
        move || Ok(self.is_set())
    }
}
