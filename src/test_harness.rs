use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::WaitConfig;
use crate::error::{BoxError, WaitError};
use crate::probe::{EventFlag, HttpProbe};
use crate::waiter::ConditionWaiter;

// Default configuration constants
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8181";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;

pub const WEBAPP_STARTUP: &str = "webapp startup";
pub const SERVLET_STARTUP: &str = "servlet startup";
pub const SERVER: &str = "server";
pub const BUNDLE_STARTUP: &str = "bundle startup";

/// Lifecycle states of a hosted component, e.g. an OSGi bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentState {
    Installed,
    Resolved,
    Starting,
    Active,
    Stopping,
    Uninstalled,
}

/// A component installed into the runtime under test.
///
/// `state` may change asynchronously after `start` returns; implementations
/// read it from shared state, so `state` takes `&self`.
pub trait HostedComponent {
    fn name(&self) -> &str;
    fn start(&mut self) -> Result<()>;
    fn state(&self) -> ComponentState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Fires when a web application is deployed.
    Web,
    /// Fires when a servlet is registered.
    Servlet,
}

/// The runtime hosting components under test.
pub trait ComponentHost {
    type Component: HostedComponent;

    fn install(&mut self, location: &str) -> Result<Self::Component>;

    /// Register `flag` so the host records matching lifecycle events on it.
    fn register_listener(&mut self, kind: ListenerKind, flag: EventFlag) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct TestContextConfig {
    pub server_url: String,
    pub request_timeout_ms: u64,
    pub wait: WaitConfig,
}

impl Default for TestContextConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            wait: WaitConfig::default(),
        }
    }
}

/// Per-test fixture: owns the host handle, the HTTP client and the listeners
/// registered during one test. Nothing is shared between tests.
pub struct TestContext<H: ComponentHost> {
    host: H,
    waiter: ConditionWaiter,
    http: Option<HttpProbe>,
    web_listener: Option<EventFlag>,
    servlet_listener: Option<EventFlag>,
}

impl<H: ComponentHost> TestContext<H> {
    /// Set up a context: validates timings and creates the HTTP client.
    pub fn new(host: H, config: TestContextConfig) -> Result<Self> {
        config
            .wait
            .validate()
            .context("Invalid wait configuration for test context")?;

        let http = HttpProbe::new(
            config.server_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
        .context("Failed to create HTTP test client")?;
        log::info!("Test context ready for {}", config.server_url);

        Ok(Self {
            host,
            waiter: ConditionWaiter::with_config(config.wait),
            http: Some(http),
            web_listener: None,
            servlet_listener: None,
        })
    }

    /// Run `body` between setup and teardown. Teardown runs whether or not
    /// `body` fails.
    pub fn run<T, F>(host: H, config: TestContextConfig, body: F) -> Result<T>
    where
        F: FnOnce(&mut TestContext<H>) -> Result<T>,
    {
        let mut context = Self::new(host, config)?;
        let outcome = body(&mut context);
        context.teardown();
        outcome
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn waiter(&self) -> &ConditionWaiter {
        &self.waiter
    }

    pub fn init_web_listener(&mut self) -> Result<EventFlag> {
        let flag = EventFlag::new();
        self.host
            .register_listener(ListenerKind::Web, flag.clone())
            .context("Failed to register web listener")?;
        self.web_listener = Some(flag.clone());
        Ok(flag)
    }

    /// With `servlet_name`, only events for that servlet count.
    pub fn init_servlet_listener(&mut self, servlet_name: Option<&str>) -> Result<EventFlag> {
        let flag = match servlet_name {
            Some(name) => EventFlag::for_name(name),
            None => EventFlag::new(),
        };
        self.host
            .register_listener(ListenerKind::Servlet, flag.clone())
            .context("Failed to register servlet listener")?;
        self.servlet_listener = Some(flag.clone());
        Ok(flag)
    }

    pub fn wait_for_web_listener(&self) -> Result<(), WaitError> {
        self.wait_for_listener(WEBAPP_STARTUP, self.web_listener.as_ref())
    }

    pub fn wait_for_servlet_listener(&self) -> Result<(), WaitError> {
        self.wait_for_listener(SERVLET_STARTUP, self.servlet_listener.as_ref())
    }

    /// Wait until `target` (a path below the server URL, or an absolute URL)
    /// answers with a 2xx status.
    pub fn wait_for_server(&self, target: &str) -> Result<(), WaitError> {
        let http = self.http.as_ref();
        let spec = self.waiter.spec(SERVER, || -> Result<bool, BoxError> {
            let http = http.ok_or("HTTP test client was already released")?;
            Ok(http.check_server(target)?)
        });
        self.waiter.wait(spec)
    }

    /// Install the component at `location`, start it, and wait until it is
    /// active.
    pub fn install_and_start(&mut self, location: &str) -> Result<H::Component> {
        let mut component = self
            .host
            .install(location)
            .with_context(|| format!("Failed to install {location}"))?;
        component
            .start()
            .with_context(|| format!("Failed to start {}", component.name()))?;

        self.waiter.wait_until(BUNDLE_STARTUP, || {
            component.state() == ComponentState::Active
        })?;
        log::info!("Component {} is active", component.name());

        Ok(component)
    }

    /// Release the HTTP client and forget registered listeners.
    pub fn teardown(&mut self) {
        if self.http.take().is_some() {
            log::info!("Test context teardown completed");
        }
        self.web_listener = None;
        self.servlet_listener = None;
    }

    fn wait_for_listener(&self, label: &str, flag: Option<&EventFlag>) -> Result<(), WaitError> {
        let spec = self.waiter.spec(label, || -> Result<bool, BoxError> {
            let flag = flag.ok_or_else(|| format!("no listener initialised for {label}"))?;
            Ok(flag.is_set())
        });
        self.waiter.wait(spec)
    }
}

impl<H: ComponentHost> Drop for TestContext<H> {
    fn drop(&mut self) {
        if self.http.is_some() {
            log::info!("Test context drop triggered");
            self.teardown();
        }
    }
}
