//! Builder for configuring a ProcessProvider.

use super::ProcessProvider;
use crate::clock::{Clock, SystemClock};
use crate::config::ProviderConfig;
use crate::install::{CustomPathInstaller, ToolInstaller};
use crate::notify::{LogNotifier, Notifier};
use crate::registry::ProcessRegistry;
use crate::resolver::{DotnetVersionQuery, VersionQuery, VersionResolver};
use crate::throttle::WarmupThrottle;
use crate::worker::WorkerProcess;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Builder for [`ProcessProvider`].
///
/// Every collaborator has a default derived from the [`ProviderConfig`]; hosts
/// override the ones they integrate with.
///
/// # Example
///
/// ```rust,no_run
/// use sharpier_core::{LogNotifier, ProcessProvider, ProviderConfig};
/// use std::sync::Arc;
///
/// let provider = ProcessProvider::builder(ProviderConfig::default())
///     .with_notifier(Arc::new(LogNotifier))
///     .build();
/// ```
pub struct ProcessProviderBuilder {
    config: ProviderConfig,
    resolver: Option<VersionResolver>,
    query: Option<Arc<dyn VersionQuery>>,
    installer: Option<Arc<dyn ToolInstaller>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ProcessProviderBuilder {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            resolver: None,
            query: None,
            installer: None,
            notifier: None,
            clock: None,
        }
    }

    /// Replace the whole resolver (strategy chain and query).
    pub fn with_resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Keep the standard strategy chain but use a different fallback query.
    ///
    /// Ignored when a full resolver is supplied.
    pub fn with_query(mut self, query: Arc<dyn VersionQuery>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn ToolInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Arc<ProcessProvider> {
        let config = self.config;
        let resolver = self.resolver.unwrap_or_else(|| {
            let query = self.query.unwrap_or_else(|| {
                Arc::new(DotnetVersionQuery::new(&config.dotnet_executable))
            });
            VersionResolver::with_query(query)
        });
        let installer = self
            .installer
            .unwrap_or_else(|| Arc::new(CustomPathInstaller::from_config(&config)));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Arc::new_cyclic(|this| ProcessProvider {
            this: this.clone(),
            resolver,
            installer,
            notifier,
            throttle: WarmupThrottle::new(config.warmup_window, clock),
            registry: ProcessRegistry::new(),
            null_worker: Arc::new(WorkerProcess::Null),
            warned_for_old_version: AtomicBool::new(false),
        })
    }
}
