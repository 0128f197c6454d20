//! User-facing notifications raised by the provider.
//!
//! Hosts render these however they like; the provider never waits on them.

use std::path::Path;
use std::sync::Weak;
use tracing::{info, warn};

/// Something that can tear down every running worker, e.g. after the user
/// installed a missing tool version.
pub trait ProcessKiller: Send + Sync {
    fn kill_running_processes(&self);
}

/// Notification sink for the host.
pub trait Notifier: Send + Sync {
    /// No usable tool version was found for `directory`. `killer` lets the
    /// host reset the pool once the tool has been installed; it is weak so a
    /// pending notification never keeps the pool alive.
    fn display_install_needed(&self, directory: &Path, killer: Weak<dyn ProcessKiller>);

    /// One-time advice to move off an outdated tool version.
    fn display_upgrade_notice(&self, message: &str);
}

/// Notifier that only logs. Used when the host does not supply one.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn display_install_needed(&self, directory: &Path, _killer: Weak<dyn ProcessKiller>) {
        warn!(
            "CSharpier was not found for {}. Install it with `dotnet tool install csharpier` \
             or add it to .config/dotnet-tools.json",
            directory.display()
        );
    }

    fn display_upgrade_notice(&self, message: &str) {
        info!("{}", message);
    }
}
