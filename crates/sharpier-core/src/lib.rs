//! Sharpier Core - version-aware CSharpier worker pool.
//!
//! Editors that format C# with CSharpier have to run the exact tool version
//! each project pins. This crate works out that version for any file,
//! installs it on demand, and keeps one long-lived worker per version so
//! formatting requests are cheap.
//!
//! # Example
//!
//! ```rust,no_run
//! use sharpier_core::{ProcessProvider, ProviderConfig};
//! use std::path::Path;
//!
//! let provider = ProcessProvider::new(ProviderConfig::default());
//!
//! // Called from the host's document-change hook.
//! provider.on_file_touched(Path::new("/repo/src/Program.cs"));
//!
//! let worker = provider.get_process_for(Path::new("/repo/src/Program.cs"));
//! if let Some(formatted) = worker.format(Path::new("/repo/src/Program.cs"), "class A{}") {
//!     println!("{}", formatted);
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod formatting;
pub mod install;
pub mod notify;
pub mod paths;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod throttle;
pub mod version;
pub mod worker;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ProtocolConfig, ProviderConfig, ThrottleConfig, ToolConfig};
pub use error::{Result, SharpierError};
pub use formatting::FormattingService;
pub use install::{CustomPathInstaller, ToolInstaller};
pub use notify::{LogNotifier, Notifier, ProcessKiller};
pub use provider::{ProcessProvider, ProcessProviderBuilder};
pub use registry::ProcessRegistry;
pub use resolver::{
    DotnetVersionQuery, ProjectManifestStrategy, ToolManifestStrategy, VersionQuery,
    VersionResolver, VersionStrategy,
};
pub use throttle::WarmupThrottle;
pub use version::ToolVersion;
pub use worker::{PipeEncoding, WorkerKind, WorkerProcess, WorkerState};
