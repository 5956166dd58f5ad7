//! # hotspot_core
//!
//! Strategies, polling and fallback orchestration for creating a Wi-Fi
//! access point on a host that shares its internet connection.
//!
//! # Architecture
//!
//! - **Backends**: interchangeable strategies behind [`HotspotBackend`]
//! - **Registry**: maps a [`BackendKind`] to its instance
//! - **Orchestrator**: tries `create_hotspot` on each backend until one succeeds
//! - **Poller**: waits on asynchronous platform operations with a deadline
//! - **Classifier**: turns command failures into human-readable diagnoses
//! - **Service**: runs operations on background tasks
//!
//! # Example
//!
//! ```rust,ignore
//! use hotspot_core::{BackendKind, HotspotConfig, HotspotService, Operation};
//!
//! let service = HotspotService::from_config(&HotspotConfig::default());
//! let result = service
//!     .run(BackendKind::Mobile, Operation::Create {
//!         ssid: "Office5G".into(),
//!         passphrase: "longenoughpass".into(),
//!     })
//!     .await?;
//! println!("{}", result.message);
//! ```

pub mod backend;
pub mod backends;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod privileges;
pub mod registry;
pub mod result;
pub mod service;
pub mod validation;

// Re-export main types for convenience
pub use backend::{BackendKind, BackendState, EngineContext, HotspotBackend};
pub use backends::{MobileHotspotBackend, NetshBackend, PowerShellBackend};
pub use classifier::{Diagnosis, DiagnosisSource, ErrorClassifier, ErrorSignature, GenericKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::HotspotConfig;
pub use error::{CoreError, CoreResult};
pub use orchestrator::{attempt_order, Attempt, FallbackOrchestrator, FallbackOutcome, ATTEMPT_SEPARATOR};
pub use poller::{AsyncOperation, AsyncPollOutcome, ConvergenceProbe, OperationStatus, PollSettings, Poller};
pub use privileges::{FixedPrivileges, PrivilegeProbe, SystemPrivileges};
pub use registry::BackendRegistry;
pub use result::{BackendResult, FailureKind};
pub use service::{render_diagnosis, HotspotService, Operation};
pub use validation::{AccessPointConfig, InputPolicy, ValidationError};
