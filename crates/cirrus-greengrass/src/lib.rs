//! cirrus-greengrass: in-memory IoT-edge emulator.
//!
//! Core, device, function, resource and subscription definitions are
//! containers of immutable versions. Groups assemble a deployable
//! configuration by referencing one version ARN of each kind; those
//! references are resolved against the live stores before a group version
//! is accepted.
//!
//! ```text
//! GreengrassBackend (one per region)
//!   ├── DefinitionStore<CoreDefinitionContent>         ─┐
//!   ├── DefinitionStore<DeviceDefinitionContent>        │ Definition
//!   ├── DefinitionStore<FunctionDefinitionContent>      │   └── versions
//!   ├── DefinitionStore<ResourceDefinitionContent>      │
//!   ├── DefinitionStore<SubscriptionDefinitionContent> ─┘
//!   ├── DefinitionStore<GroupVersionContent>   (references the above by ARN)
//!   └── TagStore
//! ```

pub mod backend;
pub mod content;
pub mod definition;
pub mod validation;

pub use backend::GreengrassBackend;
pub use content::*;
pub use definition::{Definition, DefinitionStore, Version, VersionContent};
pub use validation::DefinitionKind;
