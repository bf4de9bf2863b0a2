//! confprov-core: multi-instance configuration provider
//!
//! Each provider instance binds an alias to a directory of configuration
//! documents. The [`Provider`] facade registers instances atomically and
//! answers fetch requests by resolving a path to a document value.
//!
//! # Example
//!
//! ```rust,no_run
//! use confprov_core::{Manifest, Provider};
//!
//! let provider = Provider::default();
//! let manifest = Manifest::from_file("providers.yaml").unwrap();
//! provider.init_manifest(&manifest).unwrap();
//!
//! // [alias, file, key...]; with a single instance the alias may be omitted
//! let path = ["local", "database", "host"].map(String::from);
//! let host = provider.fetch(&path).unwrap();
//! println!("{:?}", host.value.get("value"));
//! ```

pub mod error;
pub mod instance;
pub mod manifest;
pub mod provider;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod value;

pub use error::{Error, ErrorKind, Result};
pub use instance::Instance;
pub use manifest::{InstanceEntry, Manifest};
pub use provider::{FetchResponse, Health, HealthStatus, Info, Provider, ProviderOptions};
pub use registry::{Mode, Registry};
pub use resolve::{VALUE_KEY, WILDCARD};
pub use store::{DocumentStore, FileStore, Format, ParseError};
pub use value::{Mapping, Value};
