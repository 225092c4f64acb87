//! Menu Configuration Module
//!
//! Turns menu document text into a validated, typed [`MenuConfiguration`]:
//!
//! - `loader`: YAML decoding, parse/load entry points and serialization
//! - `validator`: exhaustive schema validation with structural error paths
//! - `model`: the typed tree handed to the menu layer and the executor
//! - `watcher`: reload trigger that re-validates the document on change

pub mod loader;
pub mod model;
pub mod validator;
pub mod watcher;

pub use loader::{decode, load_config, parse_config, to_yaml, ConfigError};
pub use model::*;
pub use validator::{validate, RawValue, ValidationError, ValidationErrors, ValidationResult};
pub use watcher::{ConfigWatcher, ReloadCallback};
