//! Configuration for imsto.
//!
//! Settings are grouped in sections, one per storage namespace ("roof"),
//! plus a shared `[common]` section. Consumers depend on the [`Config`]
//! trait; [`StoreConfig`] is the TOML-backed implementation.

pub mod error;
pub mod source;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use source::Config;
pub use store::{StoreConfig, COMMON_SECTION, CONF_ENV, ENV_PREFIX, FILE_NAME};
