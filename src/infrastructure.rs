//! Infrastructure layer: browser control, page parsing, site profiles,
//! configuration and logging.

pub mod browser;
pub mod config;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod sites;

pub use browser::{BrowserError, BrowserGuard, BrowserLauncher, BrowserSession, ChromiumLauncher};
pub use config::{AppConfig, ConfigManager};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{Extractor, ParsingError, ParsingResult, SelectorExtractor};
pub use sites::{ReadinessPolicy, SiteProfile, SiteRegistry};
