//! Browser driver adapters.
//!
//! - [`ScriptedBrowserDriver`]: declared pages, used by tests and `--driver scripted`
//! - [`HttpBrowserDriver`]: fetches pages over HTTP and evaluates them statically

pub mod http;
pub mod scripted;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ports::BrowserDriver;

pub use http::HttpBrowserDriver;
pub use scripted::{DriverProbe, PageScript, ScriptedBrowserDriver};

/// Driver selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Static HTTP fetches against the live site
    #[default]
    Http,
    /// Built-in demo storefront, no network access
    Scripted,
}

impl DriverKind {
    pub fn build(self) -> Arc<dyn BrowserDriver> {
        match self {
            Self::Http => Arc::new(HttpBrowserDriver::new()),
            Self::Scripted => Arc::new(ScriptedBrowserDriver::demo_storefront()),
        }
    }
}
