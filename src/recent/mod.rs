//! Recently attached exec targets.
//!
//! Every successful launch records its target so `--recent` can list them
//! and `--last` can reattach without retyping namespace, pod and container.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exec::ExecTarget;

pub mod manager;

pub use manager::RecentTargets;

/// A target and when it was last attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentTarget {
    /// Namespace, pod and container
    pub target: ExecTarget,
    /// Backend the target was reached through, if overridden on the command line
    #[serde(default)]
    pub backend_url: Option<String>,
    /// When the target was last attached
    pub last_attached: DateTime<Utc>,
}

impl RecentTarget {
    pub fn new(target: ExecTarget, backend_url: Option<String>) -> Self {
        Self {
            target,
            backend_url,
            last_attached: Utc::now(),
        }
    }

    /// One-line summary for listings
    pub fn describe(&self) -> String {
        let when = self.last_attached.format("%Y-%m-%d %H:%M");
        match &self.backend_url {
            Some(url) => format!("{}  {}  ({})", when, self.target, url),
            None => format!("{}  {}", when, self.target),
        }
    }
}
