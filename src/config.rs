//! Environment-driven configuration
//!
//! | Variable                   | Meaning                                         |
//! |----------------------------|-------------------------------------------------|
//! | `GIT_LIGHT_COMMITTER`      | committer used when `commit` is given no `-c`   |
//! | `GIT_LIGHT_COMMITTER_DATE` | fixed commit timestamp, for reproducible runs   |
//! | `GIT_LIGHT_LOG`            | tracing filter directives (default `warn`)      |
//! | `NO_PAGER`                 | disables the pager for `log`                    |

use chrono::{DateTime, FixedOffset};

pub const COMMITTER_ENV: &str = "GIT_LIGHT_COMMITTER";
pub const COMMITTER_DATE_ENV: &str = "GIT_LIGHT_COMMITTER_DATE";
pub const LOG_ENV: &str = "GIT_LIGHT_LOG";
pub const NO_PAGER_ENV: &str = "NO_PAGER";

pub const DEFAULT_COMMITTER: &str = "default committer";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    committer: String,
    committer_date: Option<DateTime<FixedOffset>>,
    pager: bool,
}

impl Config {
    pub fn new(
        committer: String,
        committer_date: Option<DateTime<FixedOffset>>,
        pager: bool,
    ) -> Self {
        Config {
            committer,
            committer_date,
            pager,
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// An unparsable `GIT_LIGHT_COMMITTER_DATE` is ignored and the current
    /// time is used instead.
    pub fn load_from_env() -> Self {
        let committer = std::env::var(COMMITTER_ENV)
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COMMITTER.to_string());
        let committer_date = std::env::var(COMMITTER_DATE_ENV)
            .ok()
            .and_then(|date_str| parse_date(&date_str));
        let pager = std::env::var_os(NO_PAGER_ENV).is_none();

        Config::new(committer, committer_date, pager)
    }

    pub fn committer(&self) -> &str {
        &self.committer
    }

    pub fn use_pager(&self) -> bool {
        self.pager
    }

    /// Timestamp to stamp on a commit being finalized
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.committer_date
            .unwrap_or_else(|| chrono::Local::now().fixed_offset())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_COMMITTER.to_string(), None, false)
    }
}

fn parse_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(date_str)
        .or_else(|_| DateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S %z"))
        .ok()
}
