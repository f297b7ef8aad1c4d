use crate::connection::IsolationLevel;
use std::borrow::Cow;
use std::time::Duration;

/// Configuration for [`PgConnection`](super::PgConnection).
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Isolation level applied at every `BEGIN` unless
    /// `set_isolation_level` was called for that transaction.
    pub isolation_level: Option<IsolationLevel>,
    /// Session `statement_timeout`, sent once after connecting.
    pub statement_timeout: Option<Duration>,
    /// Truncate logged SQL strings (in bytes). `None` means no truncation.
    pub max_sql_log_length: Option<usize>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            isolation_level: None,
            statement_timeout: None,
            max_sql_log_length: Some(200),
        }
    }
}

impl ConnectOptions {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default isolation level for new transactions.
    pub fn isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }

    /// Set the session statement timeout.
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }

    /// Session setup sent right after connecting, if any.
    pub(crate) fn session_sql(&self) -> Option<String> {
        self.statement_timeout
            .map(|t| format!("SET statement_timeout = {}", t.as_millis()))
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn truncate_for_log<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        match self.max_sql_log_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                Cow::Owned(format!("{}...", &sql[..end]))
            }
            _ => Cow::Borrowed(sql),
        }
    }
}
