//! Action logging with pattern-based filtering
//!
//! Patterns are matched against action kinds, so `people/*` selects every
//! action a `people/...` creator builds, failure kinds included.

use crate::store::{Dispatched, Middleware, Next};
use crate::validation::Dispatchable;
use crate::Action;

/// Configuration for action logging with glob pattern filtering.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `people/*` matches people/add, people/add/invalid, etc.
/// - `*/invalid` matches every failure kind ending in `/invalid`
/// - `Tick` matches only Tick
#[derive(Debug, Clone, Default)]
pub struct ActionLoggerConfig {
    /// If non-empty, only log actions matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude actions matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl ActionLoggerConfig {
    /// Create a new config from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use vetted_dispatch_core::middleware::ActionLoggerConfig;
    ///
    /// let config = ActionLoggerConfig::new(Some("people/*,signup"), Some("*/invalid"));
    /// assert!(config.should_log("people/add"));
    /// assert!(config.should_log("signup"));
    /// assert!(!config.should_log("people/add/invalid"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: include.map(split_patterns).unwrap_or_default(),
            exclude_patterns: exclude.map(split_patterns).unwrap_or_default(),
        }
    }

    /// Create a config with specific pattern vectors
    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_patterns: include,
            exclude_patterns: exclude,
        }
    }

    /// Check if an action kind should be logged based on include/exclude patterns
    pub fn should_log(&self, kind: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| glob_match(p, kind))
        {
            return false;
        }

        !self.exclude_patterns.iter().any(|p| glob_match(p, kind))
    }
}

fn split_patterns(patterns: &str) -> Vec<String> {
    patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Simple glob pattern matching supporting `*` and `?`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                // Let the last star swallow one more character and retry
                Some((star_pi, star_ti)) => {
                    star = Some((star_pi, star_ti + 1));
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}

/// A middleware that logs actions as they pass through the chain
///
/// Validatable actions are logged twice over their lifetime: once on the way
/// in (as pending) and once more when whatever they resolved to re-enters
/// the chain, if this middleware sits on the path it re-enters through.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    /// Whether to log before forwarding
    pub log_before: bool,
    /// Whether to log the outcome after forwarding
    pub log_after: bool,
    filter: ActionLoggerConfig,
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingMiddleware {
    /// Create a new logging middleware with default settings (log after only)
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
            filter: ActionLoggerConfig::default(),
        }
    }

    /// Create a logging middleware that logs both before and after
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            ..Self::new()
        }
    }

    /// Only log kinds accepted by `filter`
    pub fn with_filter(mut self, filter: ActionLoggerConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> &ActionLoggerConfig {
        &self.filter
    }
}

impl<A: Action> Middleware<A> for LoggingMiddleware {
    fn handle(&mut self, action: Dispatchable<A>, next: Next<'_, A>) -> Dispatched {
        let kind = action.kind();
        if !self.filter.should_log(kind) {
            return next.forward(action);
        }

        let validatable = action.is_validatable();
        if self.log_before {
            tracing::debug!(kind = %kind, validatable, stage = next.stage(), "Dispatching action");
        }

        let dispatched = next.forward(action);

        if self.log_after {
            match dispatched.changed() {
                Some(state_changed) => {
                    tracing::debug!(kind = %kind, state_changed, "Action processed")
                }
                None => tracing::debug!(kind = %kind, "Action pending validation"),
            }
        }
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use crate::unit::Unit;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("Tick", "Tick"));
        assert!(!glob_match("Tick", "Tock"));
        assert!(!glob_match("Tick", "TickTock"));
    }

    #[test]
    fn test_glob_match_star() {
        assert!(glob_match("people/*", "people/add"));
        assert!(glob_match("people/*", "people/add/invalid"));
        assert!(glob_match("people/*", "people/"));
        assert!(!glob_match("people/*", "staff/people/add"));

        assert!(glob_match("*/invalid", "people/add/invalid"));
        assert!(glob_match("*add*", "people/add/invalid"));
        assert!(glob_match("*", ""));
    }

    #[test]
    fn test_glob_match_question() {
        assert!(glob_match("add?", "adds"));
        assert!(!glob_match("add?", "add"));
        assert!(!glob_match("add?", "addss"));
    }

    #[test]
    fn test_glob_match_backtracks() {
        assert!(glob_match("a*b*c", "axxbyybzc"));
        assert!(glob_match("*/add/*", "people/add/add/invalid"));
        assert!(!glob_match("a*b", "axxbyy"));
    }

    #[test]
    fn test_logger_config_include() {
        let config = ActionLoggerConfig::new(Some("people/*, signup"), None);
        assert!(config.should_log("people/add"));
        assert!(config.should_log("signup"));
        assert!(!config.should_log("staff/add"));
    }

    #[test]
    fn test_logger_config_exclude() {
        let config = ActionLoggerConfig::new(None, Some("Tick,*/invalid"));
        assert!(!config.should_log("Tick"));
        assert!(!config.should_log("people/add/invalid"));
        assert!(config.should_log("people/add"));
    }

    #[test]
    fn test_logger_config_include_and_exclude() {
        let config = ActionLoggerConfig::new(Some("people/*"), Some("people/*/invalid"));
        assert!(config.should_log("people/add"));
        assert!(!config.should_log("people/add/invalid"));
        assert!(!config.should_log("staff/add"));
    }

    #[test]
    fn test_logger_config_default_logs_everything() {
        let config = ActionLoggerConfig::default();
        assert!(config.should_log("Tick"));
        assert!(config.should_log("people/add/invalid"));
        assert!(ActionLoggerConfig::new(Some(""), None).should_log("anything"));
    }

    fn count(state: &mut u32, _action: Unit<()>) -> bool {
        *state += 1;
        true
    }

    #[test]
    fn test_logging_middleware_forwards() {
        let store = Store::new(0u32, count)
            .with_middleware(LoggingMiddleware::verbose())
            .with_middleware(
                LoggingMiddleware::new().with_filter(ActionLoggerConfig::new(None, Some("*"))),
            );

        assert_eq!(store.dispatch(Unit::new("tick", ())).changed(), Some(true));
        assert_eq!(store.snapshot(), 1);
    }
}
