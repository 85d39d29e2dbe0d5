//! # Heuristics Configuration
//!
//! Thresholds and enforcement templates, loaded from TOML.
//!
//! ```toml
//! miss_threshold = 4
//! max_blackmarks = 4
//! certain_commands = ["tempban {player} 3d Cheating: {reason}"]
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vigil_core::SubjectId;

use crate::error::{VigilError, VigilResult};

/// Detector configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Horizontal or vertical delta worth logging in debug mode.
    pub significant_movement: f64,
    /// Idle time after which the strike accumulator starts over.
    pub strike_timeout_ms: u64,
    /// Strike total that produces a verdict.
    pub strike_limit: u32,
    /// Misses before the next hit counts as suspicious.
    pub miss_threshold: u32,
    /// Blackmarks that produce a verdict.
    pub max_blackmarks: u32,
    /// Blackmarks removed when the subject dies.
    pub forgiven_on_death: u32,
    /// Idle time after which blackmarks are wiped.
    pub blackmarks_timeout_secs: u64,
    /// Ticks after startup before any event is analyzed.
    pub warmup_ticks: u64,
    /// Commands run for an uncertain verdict.
    pub uncertain_commands: Vec<String>,
    /// Commands run for a certain verdict.
    pub certain_commands: Vec<String>,
    /// Emit debug messages.
    pub debug_enabled: bool,
    /// Emit verbose debug messages.
    pub verbose_debug_enabled: bool,
    /// Identities that are never analyzed.
    pub exempt_subjects: HashSet<SubjectId>,
    /// Run the post-kill vitals override check.
    pub exploit_mitigation_enabled: bool,
    /// Turn a triggered anti-knockback counter into an uncertain verdict.
    pub enforce_anti_knockback: bool,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            significant_movement: 0.4,
            strike_timeout_ms: 26_000,
            strike_limit: 1_000,
            miss_threshold: 4,
            max_blackmarks: 4,
            forgiven_on_death: 2,
            blackmarks_timeout_secs: 60,
            warmup_ticks: 70,
            uncertain_commands: vec!["kick {player} [Vigil] Cheating: {reason}".to_string()],
            certain_commands: vec!["tempban {player} 3d [Vigil] Cheating: {reason}".to_string()],
            debug_enabled: false,
            verbose_debug_enabled: false,
            exempt_subjects: HashSet::new(),
            exploit_mitigation_enabled: true,
            enforce_anti_knockback: false,
        }
    }
}

impl HeuristicsConfig {
    /// Parses configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Toml`] for unparseable input and
    /// [`VigilError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> VigilResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`Self::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> VigilResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| VigilError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Rejects values that would make the detector meaningless.
    ///
    /// Malformed command templates are not rejected here; they are logged and
    /// skipped when a verdict is dispatched so the remaining templates still
    /// run.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] naming the offending key.
    pub fn validate(&self) -> VigilResult<()> {
        if self.strike_limit == 0 {
            return Err(VigilError::InvalidConfig("strike_limit must be positive".into()));
        }
        if self.max_blackmarks == 0 {
            return Err(VigilError::InvalidConfig("max_blackmarks must be positive".into()));
        }
        if !self.significant_movement.is_finite() || self.significant_movement < 0.0 {
            return Err(VigilError::InvalidConfig(
                "significant_movement must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Templates for a verdict of the given certainty.
    #[must_use]
    pub fn commands_for(&self, certain: bool) -> &[String] {
        if certain {
            &self.certain_commands
        } else {
            &self.uncertain_commands
        }
    }

    /// Whether the subject is on the exempt list.
    #[must_use]
    pub fn is_exempt(&self, id: SubjectId) -> bool {
        self.exempt_subjects.contains(&id)
    }
}

/// Substitutes `{player}` and `{reason}` into a command template.
///
/// `{{` and `}}` produce literal braces.
///
/// # Errors
///
/// Returns [`VigilError::MalformedTemplate`] for unknown placeholders,
/// unclosed placeholders and stray closing braces.
pub fn render_command(template: &str, player: &str, reason: &str) -> VigilResult<String> {
    let malformed = |position, problem| VigilError::MalformedTemplate {
        template: template.to_string(),
        position,
        problem,
    };

    let mut out = String::with_capacity(template.len() + player.len() + reason.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' if chars.peek().map(|&(_, n)| n) == Some('{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, n) in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(malformed(i, "unclosed placeholder"));
                }
                match name.as_str() {
                    "player" => out.push_str(player),
                    "reason" => out.push_str(reason),
                    _ => return Err(malformed(i, "unknown placeholder")),
                }
            }
            '}' if chars.peek().map(|&(_, n)| n) == Some('}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(malformed(i, "unmatched closing brace")),
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = HeuristicsConfig::from_toml_str("").unwrap();
        assert_eq!(config, HeuristicsConfig::default());
        assert_eq!(config.strike_timeout_ms, 26_000);
        assert_eq!(config.miss_threshold, 4);
    }

    #[test]
    fn test_partial_override() {
        let config = HeuristicsConfig::from_toml_str(
            r#"
            max_blackmarks = 6
            debug_enabled = true
            certain_commands = ["ban {player} {reason}", "say bye"]
            exempt_subjects = ["04e66058-ddf6-4520-93b2-3bc3f675c132"]
            "#,
        )
        .unwrap();

        assert_eq!(config.max_blackmarks, 6);
        assert!(config.debug_enabled);
        assert_eq!(config.commands_for(true).len(), 2);
        assert_eq!(config.commands_for(false), HeuristicsConfig::default().uncertain_commands);
        assert_eq!(config.exempt_subjects.len(), 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = HeuristicsConfig::from_toml_str("max_blackmarks = 0").unwrap_err();
        assert!(matches!(err, VigilError::InvalidConfig(_)));

        let err = HeuristicsConfig::from_toml_str("miss_threshold = \"four\"").unwrap_err();
        assert!(matches!(err, VigilError::Toml(_)));
    }

    #[test]
    fn test_render_command() {
        let cmd = render_command("kick {player} Cheating: {reason}", "Steve", "flight").unwrap();
        assert_eq!(cmd, "kick Steve Cheating: flight");

        let cmd = render_command("say {{literal}} {player}", "Alex", "x").unwrap();
        assert_eq!(cmd, "say {literal} Alex");
    }

    #[test]
    fn test_render_malformed() {
        assert!(matches!(
            render_command("kick {playr}", "a", "b"),
            Err(VigilError::MalformedTemplate { position: 5, .. })
        ));
        assert!(matches!(
            render_command("kick {player", "a", "b"),
            Err(VigilError::MalformedTemplate { problem: "unclosed placeholder", .. })
        ));
        assert!(matches!(
            render_command("kick } now", "a", "b"),
            Err(VigilError::MalformedTemplate { problem: "unmatched closing brace", .. })
        ));
    }
}
