//! Where newsw is printing to, and whether it may ask questions there

use crate::error::{NewswError, NewswResult};
use console::style;
use std::io::IsTerminal;

/// Variables set by CI runners; any of them means nobody is watching
const CI_MARKERS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

/// Output mode for one command invocation.
///
/// Fancy mode draws cliclack steps, spinners and the precache bar. Plain
/// mode prints tagged lines that stay readable in logs and pipes.
#[derive(Debug, Clone, Copy)]
pub struct Terminal {
    fancy: bool,
    assume_yes: bool,
}

impl Terminal {
    pub fn detect() -> Self {
        let ttys = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();
        Self {
            fancy: fancy_for(ttys, |name| std::env::var(name).ok()),
            assume_yes: false,
        }
    }

    /// Plain output, prompts decline
    pub fn plain() -> Self {
        Self {
            fancy: false,
            assume_yes: false,
        }
    }

    /// Answer yes to every removal prompt (`--yes`)
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn is_fancy(&self) -> bool {
        self.fancy
    }

    /// List the cache stores about to be removed and ask before removing them.
    ///
    /// Without a terminal to ask on, and without `--yes`, the answer is no.
    pub async fn confirm_removal(&self, action: &str, stores: &[String]) -> NewswResult<bool> {
        if !stores.is_empty() {
            println!("{} will remove {} cache store(s):", action, stores.len());
            for name in stores {
                println!("  {} {}", style("•").red(), name);
            }
            println!();
        }

        if self.assume_yes {
            return Ok(true);
        }
        if !self.fancy {
            return Ok(false);
        }

        // cliclack reads stdin synchronously
        let question = format!("{}?", action);
        tokio::task::spawn_blocking(move || {
            cliclack::confirm(question).initial_value(false).interact()
        })
        .await
        .map_err(|e| NewswError::Internal(format!("confirmation prompt panicked: {}", e)))?
        .map_err(|e| NewswError::User(format!("Confirmation cancelled: {}", e)))
    }
}

/// Fancy output needs both ends on a TTY and no opt-out in the environment
fn fancy_for(ttys: bool, env: impl Fn(&str) -> Option<String>) -> bool {
    if !ttys || env("NEWSW_PLAIN").is_some() {
        return false;
    }
    if env("TERM").as_deref() == Some("dumb") {
        return false;
    }
    !CI_MARKERS.iter().any(|name| env(name).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn fancy_only_on_quiet_tty() {
        assert!(fancy_for(true, env_with(&[("TERM", "xterm-256color")])));
        assert!(!fancy_for(false, env_with(&[])));
        assert!(!fancy_for(true, env_with(&[("TERM", "dumb")])));
        assert!(!fancy_for(true, env_with(&[("GITHUB_ACTIONS", "true")])));
    }

    #[test]
    #[serial_test::serial]
    fn plain_env_disables_fancy_output() {
        std::env::set_var("NEWSW_PLAIN", "1");
        assert!(!Terminal::detect().is_fancy());
        std::env::remove_var("NEWSW_PLAIN");
    }

    #[tokio::test]
    async fn removal_declined_without_terminal() {
        let stores = vec!["news-v0".to_string()];
        assert!(!Terminal::plain()
            .confirm_removal("Clearing caches", &stores)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn removal_assumed_with_yes() {
        let stores = vec!["news-v0".to_string(), "news-v1".to_string()];
        assert!(Terminal::plain()
            .assume_yes(true)
            .confirm_removal("Clearing caches", &stores)
            .await
            .unwrap());
    }
}
