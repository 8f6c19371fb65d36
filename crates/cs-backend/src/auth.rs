//! Read-only sources of the bearer token attached to chat requests.

use std::path::PathBuf;
use std::process::Command;

/// Supplies the current auth token, if any.
///
/// Called once per request. Implementations never modify stored credentials.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let token = raw.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// A fixed token, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(non_empty(&token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Token read from an environment variable at request time.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenProvider for EnvToken {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok().as_deref().and_then(non_empty)
    }
}

/// Token stored in a file written by a separate login flow.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenProvider for FileToken {
    fn token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => non_empty(&contents),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "token file unreadable");
                None
            }
        }
    }
}

/// Token printed on stdout by a shell command, run via `sh -c`.
#[derive(Debug, Clone)]
pub struct CommandToken {
    command: String,
}

impl CommandToken {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl TokenProvider for CommandToken {
    fn token(&self) -> Option<String> {
        let output = match Command::new("sh").arg("-c").arg(&self.command).output() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "failed to run token command");
                return None;
            }
        };

        if !output.status.success() {
            tracing::warn!(status = %output.status, "token command failed");
            return None;
        }
        non_empty(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Tries each provider in order and returns the first token found.
#[derive(Default)]
pub struct TokenChain {
    providers: Vec<Box<dyn TokenProvider>>,
}

impl TokenChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl TokenProvider for TokenChain {
    fn token(&self) -> Option<String> {
        self.providers.iter().find_map(|p| p.token())
    }
}
