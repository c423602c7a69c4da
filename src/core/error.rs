//! Error types for release-train with contextual messages and exit codes
//!
//! One unified error type categorises failures across the workflow: config
//! loading, git subprocess calls, version arithmetic, workflow preconditions,
//! and hosting provider APIs. Errors carry an optional help message shown to
//! the user next to the failure itself.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for release-train
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid version strings)
  User = 1,
  /// System error (git, network, I/O, provider APIs)
  System = 2,
  /// Workflow precondition failure (wrong branch, nothing to release)
  Validation = 3,
}

impl ExitCode {
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-train
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Semantic version errors
  Version(VersionError),

  /// Workflow precondition violations
  Workflow(WorkflowError),

  /// Hosting provider API errors
  Provider(ProviderError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Version(_) => ExitCode::User,
      ReleaseError::Git(_) => ExitCode::System,
      ReleaseError::Provider(_) => ExitCode::System,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Workflow(_) => ExitCode::Validation,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Workflow(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Version(e) => write!(f, "{}", e),
      ReleaseError::Workflow(e) => write!(f, "{}", e),
      ReleaseError::Provider(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<GitError> for ReleaseError {
  fn from(err: GitError) -> Self {
    ReleaseError::Git(err)
  }
}

impl From<VersionError> for ReleaseError {
  fn from(err: VersionError) -> Self {
    ReleaseError::Version(err)
  }
}

impl From<WorkflowError> for ReleaseError {
  fn from(err: WorkflowError) -> Self {
    ReleaseError::Workflow(err)
  }
}

impl From<ProviderError> for ReleaseError {
  fn from(err: ProviderError) -> Self {
    ReleaseError::Provider(err)
  }
}

impl From<serde_yaml::Error> for ReleaseError {
  fn from(err: serde_yaml::Error) -> Self {
    ReleaseError::Config(ConfigError::Parse {
      message: err.to_string(),
    })
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ReleaseError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ReleaseError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Convert anyhow::Error to ReleaseError (for ad-hoc errors)
impl From<anyhow::Error> for ReleaseError {
  fn from(err: anyhow::Error) -> Self {
    ReleaseError::message(err.to_string())
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Configuration file not found
  NotFound { path: PathBuf },

  /// Configuration file could not be parsed
  Parse { message: String },

  /// Configuration is structurally valid but violates a constraint
  Invalid { message: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create a release-train.yaml in the repository root, or pass --config <path>.".to_string())
      }
      ConfigError::Invalid { .. } => {
        Some("'release-rules' must map at least one of major/minor/patch to a list of commit types.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Configuration file not found: {}", path.display())
      }
      ConfigError::Parse { message } => {
        write!(f, "Failed to parse configuration: {}", message)
      }
      ConfigError::Invalid { message } => {
        write!(f, "Invalid configuration: {}", message)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command exited non-zero
  CommandFailed { command: String, stderr: String },

  /// Invoked outside a git repository
  NotARepository,

  /// The git executable is missing from PATH
  GitNotFound,

  /// A branch name was required but HEAD is detached
  DetachedHead,
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::NotARepository => Some("Run this command from within a git repository (git init to create one).".to_string()),
      GitError::GitNotFound => Some("Install git and make sure it is on your PATH.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::NotARepository => {
        write!(f, "Not in a git repository")
      }
      GitError::GitNotFound => {
        write!(f, "Git not found. Please ensure git is installed.")
      }
      GitError::DetachedHead => {
        write!(f, "Unable to determine current branch (detached HEAD?)")
      }
    }
  }
}

/// Semantic version errors
#[derive(Debug)]
pub struct VersionError {
  pub message: String,
}

impl VersionError {
  pub fn new(message: impl Into<String>) -> Self {
    Self { message: message.into() }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Version error: {}", self.message)
  }
}

/// Workflow-level precondition violations
#[derive(Debug)]
pub struct WorkflowError {
  pub message: String,
  pub help: Option<String>,
}

impl WorkflowError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      help: None,
    }
  }

  pub fn with_help(mut self, help: impl Into<String>) -> Self {
    self.help = Some(help.into());
    self
  }

  fn help_message(&self) -> Option<String> {
    self.help.clone()
  }
}

impl fmt::Display for WorkflowError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message)
  }
}

/// Hosting provider API errors, one variant per provider
#[derive(Debug)]
pub enum ProviderError {
  GitHub { message: String },
  AzureDevOps { message: String },
  GitLab { message: String },
}

impl fmt::Display for ProviderError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProviderError::GitHub { message } => write!(f, "GitHub: {}", message),
      ProviderError::AzureDevOps { message } => write!(f, "Azure DevOps: {}", message),
      ProviderError::GitLab { message } => write!(f, "GitLab: {}", message),
    }
  }
}

/// Result type alias for release-train
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
