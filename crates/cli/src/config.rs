//! Resolved client settings.

use std::ffi::{OsStr, OsString};

/// Program used for local-to-local copies when `OC_SCP_CP` is unset.
pub const DEFAULT_LOCAL_COPY_PROGRAM: &str = "cp";

/// Environment variable naming the default remote shell.
pub const RSH_ENV: &str = "OC_SCP_RSH";

/// Environment variable naming the local copy program.
pub const CP_ENV: &str = "OC_SCP_CP";

/// Settings for one `oc-scp` invocation.
///
/// Built through [`ClientConfig::builder`] once command-line options and
/// environment defaults have been merged.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    source: OsString,
    destination: OsString,
    recursive: bool,
    port: Option<u16>,
    identity: Option<OsString>,
    ssh_options: Vec<OsString>,
    remote_shell: Option<OsString>,
    batch_mode: bool,
    local_copy_program: OsString,
    verbosity: u8,
    quiet: bool,
}

impl ClientConfig {
    /// Returns a builder with recursion enabled and every other option unset.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Operand copied from.
    #[must_use]
    pub fn source(&self) -> &OsStr {
        &self.source
    }

    /// Operand copied to.
    #[must_use]
    pub fn destination(&self) -> &OsStr {
        &self.destination
    }

    /// Whether directories may be copied.
    #[must_use]
    pub const fn recursive(&self) -> bool {
        self.recursive
    }

    /// Remote port, when overridden.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Identity file handed to ssh.
    #[must_use]
    pub fn identity(&self) -> Option<&OsStr> {
        self.identity.as_deref()
    }

    /// Values passed to ssh through `-o`.
    #[must_use]
    pub fn ssh_options(&self) -> &[OsString] {
        &self.ssh_options
    }

    /// Remote shell specification replacing plain `ssh`.
    #[must_use]
    pub fn remote_shell(&self) -> Option<&OsStr> {
        self.remote_shell.as_deref()
    }

    /// Whether ssh runs with `BatchMode=yes`.
    #[must_use]
    pub const fn batch_mode(&self) -> bool {
        self.batch_mode
    }

    /// Program (with optional arguments) used for local-to-local copies.
    #[must_use]
    pub fn local_copy_program(&self) -> &OsStr {
        &self.local_copy_program
    }

    /// Number of `-v` flags.
    #[must_use]
    pub const fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Whether progress and informational output are suppressed.
    #[must_use]
    pub const fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
    source: OsString,
    destination: OsString,
    recursive: bool,
    port: Option<u16>,
    identity: Option<OsString>,
    ssh_options: Vec<OsString>,
    remote_shell: Option<OsString>,
    batch_mode: bool,
    local_copy_program: Option<OsString>,
    verbosity: u8,
    quiet: bool,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            source: OsString::new(),
            destination: OsString::new(),
            recursive: true,
            port: None,
            identity: None,
            ssh_options: Vec::new(),
            remote_shell: None,
            batch_mode: false,
            local_copy_program: None,
            verbosity: 0,
            quiet: false,
        }
    }
}

impl ClientConfigBuilder {
    /// Sets the two operands.
    #[must_use]
    pub fn operands(mut self, source: impl Into<OsString>, destination: impl Into<OsString>) -> Self {
        self.source = source.into();
        self.destination = destination.into();
        self
    }

    /// Enables or disables directory copies.
    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Overrides the remote port.
    #[must_use]
    pub const fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Sets the identity file handed to ssh.
    #[must_use]
    pub fn identity(mut self, identity: Option<OsString>) -> Self {
        self.identity = identity;
        self
    }

    /// Sets the values passed to ssh through `-o`.
    #[must_use]
    pub fn ssh_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.ssh_options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the remote shell. An empty value counts as unset.
    #[must_use]
    pub fn remote_shell(mut self, shell: Option<OsString>) -> Self {
        self.remote_shell = shell.filter(|value| !value.is_empty());
        self
    }

    /// Uses `shell` only when no remote shell has been set yet.
    #[must_use]
    pub fn remote_shell_fallback(mut self, shell: Option<OsString>) -> Self {
        if self.remote_shell.is_none() {
            self.remote_shell = shell.filter(|value| !value.is_empty());
        }
        self
    }

    /// Enables `BatchMode=yes`.
    #[must_use]
    pub const fn batch_mode(mut self, enabled: bool) -> Self {
        self.batch_mode = enabled;
        self
    }

    /// Sets the local copy program. An empty value counts as unset.
    #[must_use]
    pub fn local_copy_program(mut self, program: Option<OsString>) -> Self {
        self.local_copy_program = program.filter(|value| !value.is_empty());
        self
    }

    /// Sets the `-v` count.
    #[must_use]
    pub const fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Suppresses progress and informational output.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Finalises the builder and constructs a [`ClientConfig`].
    #[must_use]
    pub fn build(self) -> ClientConfig {
        ClientConfig {
            source: self.source,
            destination: self.destination,
            recursive: self.recursive,
            port: self.port,
            identity: self.identity,
            ssh_options: self.ssh_options,
            remote_shell: self.remote_shell,
            batch_mode: self.batch_mode,
            local_copy_program: self
                .local_copy_program
                .unwrap_or_else(|| OsString::from(DEFAULT_LOCAL_COPY_PROGRAM)),
            verbosity: self.verbosity,
            quiet: self.quiet,
        }
    }
}
