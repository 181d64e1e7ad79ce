//! Public configuration for the S3 client.

/// Configuration for the S3 client.
///
/// Anything left unset falls back to the AWS default chain (environment,
/// shared config files, instance metadata).
///
/// # Example
///
/// ```
/// use s3pd_s3::S3ClientConfig;
///
/// let config = S3ClientConfig::new()
///     .with_region("eu-west-1")
///     .with_endpoint_url("http://localhost:9000")
///     .with_force_path_style(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3ClientConfig {
    /// Region override
    pub(crate) region: Option<String>,
    /// Custom endpoint for S3-compatible stores
    pub(crate) endpoint_url: Option<String>,
    /// Use `https://host/bucket/key` instead of virtual-hosted addressing
    pub(crate) force_path_style: bool,
    /// Named profile from the shared config files
    pub(crate) profile: Option<String>,
}

impl S3ClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint URL.
    #[must_use]
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Force path-style addressing.
    ///
    /// Most self-hosted S3-compatible stores need this.
    #[must_use]
    pub const fn with_force_path_style(mut self, force: bool) -> Self {
        self.force_path_style = force;
        self
    }

    /// Use a named profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Region override, if any.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Endpoint override, if any.
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// Profile override, if any.
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Whether path-style addressing is forced.
    pub const fn force_path_style(&self) -> bool {
        self.force_path_style
    }
}
