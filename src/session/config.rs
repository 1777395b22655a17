/// Routes and provider names the resolver needs from its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub sponsor_landing: String,
    pub builder_landing: String,
    pub public_landing: String,
    /// Identities from this provider get a builder profile provisioned on first sign-in.
    pub oauth_provider: String,
    pub oauth_redirect_to: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            sponsor_landing: "/sponsor".into(),
            builder_landing: "/dashboard".into(),
            public_landing: "/".into(),
            oauth_provider: "github".into(),
            oauth_redirect_to: None,
        }
    }
}
