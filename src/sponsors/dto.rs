use serde::Deserialize;

/// Sponsor registration form. The email always comes from the signed-in identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SponsorRegistration {
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}
