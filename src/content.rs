//! Content Resolution - Remote content layered over required defaults.
//!
//! Every section renders from a complete value. Remote content (a CMS
//! document) is optional and partial; whatever it leaves out, or any failure
//! to fetch it, falls back to the defaults.
//!
//! ```text
//! remote: Err(_)        ──┐
//! remote: Ok(None)      ──┼──▶ defaults
//! remote: Ok(Some(part))──┴──▶ defaults.layer(part)
//! ```
//!
//! Fetch errors are logged and never surfaced.

use std::fmt::Display;

use serde::Deserialize;

use crate::error::Result;

// =============================================================================
// Layering
// =============================================================================

/// A content type with a partial form that can be merged over it.
pub trait Layered: Clone {
    type Overrides;

    /// `self` with every present, non-empty override applied.
    fn layer(&self, overrides: Self::Overrides) -> Self;
}

/// Resolve remote content against defaults.
///
/// "No data" and "fetch failed" are treated the same.
pub fn resolve<T, E>(remote: std::result::Result<Option<T::Overrides>, E>, defaults: &T) -> T
where
    T: Layered,
    E: Display,
{
    match remote {
        Ok(Some(overrides)) => defaults.layer(overrides),
        Ok(None) => {
            tracing::debug!("no remote content, using defaults");
            defaults.clone()
        }
        Err(err) => {
            tracing::warn!(error = %err, "fetching content failed, using defaults");
            defaults.clone()
        }
    }
}

/// Present and not blank.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn pick(value: Option<String>, fallback: &str) -> String {
    non_empty(value).unwrap_or_else(|| fallback.to_string())
}

fn pick_opt(value: Option<String>, fallback: &Option<String>) -> Option<String> {
    non_empty(value).or_else(|| fallback.clone())
}

// =============================================================================
// Hero
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SocialLinks {
    pub github: String,
    pub linkedin: String,
    pub twitter: Option<String>,
    pub email: Option<String>,
}

/// Everything the hero section renders. The roles feed the typewriter.
#[derive(Debug, Clone, PartialEq)]
pub struct HeroContent {
    pub name: String,
    pub greeting: String,
    pub roles: Vec<String>,
    pub bio: String,
    pub resume_url: String,
    pub social_links: SocialLinks,
}

impl Default for HeroContent {
    fn default() -> Self {
        Self {
            name: "Virtus Dakura".to_string(),
            greeting: "Hello, I'm".to_string(),
            roles: vec![
                "Full-Stack Developer".to_string(),
                "Software Engineer".to_string(),
            ],
            bio: "Passionate software engineer crafting innovative solutions with modern \
                  technologies. I build scalable applications and love solving complex \
                  problems through clean, efficient code."
                .to_string(),
            resume_url: "/resume.pdf".to_string(),
            social_links: SocialLinks {
                github: "https://github.com/VirtusDakura".to_string(),
                linkedin: "https://linkedin.com/in/virtus-dakura".to_string(),
                twitter: None,
                email: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinksOverrides {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssetRef {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileRef {
    pub asset: Option<AssetRef>,
}

/// Hero document as delivered by the CMS. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroOverrides {
    pub name: Option<String>,
    pub greeting: Option<String>,
    pub roles: Option<Vec<String>>,
    pub bio: Option<String>,
    pub resume_file: Option<FileRef>,
    pub social_links: Option<SocialLinksOverrides>,
}

impl HeroOverrides {
    /// Parse a CMS response body. A JSON `null` means "no document".
    pub fn from_json(body: &str) -> Result<Option<Self>> {
        Ok(serde_json::from_str(body)?)
    }

    fn resume_url(&self) -> Option<String> {
        self.resume_file
            .as_ref()
            .and_then(|f| f.asset.as_ref())
            .and_then(|a| a.url.clone())
    }
}

impl Layered for HeroContent {
    type Overrides = HeroOverrides;

    fn layer(&self, overrides: HeroOverrides) -> Self {
        let resume_url = overrides.resume_url();

        // Only a list with at least one non-blank role replaces the defaults
        let roles = overrides
            .roles
            .map(|roles| {
                roles
                    .into_iter()
                    .filter(|r| !r.trim().is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|roles| !roles.is_empty())
            .unwrap_or_else(|| self.roles.clone());

        let links = overrides.social_links.unwrap_or_default();
        let social_links = SocialLinks {
            github: pick(links.github, &self.social_links.github),
            linkedin: pick(links.linkedin, &self.social_links.linkedin),
            twitter: pick_opt(links.twitter, &self.social_links.twitter),
            email: pick_opt(links.email, &self.social_links.email),
        };

        Self {
            name: pick(overrides.name, &self.name),
            greeting: pick(overrides.greeting, &self.greeting),
            roles,
            bio: pick(overrides.bio, &self.bio),
            resume_url: pick(resume_url, &self.resume_url),
            social_links,
        }
    }
}
