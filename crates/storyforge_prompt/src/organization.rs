//! Organization presets and their artist tags.

use std::str::FromStr;

/// Artist tags injected into prompts for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArtistTags {
    /// Tags for the character and scene prompts
    pub base: &'static str,
    /// Tags leading each refinement prompt
    pub hires: &'static str,
}

/// Organizations with a dedicated artist tag set.
///
/// Any other style name (such as `Realistic`) has no tags.
///
/// # Examples
///
/// ```
/// use storyforge_prompt::Organization;
///
/// let tags = Organization::artist_tags("meitabu");
/// assert_eq!(tags.base, "(suyasuyabi,ratatatat74)");
///
/// let none = Organization::artist_tags("Realistic");
/// assert!(none.base.is_empty() && none.hires.is_empty());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Organization {
    /// `lovehent`
    Lovehent,
    /// `meitabu`
    Meitabu,
    /// `project3`
    Project3,
}

impl Organization {
    /// Tags for this organization.
    pub fn tags(self) -> ArtistTags {
        match self {
            Organization::Lovehent => ArtistTags {
                base: "mdf_an,ratatatat74",
                hires: "mdf_an,artist:quasarcake",
            },
            Organization::Meitabu => ArtistTags {
                base: "(suyasuyabi,ratatatat74)",
                hires: "(suyasuyabi,dross,(ratatatat74:0.5))",
            },
            Organization::Project3 => ArtistTags {
                base: "proj3 patreon",
                hires: "",
            },
        }
    }

    /// Tags for a style name, empty when the style is not an organization.
    pub fn artist_tags(style: &str) -> ArtistTags {
        Organization::from_str(style)
            .map(Organization::tags)
            .unwrap_or_default()
    }
}
