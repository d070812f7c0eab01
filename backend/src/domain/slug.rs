//! Slug derivation for organizations and public campaign links.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of generated public campaign slugs.
pub const PUBLIC_SLUG_LEN: usize = 12;

/// Derive a URL slug from a display name.
///
/// Lowercases the input, drops every character that is not an ASCII letter,
/// digit, underscore, or space, then turns each run of spaces into one `-`.
/// Leading and trailing spaces therefore yield leading and trailing dashes,
/// matching how existing organization slugs were produced.
///
/// # Examples
/// ```
/// use orgdesk::domain::slugify;
///
/// assert_eq!(slugify("Acme Corp!"), "acme-corp");
/// assert_eq!(slugify("R&D  Team_2"), "rd-team_2");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space_run = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch == ' ' {
            if !in_space_run {
                slug.push('-');
            }
            in_space_run = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            slug.push(ch);
            in_space_run = false;
        }
    }
    slug
}

/// Return `true` when `slug` carries at least one letter, digit, or underscore.
#[must_use]
pub fn is_meaningful_slug(slug: &str) -> bool {
    slug.chars().any(|ch| ch != '-')
}

/// Generate an unguessable lowercase slug for a public campaign link.
#[must_use]
pub fn generate_public_slug<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(PUBLIC_SLUG_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    #[rstest]
    #[case("Acme", "acme")]
    #[case("Acme Corp", "acme-corp")]
    #[case("Acme   Corp", "acme-corp")]
    #[case("Ünïcode Org", "ncode-org")]
    #[case("  padded  ", "-padded-")]
    #[case("snake_case name", "snake_case-name")]
    #[case("!!!", "")]
    fn slugify_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[rstest]
    fn names_differing_only_in_punctuation_collide() {
        assert_eq!(slugify("Acme, Inc."), slugify("acme inc"));
    }

    #[rstest]
    #[case("", false)]
    #[case("--", false)]
    #[case("a-", true)]
    fn meaningful_slug(#[case] slug: &str, #[case] expected: bool) {
        assert_eq!(is_meaningful_slug(slug), expected);
    }

    #[rstest]
    fn public_slugs_are_lowercase_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(7);
        let slug = generate_public_slug(&mut rng);
        assert_eq!(slug.len(), PUBLIC_SLUG_LEN);
        assert!(
            slug.chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        );
    }
}
