//! Owner/name extraction from user-supplied repository links.
//!
//! Accepts full URLs, scheme-less `github.com/...` forms, and anything that
//! ends in an `owner/name` fragment. Parsing is purely lexical and never
//! touches the network.

use super::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(reference: &str) -> Result<Self, FetchError> {
        let cleaned = reference.trim().trim_end_matches('/');

        let path = if let Some(rest) = cleaned.strip_prefix("https://github.com/") {
            rest
        } else if let Some(rest) = cleaned.strip_prefix("github.com/") {
            rest
        } else {
            cleaned
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(FetchError::InvalidReferenceFormat);
        }

        // For unrecognized prefixes, the last two segments are the pair
        let owner = segments[segments.len() - 2];
        let mut name = segments[segments.len() - 1];

        // Source-archive suffix is not part of the repository name
        if let Some(stripped) = name.strip_suffix(".git") {
            name = stripped;
        }

        if owner.is_empty() || name.is_empty() {
            return Err(FetchError::InvalidReferenceFormat);
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_url() {
        let r = RepoRef::parse("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(r.owner, "rust-lang");
        assert_eq!(r.name, "rust");
    }

    #[test]
    fn parses_schemeless_url() {
        let r = RepoRef::parse("github.com/acme/widget").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.name, "widget");
    }

    #[test]
    fn parses_bare_pair() {
        let r = RepoRef::parse("acme/widget").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.name, "widget");
    }

    #[test]
    fn takes_last_two_segments_of_unknown_form() {
        let r = RepoRef::parse("git@github.com:mirrors/deep/acme/widget").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.name, "widget");
    }

    #[test]
    fn strips_git_suffix() {
        let r = RepoRef::parse("https://github.com/acme/widget.git").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.name, "widget");
    }

    #[test]
    fn strips_whitespace_and_trailing_slash() {
        let r = RepoRef::parse("  https://github.com/acme/widget/  ").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.name, "widget");
    }

    #[test]
    fn rejects_single_segment() {
        assert_eq!(
            RepoRef::parse("https://github.com/onlyowner"),
            Err(FetchError::InvalidReferenceFormat)
        );
    }

    #[test]
    fn rejects_empty_and_bare_host() {
        assert_eq!(RepoRef::parse(""), Err(FetchError::InvalidReferenceFormat));
        assert_eq!(
            RepoRef::parse("github.com/"),
            Err(FetchError::InvalidReferenceFormat)
        );
    }

    #[test]
    fn display_is_owner_slash_name() {
        let r = RepoRef::parse("acme/widget").unwrap();
        assert_eq!(r.to_string(), "acme/widget");
    }
}
