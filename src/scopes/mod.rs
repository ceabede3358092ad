//! Gmail OAuth scope vocabulary
//!
//! The scope catalogue is fixed at build time: seven short names, each
//! mapped to exactly one canonical Google authorization URL. The mapping is
//! a bijection; the resolver in [`resolver`] handles translation,
//! satisfaction checks, and free-text parsing over this vocabulary.

pub mod resolver;

pub use resolver::{
    is_authorized, known_names, parse, to_name, to_url, to_urls, validate, ScopeValidation,
};

/// A Gmail OAuth scope recognized by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Read-only access to messages and metadata
    Readonly,

    /// Read/write access to messages and labels (everything but delete)
    Modify,

    /// Create and send drafts
    Compose,

    /// Send messages only
    Send,

    /// Manage labels
    Labels,

    /// Manage basic mail settings (filters among them)
    SettingsBasic,

    /// Manage sensitive mail settings (forwarding, delegation)
    SettingsSharing,
}

impl Scope {
    /// Every known scope, in definition order.
    pub const ALL: [Scope; 7] = [
        Scope::Readonly,
        Scope::Modify,
        Scope::Compose,
        Scope::Send,
        Scope::Labels,
        Scope::SettingsBasic,
        Scope::SettingsSharing,
    ];

    /// Short name used in configuration and CLI input.
    pub fn name(self) -> &'static str {
        match self {
            Scope::Readonly => "gmail.readonly",
            Scope::Modify => "gmail.modify",
            Scope::Compose => "gmail.compose",
            Scope::Send => "gmail.send",
            Scope::Labels => "gmail.labels",
            Scope::SettingsBasic => "gmail.settings.basic",
            Scope::SettingsSharing => "gmail.settings.sharing",
        }
    }

    /// Canonical authorization-server URL for this scope.
    pub fn url(self) -> &'static str {
        match self {
            Scope::Readonly => "https://www.googleapis.com/auth/gmail.readonly",
            Scope::Modify => "https://www.googleapis.com/auth/gmail.modify",
            Scope::Compose => "https://www.googleapis.com/auth/gmail.compose",
            Scope::Send => "https://www.googleapis.com/auth/gmail.send",
            Scope::Labels => "https://www.googleapis.com/auth/gmail.labels",
            Scope::SettingsBasic => "https://www.googleapis.com/auth/gmail.settings.basic",
            Scope::SettingsSharing => "https://www.googleapis.com/auth/gmail.settings.sharing",
        }
    }

    /// Look up a scope by short name.
    pub fn from_name(name: &str) -> Option<Scope> {
        Scope::ALL.iter().copied().find(|s| s.name() == name)
    }

    /// Look up a scope by canonical URL.
    pub fn from_url(url: &str) -> Option<Scope> {
        Scope::ALL.iter().copied().find(|s| s.url() == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_name_url_bijection() {
        for scope in Scope::ALL {
            assert_eq!(Scope::from_url(scope.url()), Some(scope));
            assert_eq!(Scope::from_name(scope.name()), Some(scope));
        }
    }

    #[test]
    fn test_no_two_names_share_a_url() {
        let urls: HashSet<&str> = Scope::ALL.iter().map(|s| s.url()).collect();
        assert_eq!(urls.len(), Scope::ALL.len());

        let names: HashSet<&str> = Scope::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), Scope::ALL.len());
    }

    #[test]
    fn test_url_shape() {
        for scope in Scope::ALL {
            let expected = format!("https://www.googleapis.com/auth/{}", scope.name());
            assert_eq!(scope.url(), expected);
        }
    }

    #[test]
    fn test_unknown_lookups() {
        assert_eq!(Scope::from_name("not.a.scope"), None);
        assert_eq!(Scope::from_url("https://unknown"), None);
        // Names and URLs are separate keyspaces
        assert_eq!(Scope::from_name(Scope::Modify.url()), None);
        assert_eq!(Scope::from_url(Scope::Modify.name()), None);
    }
}
