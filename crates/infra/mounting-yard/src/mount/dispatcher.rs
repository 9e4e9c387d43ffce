use crate::endpoint::Credentials;
use crate::platform::common::DEFAULT_NATIVE_SCHEMES;
use std::collections::BTreeSet;
use url::Url;

/// Where a mount request should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Through the async mount primitive, tracked by the registry
    NativeMount,
    /// Handed to the desktop opener, untracked
    ExternalOpen,
}

/// Routes URI schemes to the native mount path or the external opener.
///
/// Stateless apart from the configured scheme set; every scheme it has not been
/// told about goes to [`Route::ExternalOpen`].
#[derive(Debug, Clone)]
pub struct SchemeDispatcher {
    native: BTreeSet<String>,
}

impl Default for SchemeDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_NATIVE_SCHEMES.iter().copied())
    }
}

impl SchemeDispatcher {
    pub fn new<I, S>(native_schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            native: native_schemes
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn route(&self, scheme: &str) -> Route {
        if self.native.contains(&scheme.to_ascii_lowercase()) {
            Route::NativeMount
        } else {
            Route::ExternalOpen
        }
    }

    pub fn native_schemes(&self) -> impl Iterator<Item = &str> {
        self.native.iter().map(String::as_str)
    }
}

/// The URI handed to the external opener: `uri` with the username embedded
/// when one is set and guest mode is off.
pub fn external_uri(uri: &Url, credentials: &Credentials) -> Url {
    let mut updated = uri.clone();
    if let Some(user) = credentials.effective_username()
        && updated.set_username(user).is_err()
    {
        // cannot-be-a-base URIs have nowhere to put a user
        return uri.clone();
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes() {
        let dispatcher = SchemeDispatcher::default();
        for scheme in ["smb", "afp", "cifs", "ftp", "SMB"] {
            assert_eq!(dispatcher.route(scheme), Route::NativeMount, "{scheme}");
        }
        for scheme in ["vnc", "https", "nfs", "", "ssh"] {
            assert_eq!(dispatcher.route(scheme), Route::ExternalOpen, "{scheme}");
        }
    }

    #[test]
    fn test_custom_scheme_set() {
        let dispatcher = SchemeDispatcher::new(["nfs", " ", "SFTP"]);
        assert_eq!(dispatcher.route("nfs"), Route::NativeMount);
        assert_eq!(dispatcher.route("sftp"), Route::NativeMount);
        assert_eq!(dispatcher.route("smb"), Route::ExternalOpen);
        assert_eq!(dispatcher.native_schemes().count(), 2);
    }

    #[test]
    fn test_external_uri_embeds_username() {
        let uri = Url::parse("vnc://desk:5900").unwrap();
        let out = external_uri(&uri, &Credentials::user("bob"));
        assert_eq!(out.as_str(), "vnc://bob@desk:5900");
    }

    #[test]
    fn test_external_uri_guest_or_blank_user_untouched() {
        let uri = Url::parse("vnc://desk").unwrap();

        let mut guest = Credentials::user("bob");
        guest.guest = true;
        assert_eq!(external_uri(&uri, &guest), uri);
        assert_eq!(external_uri(&uri, &Credentials::default()), uri);
    }

    #[test]
    fn test_external_uri_without_authority() {
        let uri = Url::parse("mailto:someone@example.com").unwrap();
        assert_eq!(external_uri(&uri, &Credentials::user("bob")), uri);
    }
}
