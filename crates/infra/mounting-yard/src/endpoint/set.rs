use super::types::{Credentials, Endpoint, EndpointId};
use crate::error::{Result, YardError};
use crate::utils::paths::sanitize_file_name;
use std::collections::BTreeMap;

/// The active set of endpoints. Owns every [`Endpoint`]; everything else refers
/// to them by [`EndpointId`].
#[derive(Debug, Default)]
pub struct EndpointSet {
    endpoints: BTreeMap<EndpointId, Endpoint>,
    next_id: u64,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint. Names must be unique within the set and usable
    /// unchanged as a file name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        address: impl Into<String>,
        credentials: Credentials,
    ) -> Result<EndpointId> {
        let name = validate_name(name.into())?;
        if self.id_of(&name).is_some() {
            return Err(YardError::DuplicateEndpoint { name });
        }

        self.next_id += 1;
        let id = EndpointId(self.next_id);
        self.endpoints
            .insert(id, Endpoint::new(id, name, address.into(), credentials));
        Ok(id)
    }

    pub fn get(&self, id: EndpointId) -> Option<&Endpoint> {
        self.endpoints.get(&id)
    }

    pub fn get_mut(&mut self, id: EndpointId) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(&id)
    }

    pub fn id_of(&self, name: &str) -> Option<EndpointId> {
        self.endpoints
            .values()
            .find(|e| e.name() == name)
            .map(Endpoint::id)
    }

    /// Resolve a name, failing with [`YardError::EndpointNotFound`]
    pub fn require(&self, name: &str) -> Result<EndpointId> {
        self.id_of(name).ok_or_else(|| YardError::EndpointNotFound {
            name: name.to_string(),
        })
    }

    /// Drop an endpoint from the set. Callers holding in-flight requests for it
    /// must cancel them first (see `MountOrchestrator::remove_endpoint`).
    pub fn remove(&mut self, id: EndpointId) -> Option<Endpoint> {
        self.endpoints.remove(&id)
    }

    pub fn rename(&mut self, id: EndpointId, new_name: impl Into<String>) -> Result<()> {
        let new_name = validate_name(new_name.into())?;
        if let Some(existing) = self.id_of(&new_name) {
            if existing == id {
                return Ok(());
            }
            return Err(YardError::DuplicateEndpoint { name: new_name });
        }

        let endpoint = self
            .endpoints
            .get_mut(&id)
            .ok_or_else(|| YardError::EndpointNotFound {
                name: id.to_string(),
            })?;
        endpoint.set_name(new_name);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Endpoint> {
        self.endpoints.values_mut()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Each name maps to exactly one endpoint file, so it must already be its own
/// file stem.
fn validate_name(name: String) -> Result<String> {
    if sanitize_file_name(&name) == name {
        Ok(name)
    } else {
        Err(YardError::InvalidName { name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicate_names() {
        let mut set = EndpointSet::new();
        set.insert("nas", "smb://nas/share", Credentials::default())
            .unwrap();

        let err = set
            .insert("nas", "afp://other/share", Credentials::default())
            .unwrap_err();
        assert!(matches!(err, YardError::DuplicateEndpoint { name } if name == "nas"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let mut set = EndpointSet::new();
        let first = set.insert("a", "smb://a/s", Credentials::default()).unwrap();
        set.remove(first);
        let second = set.insert("a", "smb://a/s", Credentials::default()).unwrap();
        assert_ne!(first, second);
        assert!(set.get(first).is_none());
    }

    #[test]
    fn test_rename() {
        let mut set = EndpointSet::new();
        let a = set.insert("a", "smb://a/s", Credentials::default()).unwrap();
        set.insert("b", "smb://b/s", Credentials::default()).unwrap();

        assert!(set.rename(a, "b").is_err());
        set.rename(a, "a").unwrap();
        set.rename(a, "c").unwrap();
        assert_eq!(set.id_of("c"), Some(a));
        assert!(set.id_of("a").is_none());
    }

    #[test]
    fn test_names_must_be_file_stems() {
        let mut set = EndpointSet::new();
        for name in ["a/b", "x:y", " padded", "", "..", "what?"] {
            let err = set
                .insert(name, "smb://a/s", Credentials::default())
                .unwrap_err();
            assert!(matches!(err, YardError::InvalidName { .. }), "{name:?}");
        }
        assert!(set.is_empty());

        let id = set
            .insert("Office NAS", "smb://a/s", Credentials::default())
            .unwrap();
        let err = set.rename(id, "Office/NAS").unwrap_err();
        assert!(matches!(err, YardError::InvalidName { .. }));
        assert_eq!(set.id_of("Office NAS"), Some(id));
    }

    #[test]
    fn test_require_reports_missing_name() {
        let set = EndpointSet::new();
        let err = set.require("ghost").unwrap_err();
        assert_eq!(err.to_string(), "Endpoint not found: ghost");
    }
}
