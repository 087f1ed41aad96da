use crate::domain::{Address, IssuerId};
use std::collections::HashMap;

use super::EngineError;

/// Two-way mapping between principals and compact issuer ids.
///
/// Ids start at 1, grow by one per registration and are never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuerRegistry {
    ids: HashMap<Address, IssuerId>,
    principals: HashMap<IssuerId, Address>,
    last_id: u16,
}

impl IssuerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted entries and counter.
    pub fn from_parts(last_id: u16, entries: impl IntoIterator<Item = (IssuerId, Address)>) -> Self {
        let mut registry = Self {
            last_id,
            ..Self::default()
        };
        for (id, principal) in entries {
            registry.ids.insert(principal.clone(), id);
            registry.principals.insert(id, principal);
        }
        registry
    }

    pub fn register(&mut self, principal: Address) -> Result<IssuerId, EngineError> {
        if self.ids.contains_key(&principal) {
            return Err(EngineError::IssuerAlreadyRegistered);
        }
        let next = self
            .last_id
            .checked_add(1)
            .ok_or(EngineError::IssuerIdsExhausted)?;
        let id = IssuerId(next);

        self.last_id = next;
        self.ids.insert(principal.clone(), id);
        self.principals.insert(id, principal);
        Ok(id)
    }

    pub fn issuer_id(&self, principal: &Address) -> Option<IssuerId> {
        self.ids.get(principal).copied()
    }

    pub fn principal(&self, id: IssuerId) -> Option<&Address> {
        self.principals.get(&id)
    }

    pub fn last_id(&self) -> u16 {
        self.last_id
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}
