//! Keys for the local key-value store

use crate::domain::team::TeamId;

/// Namespace of a record in the shared local store. Each subsystem gets its own
/// variant so its keys can never collide with another's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbKeyType {
    TeamChainState,
}

impl DbKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeamChainState => "team_chain_state",
        }
    }
}

/// Typed key into the local store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbKey {
    pub typ: DbKeyType,
    pub key: String,
}

impl DbKey {
    pub fn team_chain_state(team_id: &TeamId) -> Self {
        Self {
            typ: DbKeyType::TeamChainState,
            key: format!("tid:{}", team_id),
        }
    }

    /// Flat string form used by raw stores
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.typ.as_str(), self.key)
    }
}

impl std::fmt::Display for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_chain_state_key() {
        let id = TeamId::new("0123456789abcdef0123456789abcd24").unwrap();
        let key = DbKey::team_chain_state(&id);
        assert_eq!(
            key.to_raw(),
            "team_chain_state:tid:0123456789abcdef0123456789abcd24"
        );
    }

    #[test]
    fn test_distinct_teams_distinct_keys() {
        let a = TeamId::new("0123456789abcdef0123456789abcd24").unwrap();
        let b = TeamId::new("0123456789abcdef0123456789abcd25").unwrap();
        assert_ne!(
            DbKey::team_chain_state(&a).to_raw(),
            DbKey::team_chain_state(&b).to_raw()
        );
    }
}
