use thiserror::Error;

use super::team::{TeamId, TeamRole, UserVersion};

/// Malformed or contradictory load requests. Never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    #[error("Load request sets both a team ID and a team name")]
    AmbiguousTarget,

    #[error("Load request sets neither a team ID nor a team name")]
    MissingTarget,

    #[error("Loading subteam '{0}' by name is not supported")]
    UnsupportedSubteamByName(String),

    #[error("Cannot combine {flag} with no-network")]
    ConflictingFlags { flag: &'static str },

    #[error("Invalid team name: {0}")]
    InvalidTeamName(String),
}

/// Failures while parsing or folding a team sigchain
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {
    #[error("Sequence gap: expected seqno {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },

    #[error("First link must create the team, got {link_type}")]
    MissingCreation { link_type: &'static str },

    #[error("Team creation link at seqno {seqno}")]
    DuplicateCreation { seqno: u64 },

    #[error("Unauthorized link at seqno {seqno}: {signer} ({role}) {reason}")]
    Unauthorized {
        seqno: u64,
        signer: UserVersion,
        role: TeamRole,
        reason: String,
    },

    #[error("Per-team key generation gap at seqno {seqno}: expected {expected}, got {got}")]
    GenerationGap { seqno: u64, expected: u32, got: u32 },

    #[error("Link at seqno {seqno} must introduce a per-team key")]
    MissingPerTeamKey { seqno: u64 },

    #[error("Link at seqno {seqno} removes members without rotating the per-team key")]
    MissingKeyRotation { seqno: u64 },

    #[error("Link at seqno {seqno} has wrong prev: expected {expected}, got {got}")]
    PrevMismatch {
        seqno: u64,
        expected: String,
        got: String,
    },

    #[error("Link at seqno {seqno} is for team {got}, chain is for {expected}")]
    WrongTeam {
        seqno: u64,
        expected: TeamId,
        got: TeamId,
    },

    #[error("Invalid signature on chain link")]
    BadSignature,

    #[error("Link at seqno {seqno} names signer {username}, who cannot be resolved")]
    UnknownSigner { seqno: u64, username: String },

    #[error("Link at seqno {seqno} claims {signer}, but the user's current eldest seqno is {current}")]
    SignerEldestMismatch {
        seqno: u64,
        signer: UserVersion,
        current: u64,
    },

    #[error("Link at seqno {seqno} is not signed by a per-user key of {signer}")]
    SignerKeyMismatch { seqno: u64, signer: UserVersion },

    #[error("Malformed chain link: {0}")]
    Malformed(String),
}

impl ChainError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Which of the two derived per-team keys disagreed with the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedKeyKind {
    Signing,
    Encryption,
}

impl std::fmt::Display for DerivedKeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signing => write!(f, "signing"),
            Self::Encryption => write!(f, "encryption"),
        }
    }
}

/// Failures while opening a team key box
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KeyError {
    #[error("No per-user encryption key at seqno {box_seqno} (current seqno {current:?})")]
    StaleRecipientKey { box_seqno: u64, current: Option<u64> },

    #[error("Derived {kind} key for generation {generation} does not match the team chain")]
    KeyMismatch {
        kind: DerivedKeyKind,
        generation: u32,
    },

    #[error("Team chain has no per-team key at generation {0}")]
    UnknownGeneration(u32),

    #[error("Failed to decrypt team box: {0}")]
    Decryption(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Per-user keyring error: {0}")]
    Keyring(String),
}

impl KeyError {
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption(message.into())
    }

    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }

    pub fn keyring(message: impl Into<String>) -> Self {
        Self::Keyring(message.into())
    }
}

/// Identity lookups for member-set operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("Could not resolve member '{0}'")]
    UnresolvedMember(String),

    #[error("User '{username}' has no per-user key")]
    NoPerUserKey { username: String },
}

/// Disk tier and raw store failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Failed to encode cache record: {0}")]
    Encode(String),

    #[error("Failed to decode cache record: {0}")]
    Decode(String),

    #[error("Cache encryption error: {0}")]
    Crypto(String),

    #[error("Device key unavailable: {0}")]
    DeviceKey(String),
}

impl StorageError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto(message.into())
    }

    pub fn device_key(message: impl Into<String>) -> Self {
        Self::DeviceKey(message.into())
    }
}

/// Transport-level failures reported by the server client
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned status {code}: {desc}")]
    AppStatus { code: i32, desc: String },

    #[error("Request cancelled")]
    Cancelled,
}

impl NetworkError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// Everything `TeamLoader::load` can fail with
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Team {0} is not cached and network access is disabled")]
    NoNetworkNoCache(TeamId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_gap_message() {
        let error = ChainError::SequenceGap { expected: 3, got: 5 };
        assert_eq!(error.to_string(), "Sequence gap: expected seqno 3, got 5");
    }

    #[test]
    fn test_key_mismatch_message() {
        let error = KeyError::KeyMismatch {
            kind: DerivedKeyKind::Encryption,
            generation: 2,
        };
        assert_eq!(
            error.to_string(),
            "Derived encryption key for generation 2 does not match the team chain"
        );
    }

    #[test]
    fn test_load_error_from_request_error() {
        let error: LoadError = RequestError::AmbiguousTarget.into();
        assert_eq!(error, LoadError::Request(RequestError::AmbiguousTarget));
        assert_eq!(
            error.to_string(),
            "Load request sets both a team ID and a team name"
        );
    }

    #[test]
    fn test_conflicting_flags_message() {
        let error = RequestError::ConflictingFlags {
            flag: "force-full-reload",
        };
        assert_eq!(
            error.to_string(),
            "Cannot combine force-full-reload with no-network"
        );
    }
}
