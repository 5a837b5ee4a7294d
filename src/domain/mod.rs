//! Domain layer - team chain entities, seams and errors

pub mod error;
pub mod identity;
pub mod keys;
pub mod link;
pub mod server;
pub mod storage;
pub mod team;

pub use error::{
    ChainError, KeyError, LoadError, NetworkError, RequestError, ResolutionError, StorageError,
};
pub use identity::{IdentityDirectory, Uid, UserKeyHistory};
pub use keys::{Kid, PerUserKey, PerUserKeyring, PerUserSecretKeys, TeamBox};
pub use link::{ChainLink, LinkId, LinkPayload, RawChainLink};
pub use server::{RawTeam, TeamFetchArg, TeamServer};
pub use storage::{DeviceKeyProvider, RawStore};
pub use team::{TeamData, TeamId, TeamName, TeamRole, TeamState, UserVersion};
