//! Chain link domain - raw and parsed team sigchain statements

mod entity;

pub use entity::{
    ChainLink, LinkId, LinkPayload, MemberSection, PerTeamKeySection, RawChainLink, SignedPayload,
    TeamSection,
};
