//! Member set builder for membership changes and key-box recipients

mod builder;
mod recipients;

pub use builder::{Member, MemberSet, TeamChangeReq};
pub use recipients::Recipients;
