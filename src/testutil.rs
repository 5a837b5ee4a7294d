//! Test fixtures: users with deterministic keys, signed chains and key boxes

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::domain::error::ChainError;
use crate::domain::identity::mock::MockIdentityDirectory;
use crate::domain::identity::{Uid, UserKeyHistory};
use crate::domain::keys::{Kid, PerUserKey, PerUserSecretKeys, TeamBox};
use crate::domain::link::{
    ChainLink, LinkId, LinkPayload, MemberSection, PerTeamKeySection, RawChainLink,
    SignedPayload, TeamSection,
};
use crate::domain::server::{AppStatus, RawTeam};
use crate::domain::team::{
    PerTeamKeySeed, PerTeamKeySeedItem, ReaderKeyMask, TeamData, TeamId, TeamName, TeamState,
    UserVersion,
};
use crate::infrastructure::keybox::{seal_team_box, TeamKeyManager};
use crate::infrastructure::sigchain;

fn material(parts: &[&str]) -> [u8; 32] {
    Sha256::digest(parts.join("/").as_bytes()).into()
}

fn per_user_signing_key(name: &str, puk_seqno: u64) -> SigningKey {
    SigningKey::from_bytes(&material(&[name, "puk-sig", &puk_seqno.to_string()]))
}

/// A user whose every key is derived from its name
pub struct TestUser {
    name: String,
    eldest_seqno: u64,
    signing_key: SigningKey,
}

impl TestUser {
    /// Links are signed with per-user key 1, as a real client would
    pub fn new(name: &str, eldest_seqno: u64) -> Self {
        Self {
            name: name.to_string(),
            eldest_seqno,
            signing_key: per_user_signing_key(name, 1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uv(&self) -> UserVersion {
        UserVersion::new(&self.name, self.eldest_seqno).unwrap()
    }

    pub fn signing_kid(&self) -> Kid {
        Kid::from_signing_key(&self.signing_key.verifying_key())
    }

    pub fn encryption_secret(&self, puk_seqno: u64) -> StaticSecret {
        let seqno = puk_seqno.to_string();
        StaticSecret::from(material(&[&self.name, "puk-enc", &seqno]))
    }

    pub fn encryption_kid(&self, puk_seqno: u64) -> Kid {
        Kid::from_encryption_key(&PublicKey::from(&self.encryption_secret(puk_seqno)))
    }

    pub fn per_user_key(&self, puk_seqno: u64) -> PerUserKey {
        let signing = per_user_signing_key(&self.name, puk_seqno);
        PerUserKey {
            seqno: puk_seqno,
            signing_kid: Kid::from_signing_key(&signing.verifying_key()),
            encryption_kid: self.encryption_kid(puk_seqno),
        }
    }

    /// The secrets this user's device holds: per-user key 1 only
    pub fn secret_keys(&self) -> PerUserSecretKeys {
        PerUserSecretKeys::new().with_key(1, self.encryption_secret(1))
    }

    pub fn key_history(&self) -> UserKeyHistory {
        UserKeyHistory {
            uid: Uid::new(format!("uid-{}", self.name)),
            username: self.name.clone(),
            eldest_seqno: self.eldest_seqno,
            per_user_keys: vec![self.per_user_key(1)],
        }
    }

    pub fn sign(&self, payload: &SignedPayload) -> RawChainLink {
        self.sign_raw(&serde_json::to_string(payload).unwrap())
    }

    pub fn sign_raw(&self, payload_json: &str) -> RawChainLink {
        RawChainLink {
            payload_json: payload_json.to_string(),
            sig: STANDARD.encode(self.signing_key.sign(payload_json.as_bytes()).to_bytes()),
            kid: self.signing_kid(),
        }
    }
}

/// A directory that knows every user in `users`
pub fn directory(users: &[&TestUser]) -> MockIdentityDirectory {
    users
        .iter()
        .fold(MockIdentityDirectory::new(), |d, u| d.with_user(u.key_history()))
}

/// Builds role buckets from test users
#[derive(Default)]
pub struct MembersBuilder {
    section: MemberSection,
}

pub fn members() -> MembersBuilder {
    MembersBuilder::default()
}

fn bucket(users: &[&TestUser]) -> Option<Vec<UserVersion>> {
    Some(users.iter().map(|u| u.uv()).collect())
}

impl MembersBuilder {
    pub fn owners(mut self, users: &[&TestUser]) -> Self {
        self.section.owners = bucket(users);
        self
    }

    pub fn admins(mut self, users: &[&TestUser]) -> Self {
        self.section.admins = bucket(users);
        self
    }

    pub fn writers(mut self, users: &[&TestUser]) -> Self {
        self.section.writers = bucket(users);
        self
    }

    pub fn readers(mut self, users: &[&TestUser]) -> Self {
        self.section.readers = bucket(users);
        self
    }

    pub fn none(mut self, users: &[&TestUser]) -> Self {
        self.section.none = bucket(users);
        self
    }

    pub fn build(self) -> MemberSection {
        self.section
    }
}

/// Signs a well-formed team chain link by link, tracking every per-team seed
pub struct ChainBuilder {
    team_id: TeamId,
    name: TeamName,
    links: Vec<RawChainLink>,
    seeds: BTreeMap<u32, PerTeamKeySeed>,
}

impl ChainBuilder {
    /// A chain with no links yet
    pub fn empty(name: &str) -> Self {
        let name = TeamName::parse(name).unwrap();
        Self {
            team_id: name.to_team_id().unwrap(),
            name,
            links: Vec::new(),
            seeds: BTreeMap::new(),
        }
    }

    /// A chain whose root link makes `owner` the sole owner at generation 1
    pub fn new(name: &str, owner: &TestUser) -> Self {
        let mut chain = Self::empty(name);
        let key = chain.next_per_team_key();
        let team = chain
            .section()
            .with_name(chain.name.clone())
            .with_members(members().owners(&[owner]).build())
            .with_per_team_key(key);
        chain.append(owner, LinkPayload::Root { team });
        chain
    }

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn name(&self) -> &TeamName {
        &self.name
    }

    pub fn generation(&self) -> u32 {
        self.seeds.keys().next_back().copied().unwrap_or(0)
    }

    pub fn seed(&self, generation: u32) -> &PerTeamKeySeed {
        &self.seeds[&generation]
    }

    pub fn section(&self) -> TeamSection {
        TeamSection::new(self.team_id.clone())
    }

    /// Mint the next generation's seed and return its public section
    pub fn next_per_team_key(&mut self) -> PerTeamKeySection {
        let generation = self.generation() + 1;
        let seed = PerTeamKeySeed::new(material(&[
            self.team_id.as_str(),
            "seed",
            &generation.to_string(),
        ]));
        let keys = TeamKeyManager::new(&seed, generation).unwrap();
        self.seeds.insert(generation, seed);

        PerTeamKeySection {
            generation,
            signing_kid: keys.signing_kid(),
            encryption_kid: keys.encryption_kid(),
        }
    }

    /// Sign `body` as the next link
    pub fn append(&mut self, signer: &TestUser, body: LinkPayload) -> &mut Self {
        let payload = SignedPayload {
            seqno: self.links.len() as u64 + 1,
            prev: self
                .links
                .last()
                .map(|l| LinkId::from_payload(l.payload_json.as_bytes())),
            signer: signer.uv(),
            body,
        };
        let raw = signer.sign(&payload);
        self.push_raw(raw)
    }

    pub fn push_raw(&mut self, raw: RawChainLink) -> &mut Self {
        self.links.push(raw);
        self
    }

    /// Membership change; rotates the key whenever it removes someone
    pub fn change_membership(&mut self, signer: &TestUser, members: MemberSection) -> &mut Self {
        let mut team = self.section();
        if members.has_removals() {
            team = team.with_per_team_key(self.next_per_team_key());
        }
        let team = team.with_members(members);
        self.append(signer, LinkPayload::ChangeMembership { team })
    }

    pub fn rotate_key(&mut self, signer: &TestUser) -> &mut Self {
        let team = self.section().with_per_team_key(self.next_per_team_key());
        self.append(signer, LinkPayload::RotateKey { team })
    }

    pub fn leave(&mut self, signer: &TestUser) -> &mut Self {
        let team = self.section();
        self.append(signer, LinkPayload::Leave { team })
    }

    pub fn raw_links(&self) -> &[RawChainLink] {
        &self.links
    }

    pub fn links(&self) -> Vec<ChainLink> {
        sigchain::parse_chain(&self.links).unwrap()
    }

    pub fn fold(&self) -> Result<TeamState, ChainError> {
        sigchain::play_raw(None, &self.links)
    }

    /// A box carrying `generation`'s seed to `recipient`'s per-user key 1
    pub fn team_box(&self, recipient: &TestUser, generation: u32) -> TeamBox {
        let sender = StaticSecret::from(material(&[self.team_id.as_str(), "sender"]));
        seal_team_box(
            self.seed(generation),
            generation,
            &sender,
            &recipient.encryption_kid(1),
            1,
        )
        .unwrap()
    }

    /// What the server returns for links above `low_seqno`, boxed for `recipient`
    pub fn raw_team(&self, recipient: &TestUser, low_seqno: u64) -> RawTeam {
        RawTeam {
            status: AppStatus::ok(),
            chain: self.links[low_seqno as usize..].to_vec(),
            team_box: self.team_box(recipient, self.generation()),
            reader_key_masks: Vec::new(),
        }
    }
}

/// A verified single-owner team holding its generation 1 seed
pub fn team_data(name: &str) -> TeamData {
    let owner = TestUser::new("alice", 1);
    let chain = ChainBuilder::new(name, &owner);

    TeamData {
        chain: chain.fold().unwrap(),
        per_team_key_seeds: vec![PerTeamKeySeedItem {
            seed: chain.seed(1).clone(),
            generation: 1,
            seqno: 1,
        }],
        reader_key_masks: vec![ReaderKeyMask {
            application: 1,
            generation: 1,
            mask: "bWFzaw==".to_string(),
        }],
        loaded_at: Utc::now(),
    }
}
