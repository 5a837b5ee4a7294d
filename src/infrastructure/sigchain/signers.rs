//! Binds each link's signing key to the user it claims as signer

use std::collections::BTreeMap;

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::domain::error::ChainError;
use crate::domain::identity::{IdentityDirectory, UserKeyHistory};
use crate::domain::link::ChainLink;
use crate::domain::team::UserVersion;

/// Check that every link is signed by a per-user key its claimed signer has
/// published, under the signer's current eldest seqno.
///
/// Each distinct signer is looked up once. The player authorizes by the
/// claimed signer, so this must run before `fold` on links from the server.
pub async fn verify_signers(
    links: &[ChainLink],
    directory: &dyn IdentityDirectory,
) -> Result<(), ChainError> {
    let mut first_seen: BTreeMap<&str, u64> = BTreeMap::new();
    for link in links {
        first_seen
            .entry(link.signer.username())
            .or_insert(link.seqno);
    }

    let histories = try_join_all(
        first_seen
            .iter()
            .map(|(username, seqno)| load_signer(directory, username, *seqno)),
    )
    .await?;
    let histories: BTreeMap<&str, UserKeyHistory> =
        first_seen.keys().copied().zip(histories).collect();

    for link in links {
        if let Some(history) = histories.get(link.signer.username()) {
            check_link(link, history)?;
        }
    }

    debug!(
        links = links.len(),
        signers = histories.len(),
        "Verified link signers"
    );

    Ok(())
}

async fn load_signer(
    directory: &dyn IdentityDirectory,
    username: &str,
    seqno: u64,
) -> Result<UserKeyHistory, ChainError> {
    let unknown = |_| ChainError::UnknownSigner {
        seqno,
        username: username.to_string(),
    };

    let uid = directory.resolve(username).await.map_err(unknown)?;
    directory.load_key_history(&uid).await.map_err(unknown)
}

fn check_link(link: &ChainLink, history: &UserKeyHistory) -> Result<(), ChainError> {
    let signer: &UserVersion = &link.signer;

    if history.eldest_seqno != signer.eldest_seqno() {
        warn!(
            seqno = link.seqno,
            signer = %signer,
            current = history.eldest_seqno,
            "Link signer is from another identity epoch"
        );
        return Err(ChainError::SignerEldestMismatch {
            seqno: link.seqno,
            signer: signer.clone(),
            current: history.eldest_seqno,
        });
    }

    let published = history
        .per_user_keys
        .iter()
        .any(|key| key.signing_kid == link.signing_kid);
    if !published {
        warn!(
            seqno = link.seqno,
            signer = %signer,
            kid = %link.signing_kid,
            "Link signed by a key its signer never published"
        );
        return Err(ChainError::SignerKeyMismatch {
            seqno: link.seqno,
            signer: signer.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::link::{LinkId, LinkPayload, SignedPayload};
    use crate::domain::team::TeamRole;
    use crate::infrastructure::sigchain::{fold, parse_chain};
    use crate::testutil::{directory, members, ChainBuilder, TestUser};

    #[tokio::test]
    async fn test_honest_chain_passes() {
        let alice = TestUser::new("alice", 1);
        let bob = TestUser::new("bob", 1);
        let mut chain = ChainBuilder::new("acme", &alice);
        chain
            .change_membership(&alice, members().admins(&[&bob]).build())
            .rotate_key(&bob);
        let directory = directory(&[&alice, &bob]);

        assert_eq!(verify_signers(&chain.links(), &directory).await, Ok(()));
        assert_eq!(directory.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_forged_signer_rejected() {
        let alice = TestUser::new("alice", 1);
        let mallory = TestUser::new("mallory", 1);
        let mut chain = ChainBuilder::new("acme", &alice);

        // signed with mallory's key, claiming alice
        let team = chain
            .section()
            .with_members(members().owners(&[&mallory]).build());
        let raw = mallory.sign(&SignedPayload {
            seqno: 2,
            prev: Some(LinkId::from_payload(
                chain.raw_links()[0].payload_json.as_bytes(),
            )),
            signer: alice.uv(),
            body: LinkPayload::ChangeMembership { team },
        });
        chain.push_raw(raw);

        let links = parse_chain(chain.raw_links()).unwrap();
        // folding alone trusts the claimed signer
        let folded = fold(None, &links).unwrap();
        assert_eq!(folded.role_of(&mallory.uv()), TeamRole::Owner);

        assert_eq!(
            verify_signers(&links, &directory(&[&alice, &mallory])).await,
            Err(ChainError::SignerKeyMismatch {
                seqno: 2,
                signer: alice.uv(),
            })
        );
    }

    #[tokio::test]
    async fn test_old_eldest_seqno_rejected() {
        let reset_alice = TestUser::new("alice", 7);
        let old_alice = TestUser::new("alice", 1);
        let chain = ChainBuilder::new("acme", &old_alice);

        assert_eq!(
            verify_signers(&chain.links(), &directory(&[&reset_alice])).await,
            Err(ChainError::SignerEldestMismatch {
                seqno: 1,
                signer: old_alice.uv(),
                current: 7,
            })
        );
    }

    #[tokio::test]
    async fn test_unresolvable_signer() {
        let alice = TestUser::new("alice", 1);
        let bob = TestUser::new("bob", 1);
        let mut chain = ChainBuilder::new("acme", &alice);
        chain
            .change_membership(&alice, members().admins(&[&bob]).build())
            .rotate_key(&bob);

        assert_eq!(
            verify_signers(&chain.links(), &directory(&[&alice])).await,
            Err(ChainError::UnknownSigner {
                seqno: 3,
                username: "bob".to_string(),
            })
        );
    }
}
