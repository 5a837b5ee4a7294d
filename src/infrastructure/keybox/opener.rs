//! Opens a team box and checks the recovered secret against the chain

use tracing::{debug, error};

use super::derive::TeamKeyManager;
use super::sealed::unseal_team_box;
use crate::domain::error::{DerivedKeyKind, KeyError};
use crate::domain::keys::{PerUserSecretKeys, TeamBox};
use crate::domain::team::{PerTeamKeySeedItem, TeamState};

/// Recover one generation's seed from `team_box`.
///
/// The recipient key is picked by the box's per-user key seqno. The seed is
/// only returned when both keys derived from it match the ones the chain
/// declared for that generation.
pub fn open_team_box(
    team_box: &TeamBox,
    my_keys: &PerUserSecretKeys,
    chain: &TeamState,
) -> Result<PerTeamKeySeedItem, KeyError> {
    let generation = team_box.generation;

    let recipient = my_keys
        .encryption_key(team_box.per_user_key_seqno)
        .ok_or(KeyError::StaleRecipientKey {
            box_seqno: team_box.per_user_key_seqno,
            current: my_keys.current_seqno(),
        })?;

    let chained = chain
        .per_team_key_at_generation(generation)
        .ok_or(KeyError::UnknownGeneration(generation))?;

    let seed = unseal_team_box(team_box, recipient)?;
    let derived = TeamKeyManager::new(&seed, generation)?;

    if !derived.signing_kid().secure_eq(&chained.signing_kid) {
        error!(
            team_id = %chain.id(),
            generation,
            "Derived per-team signing key does not match the team chain"
        );
        return Err(KeyError::KeyMismatch {
            kind: DerivedKeyKind::Signing,
            generation,
        });
    }

    if !derived.encryption_kid().secure_eq(&chained.encryption_kid) {
        error!(
            team_id = %chain.id(),
            generation,
            "Derived per-team encryption key does not match the team chain"
        );
        return Err(KeyError::KeyMismatch {
            kind: DerivedKeyKind::Encryption,
            generation,
        });
    }

    debug!(team_id = %chain.id(), generation, "Opened team box");

    Ok(PerTeamKeySeedItem {
        seed,
        generation,
        seqno: chained.seqno,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::PerTeamKeySeed;
    use crate::infrastructure::keybox::seal_team_box;
    use crate::testutil::{ChainBuilder, TestUser};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use x25519_dalek::StaticSecret;

    struct Fixture {
        alice: TestUser,
        state: TeamState,
        seed: PerTeamKeySeed,
    }

    fn fixture() -> Fixture {
        let alice = TestUser::new("alice", 1);
        let chain = ChainBuilder::new("acme", &alice);
        let seed = chain.seed(1).clone();
        let state = chain.fold().unwrap();

        Fixture { alice, state, seed }
    }

    fn sealed(fx: &Fixture, seed: &PerTeamKeySeed, seqno: u64) -> TeamBox {
        let sender = StaticSecret::from([99u8; 32]);
        seal_team_box(seed, 1, &sender, &fx.alice.encryption_kid(seqno), seqno).unwrap()
    }

    #[test]
    fn test_open_matching_box() {
        let fx = fixture();
        let team_box = sealed(&fx, &fx.seed, 1);

        let item = open_team_box(&team_box, &fx.alice.secret_keys(), &fx.state).unwrap();
        assert_eq!(item.seed, fx.seed);
        assert_eq!(item.generation, 1);
        assert_eq!(item.seqno, 1);
    }

    #[test]
    fn test_substituted_secret_is_key_mismatch() {
        let fx = fixture();
        let team_box = sealed(&fx, &PerTeamKeySeed::new([7u8; 32]), 1);

        let err = open_team_box(&team_box, &fx.alice.secret_keys(), &fx.state).unwrap_err();
        assert_eq!(
            err,
            KeyError::KeyMismatch {
                kind: DerivedKeyKind::Signing,
                generation: 1
            }
        );
    }

    #[test]
    fn test_flipped_ciphertext_byte_never_succeeds() {
        let fx = fixture();
        let mut team_box = sealed(&fx, &fx.seed, 1);

        let mut ctext = STANDARD.decode(&team_box.ctext).unwrap();
        ctext[0] ^= 0x01;
        team_box.ctext = STANDARD.encode(ctext);

        let err = open_team_box(&team_box, &fx.alice.secret_keys(), &fx.state).unwrap_err();
        assert!(matches!(
            err,
            KeyError::Decryption(_) | KeyError::KeyMismatch { .. }
        ));
    }

    #[test]
    fn test_box_for_rotated_away_key_is_stale() {
        let fx = fixture();
        let team_box = sealed(&fx, &fx.seed, 2);

        let err = open_team_box(&team_box, &fx.alice.secret_keys(), &fx.state).unwrap_err();
        assert_eq!(
            err,
            KeyError::StaleRecipientKey {
                box_seqno: 2,
                current: Some(1)
            }
        );
    }

    #[test]
    fn test_generation_missing_from_chain() {
        let fx = fixture();
        let sender = StaticSecret::from([99u8; 32]);
        let team_box =
            seal_team_box(&fx.seed, 5, &sender, &fx.alice.encryption_kid(1), 1).unwrap();

        let err = open_team_box(&team_box, &fx.alice.secret_keys(), &fx.state).unwrap_err();
        assert_eq!(err, KeyError::UnknownGeneration(5));
    }
}
