//! Folds typed chain links into a verified `TeamState`

use tracing::{debug, trace};

use crate::domain::error::ChainError;
use crate::domain::link::{ChainLink, LinkPayload, MemberSection, PerTeamKeySection, TeamSection};
use crate::domain::team::{PerTeamKey, TeamRole, TeamState};

/// Fold `links` onto `prior`, or onto an empty team when `prior` is `None`.
///
/// Links are checked strictly in order against the state left by the previous
/// link. The first failure aborts the whole batch; the caller keeps whatever
/// prior state it had.
pub fn fold(prior: Option<TeamState>, links: &[ChainLink]) -> Result<TeamState, ChainError> {
    let mut state = prior;

    for link in links {
        state = Some(match state {
            None => play_first(link)?,
            Some(state) => play_next(state, link)?,
        });
    }

    let state = state.ok_or_else(|| ChainError::malformed("empty chain"))?;

    debug!(
        team_id = %state.id(),
        last_seqno = state.last_seqno(),
        links = links.len(),
        "Folded team chain"
    );

    Ok(state)
}

fn play_first(link: &ChainLink) -> Result<TeamState, ChainError> {
    if link.seqno != 1 {
        return Err(ChainError::SequenceGap {
            expected: 1,
            got: link.seqno,
        });
    }

    let LinkPayload::Root { team } = &link.payload else {
        return Err(ChainError::MissingCreation {
            link_type: link.payload.link_type(),
        });
    };

    if let Some(prev) = &link.prev {
        return Err(ChainError::PrevMismatch {
            seqno: link.seqno,
            expected: "none".to_string(),
            got: prev.to_string(),
        });
    }

    if let Some(name) = &team.name {
        let named_id = name
            .to_team_id()
            .map_err(|e| ChainError::malformed(e.to_string()))?;
        if named_id != team.id {
            return Err(ChainError::malformed(format!(
                "team name {} does not match team id {}",
                name, team.id
            )));
        }
    }

    let members = team
        .members
        .as_ref()
        .ok_or_else(|| ChainError::malformed("root link without members"))?;
    members.check_unique()?;

    let signer_is_owner = members
        .owners
        .iter()
        .flatten()
        .any(|uv| *uv == link.signer);
    if !signer_is_owner {
        return Err(unauthorized(
            link,
            TeamRole::None,
            "must list itself as an owner of a new team",
        ));
    }

    let key = team
        .per_team_key
        .as_ref()
        .ok_or(ChainError::MissingPerTeamKey { seqno: link.seqno })?;

    let mut state = TeamState::new(team.id.clone(), team.name.clone(), link.seqno, link.id.clone());
    apply_members(&mut state, members);
    apply_per_team_key(&mut state, link.seqno, key)?;

    trace!(team_id = %state.id(), "Played root link");
    Ok(state)
}

fn play_next(mut state: TeamState, link: &ChainLink) -> Result<TeamState, ChainError> {
    let expected = state.last_seqno() + 1;
    if link.seqno != expected {
        return Err(ChainError::SequenceGap {
            expected,
            got: link.seqno,
        });
    }

    if link.prev.as_ref() != Some(state.last_link_id()) {
        return Err(ChainError::PrevMismatch {
            seqno: link.seqno,
            expected: state.last_link_id().to_string(),
            got: link
                .prev
                .as_ref()
                .map_or_else(|| "none".to_string(), |p| p.to_string()),
        });
    }

    let team = link.payload.team();
    if team.id != *state.id() {
        return Err(ChainError::WrongTeam {
            seqno: link.seqno,
            expected: state.id().clone(),
            got: team.id.clone(),
        });
    }

    match &link.payload {
        LinkPayload::Root { .. } => {
            return Err(ChainError::DuplicateCreation { seqno: link.seqno });
        }
        LinkPayload::ChangeMembership { team } => play_change_membership(&mut state, link, team)?,
        LinkPayload::RotateKey { team } => play_rotate_key(&mut state, link, team)?,
        LinkPayload::Leave { team } => play_leave(&mut state, link, team)?,
    }

    state.advance(link.seqno, link.id.clone());

    trace!(
        team_id = %state.id(),
        seqno = link.seqno,
        link_type = link.payload.link_type(),
        "Played link"
    );
    Ok(state)
}

fn play_change_membership(
    state: &mut TeamState,
    link: &ChainLink,
    team: &TeamSection,
) -> Result<(), ChainError> {
    let members = team
        .members
        .as_ref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ChainError::malformed("change_membership without members"))?;
    members.check_unique()?;

    let signer_role = state.role_of(&link.signer);
    let changes = members.changes();

    let self_removal = matches!(
        changes.as_slice(),
        [(uv, TeamRole::None)] if **uv == link.signer
    );

    if self_removal {
        if !signer_role.is_member() {
            return Err(unauthorized(link, signer_role, "is not a member"));
        }
    } else {
        if !signer_role.can_manage_members() {
            return Err(unauthorized(link, signer_role, "cannot change membership"));
        }

        for (uv, role) in &changes {
            if *role == TeamRole::Owner && !signer_role.can_manage_owners() {
                return Err(unauthorized(link, signer_role, "cannot grant the owner role"));
            }

            let current = state
                .user_version_by_username(uv.username())
                .map_or(TeamRole::None, |existing| state.role_of(existing));
            if current == TeamRole::Owner && !signer_role.can_manage_owners() {
                return Err(unauthorized(link, signer_role, "cannot change an owner's role"));
            }
        }
    }

    if members.has_removals() && team.per_team_key.is_none() {
        return Err(ChainError::MissingKeyRotation { seqno: link.seqno });
    }

    apply_members(state, members);

    if let Some(key) = &team.per_team_key {
        apply_per_team_key(state, link.seqno, key)?;
    }

    Ok(())
}

fn play_rotate_key(
    state: &mut TeamState,
    link: &ChainLink,
    team: &TeamSection,
) -> Result<(), ChainError> {
    let signer_role = state.role_of(&link.signer);
    if !signer_role.is_member() {
        return Err(unauthorized(link, signer_role, "is not a member"));
    }

    if team.members.is_some() {
        return Err(ChainError::malformed("rotate_key carries a members section"));
    }

    let key = team
        .per_team_key
        .as_ref()
        .ok_or(ChainError::MissingPerTeamKey { seqno: link.seqno })?;

    apply_per_team_key(state, link.seqno, key)
}

fn play_leave(
    state: &mut TeamState,
    link: &ChainLink,
    team: &TeamSection,
) -> Result<(), ChainError> {
    let signer_role = state.role_of(&link.signer);
    if !signer_role.is_member() {
        return Err(unauthorized(link, signer_role, "is not a member"));
    }

    if team.members.is_some() {
        return Err(ChainError::malformed("leave carries a members section"));
    }

    state.set_role(&link.signer, TeamRole::None);

    if let Some(key) = &team.per_team_key {
        apply_per_team_key(state, link.seqno, key)?;
    }

    Ok(())
}

fn apply_members(state: &mut TeamState, members: &MemberSection) {
    for (uv, role) in members.changes() {
        state.set_role(uv, role);
    }
}

fn apply_per_team_key(
    state: &mut TeamState,
    seqno: u64,
    key: &PerTeamKeySection,
) -> Result<(), ChainError> {
    let expected = state.latest_generation() + 1;
    if key.generation != expected {
        return Err(ChainError::GenerationGap {
            seqno,
            expected,
            got: key.generation,
        });
    }

    state.push_per_team_key(PerTeamKey {
        generation: key.generation,
        seqno,
        signing_kid: key.signing_kid.clone(),
        encryption_kid: key.encryption_kid.clone(),
    });

    Ok(())
}

fn unauthorized(link: &ChainLink, role: TeamRole, reason: &str) -> ChainError {
    ChainError::Unauthorized {
        seqno: link.seqno,
        signer: link.signer.clone(),
        role,
        reason: reason.to_string(),
    }
}
