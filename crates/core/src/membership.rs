//! Project membership rules.
//!
//! A project has a set of ordinary members and at most one project manager.
//! The manager is a member flagged as such; replacing the ordinary member set
//! never touches the manager row. The repository layer applies the plans
//! produced here inside a single transaction.

use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// What the repository knows about a user proposed for a project role.
#[derive(Debug, Clone)]
pub struct MemberCandidate {
    pub user_id: DbId,
    pub company_id: DbId,
    pub roles: Vec<Role>,
}

/// Check that `candidate` may become the manager of a project owned by
/// `project_company_id`.
///
/// The candidate must belong to the same company and hold the
/// project-manager role.
pub fn validate_manager_candidate(
    project_company_id: DbId,
    candidate: &MemberCandidate,
) -> Result<(), CoreError> {
    if candidate.company_id != project_company_id {
        return Err(CoreError::Validation(format!(
            "User {} does not belong to the project's company",
            candidate.user_id
        )));
    }
    if !candidate.roles.contains(&Role::ProjectManager) {
        return Err(CoreError::Validation(format!(
            "User {} does not hold the {} role",
            candidate.user_id,
            Role::ProjectManager
        )));
    }
    Ok(())
}

/// Check that every selected user id was found among the company's users.
///
/// `in_company` is the subset of `selected` the repository resolved inside
/// the tenant. Anything left over is either absent or belongs elsewhere; the
/// two cases are reported identically.
pub fn validate_selection(selected: &[DbId], in_company: &[DbId]) -> Result<(), CoreError> {
    let found: BTreeSet<DbId> = in_company.iter().copied().collect();
    let missing: Vec<String> = dedup(selected)
        .into_iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Users are not members of this company: {}",
            missing.join(", ")
        )))
    }
}

/// The edits needed to turn the current ordinary member set into `selected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub to_remove: Vec<DbId>,
    pub to_add: Vec<DbId>,
}

impl MembershipPlan {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Plan the replacement of a project's ordinary members.
///
/// `current` holds the ordinary members (manager excluded). The manager is
/// never removed and never re-added as an ordinary member, even if it appears
/// in `selected`. Duplicates in `selected` are ignored. Output lists are sorted.
pub fn plan_member_replacement(
    current: &[DbId],
    selected: &[DbId],
    manager: Option<DbId>,
) -> MembershipPlan {
    let current: BTreeSet<DbId> = current
        .iter()
        .copied()
        .filter(|id| Some(*id) != manager)
        .collect();
    let target: BTreeSet<DbId> = selected
        .iter()
        .copied()
        .filter(|id| Some(*id) != manager)
        .collect();

    MembershipPlan {
        to_remove: current.difference(&target).copied().collect(),
        to_add: target.difference(&current).copied().collect(),
    }
}

/// Sorted, de-duplicated copy of an id list.
pub fn dedup(ids: &[DbId]) -> Vec<DbId> {
    ids.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
