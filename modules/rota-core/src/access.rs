//! Access rules: who may see a chore, who may change it, and who hears
//! about it. Pure predicates over the latest persisted state; callers
//! translate a `false` into `Forbidden`.

use std::collections::HashSet;

use crate::chore::Chore;

/// A structural mutation, for authorization purposes.
#[derive(Debug, Clone, Copy)]
pub enum StructuralOp<'a> {
    AddPerson,
    Advance,
    RemovePerson { person_id: &'a str },
    Delete,
}

/// True iff `user_id` may see this chore: the owner, a shared-with member,
/// or the account behind one of its rotation slots.
pub fn can_view(chore: &Chore, user_id: &str) -> bool {
    chore.owner_id == user_id
        || chore.shared_with.iter().any(|id| id == user_id)
        || chore.person_for_user(user_id).is_some()
}

/// True iff `user_id` may apply `op` to this chore.
///
/// Deleting the chore is owner-only. Removing a person is owner-only, except
/// that any member may remove their own slot, and nobody, the owner
/// included, may remove the owner's slot. Everything else needs view access.
pub fn can_mutate(chore: &Chore, user_id: &str, op: StructuralOp) -> bool {
    match op {
        StructuralOp::AddPerson | StructuralOp::Advance => can_view(chore, user_id),
        StructuralOp::Delete => chore.owner_id == user_id,
        StructuralOp::RemovePerson { person_id } => {
            let Some(target) = chore.people.iter().find(|p| p.id == person_id) else {
                // Unknown slot: only the owner gets far enough to see the
                // aggregate's NotFound.
                return chore.owner_id == user_id;
            };
            if target.user_id.as_deref() == Some(chore.owner_id.as_str()) {
                return false;
            }
            chore.owner_id == user_id || target.user_id.as_deref() == Some(user_id)
        }
    }
}

/// The exact recipient set for every event about this chore.
pub fn audience_for(chore: &Chore) -> HashSet<String> {
    let mut audience: HashSet<String> = chore.shared_with.iter().cloned().collect();
    audience.insert(chore.owner_id.clone());
    audience
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chore() -> Chore {
        let mut chore = Chore::new("dishes", "owner-1", "Owner");
        chore.add_person("Member", Some("user-2".into())).unwrap();
        chore.share_with("user-2");
        chore.add_person("Freetext", None).unwrap();
        chore
    }

    #[test]
    fn owner_and_shared_users_can_view_strangers_cannot() {
        let chore = sample_chore();
        assert!(can_view(&chore, "owner-1"));
        assert!(can_view(&chore, "user-2"));
        assert!(!can_view(&chore, "user-99"));
    }

    #[test]
    fn membership_via_people_grants_view_even_if_share_lags() {
        let mut chore = Chore::new("dishes", "owner-1", "Owner");
        chore.add_person("Member", Some("user-2".into())).unwrap();
        // shared_with not yet updated
        assert!(can_view(&chore, "user-2"));
    }

    #[test]
    fn delete_is_owner_only() {
        let chore = sample_chore();
        assert!(can_mutate(&chore, "owner-1", StructuralOp::Delete));
        assert!(!can_mutate(&chore, "user-2", StructuralOp::Delete));
    }

    #[test]
    fn add_and_advance_need_only_view_access() {
        let chore = sample_chore();
        for op in [StructuralOp::AddPerson, StructuralOp::Advance] {
            assert!(can_mutate(&chore, "user-2", op));
            assert!(!can_mutate(&chore, "user-99", op));
        }
    }

    #[test]
    fn owner_can_remove_others_members_only_themselves() {
        let chore = sample_chore();
        let member_slot = chore.person_for_user("user-2").unwrap().id.clone();
        let freetext_slot = chore.people[2].id.clone();

        assert!(can_mutate(
            &chore,
            "owner-1",
            StructuralOp::RemovePerson { person_id: &member_slot }
        ));
        assert!(can_mutate(
            &chore,
            "user-2",
            StructuralOp::RemovePerson { person_id: &member_slot }
        ));
        assert!(!can_mutate(
            &chore,
            "user-2",
            StructuralOp::RemovePerson { person_id: &freetext_slot }
        ));
    }

    #[test]
    fn nobody_removes_the_owner_slot() {
        let chore = sample_chore();
        let owner_slot = chore.person_for_user("owner-1").unwrap().id.clone();
        let op = StructuralOp::RemovePerson { person_id: &owner_slot };
        assert!(!can_mutate(&chore, "owner-1", op));
        assert!(!can_mutate(&chore, "user-2", op));
    }

    #[test]
    fn audience_is_owner_plus_shared() {
        let chore = sample_chore();
        let audience = audience_for(&chore);
        assert!(audience.contains("owner-1"));
        assert!(audience.contains("user-2"));
        assert_eq!(audience.len(), 2);
    }
}
