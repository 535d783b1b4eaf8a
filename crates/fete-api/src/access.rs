//! Ownership and visibility engine.
//!
//! Every nested resource resolves to exactly one owning event, and the
//! event's creator is the write authority. The rules live in a data table
//! keyed by (resource class, role) so that finer-grained roles — group
//! admins, for instance — can be granted actions without touching the
//! handlers.

use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Event,
    Reminder,
    Guest,
    Task,
    Vendor,
    Gift,
    Album,
    Photo,
    MessageGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Creator of the owning event.
    EventOwner,
    /// `is_admin` member of a message group.
    GroupAdmin,
    GroupMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

/// The authorization rule table. Group roles currently grant nothing beyond
/// membership reads; the event owner stays the sole write authority.
const POLICY: &[(ResourceClass, Role, &[Action])] = &[
    (ResourceClass::Event, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::Reminder, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::Guest, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::Task, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::Vendor, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::Gift, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::Album, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::Photo, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::MessageGroup, Role::EventOwner, &[Action::Read, Action::Write]),
    (ResourceClass::MessageGroup, Role::GroupAdmin, &[Action::Read]),
    (ResourceClass::MessageGroup, Role::GroupMember, &[Action::Read]),
];

pub fn permits(class: ResourceClass, role: Role, action: Action) -> bool {
    POLICY
        .iter()
        .any(|(c, r, actions)| *c == class && *r == role && actions.contains(&action))
}

/// Gate an action on a resource reached through its ownership chain.
///
/// `chain_owner` is the creator of the owning event, resolved WITHOUT owner
/// scoping: `None` means the chain does not exist (`NotFound`), while a
/// resolved chain that grants the principal nothing is `AccessDenied`. This
/// is the one place where the two outcomes diverge — a nested create names
/// its parent explicitly, so denying it does not leak anything the caller
/// did not already claim to know.
pub fn authorize(
    class: ResourceClass,
    action: Action,
    chain_owner: Option<&str>,
    principal: Uuid,
) -> Result<(), ApiError> {
    let owner = chain_owner.ok_or(ApiError::NotFound)?;

    let held: &[Role] = if owner == principal.to_string() {
        &[Role::EventOwner]
    } else {
        &[]
    };

    if held.iter().any(|role| permits(class, *role, action)) {
        Ok(())
    } else {
        Err(ApiError::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(n: u8) -> Uuid {
        Uuid::from_u128(n as u128)
    }

    #[test]
    fn owner_may_read_and_write_everything() {
        for class in [
            ResourceClass::Event,
            ResourceClass::Reminder,
            ResourceClass::Guest,
            ResourceClass::Task,
            ResourceClass::Vendor,
            ResourceClass::Gift,
            ResourceClass::Album,
            ResourceClass::Photo,
            ResourceClass::MessageGroup,
        ] {
            assert!(permits(class, Role::EventOwner, Action::Read));
            assert!(permits(class, Role::EventOwner, Action::Write));
        }
    }

    #[test]
    fn group_roles_do_not_elevate_writes() {
        assert!(permits(ResourceClass::MessageGroup, Role::GroupAdmin, Action::Read));
        assert!(!permits(ResourceClass::MessageGroup, Role::GroupAdmin, Action::Write));
        assert!(!permits(ResourceClass::MessageGroup, Role::GroupMember, Action::Write));
    }

    #[test]
    fn missing_chain_is_not_found() {
        let err = authorize(ResourceClass::Reminder, Action::Write, None, uid(1)).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn foreign_chain_is_access_denied() {
        let owner = uid(1).to_string();
        let err =
            authorize(ResourceClass::Reminder, Action::Write, Some(&owner), uid(2)).unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied));
    }

    #[test]
    fn owner_chain_is_authorized() {
        let owner = uid(1).to_string();
        authorize(ResourceClass::Reminder, Action::Write, Some(&owner), uid(1)).unwrap();
    }
}
