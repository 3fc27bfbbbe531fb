//! Company access policy seam.
//!
//! The workflow handlers only ask "may this actor act on this company's
//! documents"; how that is answered is pluggable. The shipped policy is
//! the superuser-only rule; a membership/role-table implementation can be
//! injected without touching the workflow code.

use uuid::Uuid;

use docstore_core::models::Actor;

pub trait AccessPolicy: Send + Sync {
    fn can_access(&self, actor: &Actor, company_id: Uuid) -> bool;
}

/// Only superusers may act. Stands in until a real membership model is
/// supplied by a collaborator.
#[derive(Debug, Default, Clone)]
pub struct SuperuserPolicy;

impl AccessPolicy for SuperuserPolicy {
    fn can_access(&self, actor: &Actor, _company_id: Uuid) -> bool {
        actor.is_superuser
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(is_superuser: bool) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            username: "reviewer".into(),
            is_superuser,
        }
    }

    #[test]
    fn superuser_policy_gates_on_flag() {
        let policy = SuperuserPolicy;
        assert!(policy.can_access(&actor(true), Uuid::new_v4()));
        assert!(!policy.can_access(&actor(false), Uuid::new_v4()));
    }
}
