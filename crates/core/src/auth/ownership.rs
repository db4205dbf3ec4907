//! Ownership checks for actor-scoped operations.
//!
//! Every operation that takes an acting user asks this seam whether the
//! actor owns the account, card, or loan it is about to touch. The identity
//! provider behind the answer is out of scope; the default implementation
//! compares owner ids directly.

use meridian_shared::types::UserId;

/// Answers "does this actor own this resource".
#[cfg_attr(test, mockall::automock)]
pub trait Ownership: Send + Sync {
    /// Returns true if `actor` owns the resource whose recorded owner is
    /// `resource_owner`.
    fn owns(&self, actor: UserId, resource_owner: UserId) -> bool;
}

/// Ownership check that compares owner ids directly.
#[derive(Debug, Default)]
pub struct DirectOwnership;

impl Ownership for DirectOwnership {
    fn owns(&self, actor: UserId, resource_owner: UserId) -> bool {
        actor == resource_owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_ownership_matches_same_user() {
        let user = UserId::new();
        assert!(DirectOwnership.owns(user, user));
    }

    #[test]
    fn test_direct_ownership_rejects_other_user() {
        assert!(!DirectOwnership.owns(UserId::new(), UserId::new()));
    }
}
