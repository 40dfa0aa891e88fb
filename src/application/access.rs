//! Role and approval checks for the acting user.

use serde::Serialize;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ApprovalStatus, Role, User, UserId};

/// The user on whose behalf a use case runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewer {
    pub user_id: UserId,
    pub role: Role,
    pub approval: ApprovalStatus,
}

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            approval: user.approval_status,
        }
    }
}

/// Admin-only operations.
pub fn require_admin(viewer: &Viewer) -> ApplicationResult<()> {
    if viewer.is_admin() {
        return Ok(());
    }
    debug!(user = %viewer.user_id, role = %viewer.role, "admin role required");
    Err(ApplicationError::Forbidden("admin role required".into()))
}

/// Students must be approved; admins always pass.
pub fn require_approved(viewer: &Viewer) -> ApplicationResult<()> {
    if viewer.is_admin() || viewer.approval == ApprovalStatus::Approved {
        return Ok(());
    }
    debug!(user = %viewer.user_id, approval = %viewer.approval, "approval required");
    Err(ApplicationError::PendingApproval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    fn viewer(role: Role, approval: ApprovalStatus) -> Viewer {
        Viewer {
            user_id: Uuid::new_v4(),
            role,
            approval,
        }
    }

    #[rstest]
    #[case(Role::Admin, ApprovalStatus::Pending, true)]
    #[case(Role::Student, ApprovalStatus::Approved, false)]
    fn test_require_admin(#[case] role: Role, #[case] approval: ApprovalStatus, #[case] ok: bool) {
        assert_eq!(require_admin(&viewer(role, approval)).is_ok(), ok);
    }

    #[rstest]
    #[case(Role::Admin, ApprovalStatus::Pending, true)]
    #[case(Role::Student, ApprovalStatus::Approved, true)]
    #[case(Role::Student, ApprovalStatus::Pending, false)]
    #[case(Role::Student, ApprovalStatus::Rejected, false)]
    fn test_require_approved(
        #[case] role: Role,
        #[case] approval: ApprovalStatus,
        #[case] ok: bool,
    ) {
        assert_eq!(require_approved(&viewer(role, approval)).is_ok(), ok);
    }
}
