//! Who may do what. Pure, so it can be tested without a store.

use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::users::repo_types::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateFood,
    RequestFood,
    ViewOwnFoods,
    ViewOwnRequests,
    ReviewRequests,
    DecideRequest,
    DeleteFood,
    ListUsers,
}

impl Operation {
    pub fn admin_only(&self) -> bool {
        matches!(
            self,
            Operation::ReviewRequests
                | Operation::DecideRequest
                | Operation::DeleteFood
                | Operation::ListUsers
        )
    }
}

/// Allows or denies `operation` for `caller`, optionally on one listing.
pub fn authorize(caller: &User, operation: Operation, food_id: Option<Uuid>) -> Result<(), AppError> {
    if operation.admin_only() && !caller.is_admin() {
        warn!(
            user_id = %caller.id,
            operation = ?operation,
            food_id = ?food_id,
            "admin operation denied"
        );
        return Err(AppError::NotAuthorized);
    }
    Ok(())
}
