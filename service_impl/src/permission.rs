use std::sync::Arc;

use async_trait::async_trait;
use service::permission::Authentication;
use service::ServiceError;

/// Grants every privilege. Used by the development setup where no identity
/// provider is wired in.
pub struct PermissionServiceDev;

#[async_trait]
impl service::PermissionService for PermissionServiceDev {
    type Context = ();

    async fn check_permission(
        &self,
        _privilege: &str,
        _context: Authentication<Self::Context>,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn current_user_id(
        &self,
        context: Authentication<Self::Context>,
    ) -> Result<Option<Arc<str>>, ServiceError> {
        match context {
            Authentication::Full => Ok(None),
            Authentication::Context(()) => Ok(Some("DEVUSER".into())),
        }
    }
}
