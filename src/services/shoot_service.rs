use futures::future::BoxFuture;

use crate::{
    dto::{
        requests::{CreateShootResponse, ScoreSubmission, ShootResponse},
        shoot::Shoot,
    },
    error::ServiceError,
};

/// Result alias for shoot service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Request/response port to the server owning live shoots.
pub trait ShootService: Send + Sync {
    /// Open a shoot; the server allocates the code.
    fn create_shoot(
        &self,
        creator_name: String,
        title: Option<String>,
    ) -> BoxFuture<'static, ServiceResult<CreateShootResponse>>;
    /// Register an archer in `code`.
    fn join_shoot(
        &self,
        code: String,
        archer_name: String,
        round_name: String,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>>;
    /// `Ok(None)` when the shoot does not exist.
    fn get_shoot(&self, code: String) -> BoxFuture<'static, ServiceResult<Option<Shoot>>>;
    /// Remove an archer from `code`.
    fn leave_shoot(
        &self,
        code: String,
        archer_name: String,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>>;
    /// Push a running score.
    fn update_score(
        &self,
        submission: ScoreSubmission,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>>;
    /// Push the final score and mark the archer finished.
    fn finish_shoot(
        &self,
        submission: ScoreSubmission,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>>;
}
