use crate::services::{UserService, UserServiceError};
use carapax::{types::User, Chain, Ref};

/// Records every sender so `@username` lookups can resolve them later.
pub fn setup() -> Chain {
    Chain::all().add(track_user)
}

async fn track_user(user_service: Ref<UserService>, user: User) -> Result<(), UserServiceError> {
    log::debug!(
        "Seen user {} (@{})",
        user.id,
        user.username.as_deref().unwrap_or("-")
    );
    user_service.save(user).await
}
