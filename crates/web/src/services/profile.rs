//! Profile upsert and load.

use sqlx::PgPool;
use thiserror::Error;

use santa_paws_core::{CorgiId, UserId};

use crate::db::{ProfileRepository, RepositoryError};
use crate::models::{Corgi, CurrentIdentity, MailingAddress, ProfileInput, User};

/// Errors from saving a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// A submitted corgi id belongs to someone else.
    #[error("corgi belongs to another owner: {0}")]
    ForeignPet(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ProfileError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotOwner(what) => Self::ForeignPet(what),
            other => Self::Repository(other),
        }
    }
}

/// A saved profile.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub address: Option<MailingAddress>,
    pub corgis: Vec<Corgi>,
}

/// Profile service.
pub struct ProfileService<'a> {
    profiles: ProfileRepository<'a>,
}

impl<'a> ProfileService<'a> {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool),
        }
    }

    /// Save the user, address and exact corgi set atomically.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::ForeignPet` if a corgi id belongs to another
    /// user; nothing is written.
    pub async fn save(
        &self,
        identity: &CurrentIdentity,
        input: &ProfileInput,
    ) -> Result<Vec<CorgiId>, ProfileError> {
        Ok(self.profiles.save_profile(identity, input).await?)
    }

    /// Load the profile, or `None` before the first save.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any query fails.
    pub async fn load(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let (user, address, corgis) = tokio::try_join!(
            self.profiles.get_user(user_id),
            self.profiles.get_address(user_id),
            self.profiles.list_corgis(user_id),
        )?;

        Ok(user.map(|user| Profile {
            user,
            address,
            corgis,
        }))
    }

    /// The user's corgis.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn corgis(&self, user_id: UserId) -> Result<Vec<Corgi>, RepositoryError> {
        self.profiles.list_corgis(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_owner_maps_to_foreign_pet() {
        let err = ProfileError::from(RepositoryError::NotOwner("corgi 1".to_owned()));
        assert!(matches!(err, ProfileError::ForeignPet(_)));

        let err = ProfileError::from(RepositoryError::NotFound);
        assert!(matches!(err, ProfileError::Repository(RepositoryError::NotFound)));
    }
}
