//! User collection repository.

use bson::doc;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::options::ReturnDocument;

use bazaar_core::{Role, StoreId, UserId};
use bazaar_gateway::db::RepositoryError;

use crate::models::User;

const COLLECTION: &str = "users";

/// Data access for the `users` collection.
#[derive(Clone)]
pub struct UserRepository {
    users: Collection<User>,
}

impl UserRepository {
    #[must_use]
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            users: db.collection(COLLECTION),
        }
    }

    /// Insert a new user; the user name must be unique.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the user name is taken, `Database` on driver
    /// failures.
    pub async fn create(&self, mut user: User) -> Result<User, RepositoryError> {
        if self
            .users
            .find_one(doc! { "userName": &user.user_name })
            .await?
            .is_some()
        {
            return Err(RepositoryError::Conflict(format!(
                "user name '{}' is already taken",
                user.user_name
            )));
        }

        let result = self.users.insert_one(&user).await?;
        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            RepositoryError::DataCorruption("insert did not return an ObjectId".to_owned())
        })?;
        user.id = Some(UserId::from(id));
        Ok(user)
    }

    /// Fetch a user with the password hash, for credential checks.
    pub async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.find_one(doc! { "userName": user_name }).await?)
    }

    /// All users; password hashes are stripped by the caller's wire type.
    pub async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let cursor = self.users.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.users.count_documents(doc! {}).await?)
    }

    /// One user by id, constrained to the expected role.
    pub async fn find_by_id_and_role(
        &self,
        id: UserId,
        role: Role,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .find_one(doc! { "_id": id, "role": role.as_str() })
            .await?)
    }

    /// Stored external-auth access token for a user name + role pair.
    pub async fn access_token(
        &self,
        user_name: &str,
        role: Role,
    ) -> Result<Option<String>, RepositoryError> {
        let user = self
            .users
            .find_one(doc! { "userName": user_name, "role": role.as_str() })
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(user.access_token)
    }

    /// Apply a prebuilt `$set` update to one user and return the new state.
    pub async fn apply_set(
        &self,
        id: UserId,
        set: bson::Document,
    ) -> Result<User, RepositoryError> {
        self.users
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Link a merchant account to its store.
    pub async fn link_store(&self, id: UserId, store_id: StoreId) -> Result<User, RepositoryError> {
        self.apply_set(id, doc! { "storeID": store_id }).await
    }

    pub async fn set_access_token(
        &self,
        id: UserId,
        access_token: &str,
    ) -> Result<User, RepositoryError> {
        self.apply_set(id, doc! { "accessToken": access_token })
            .await
    }

    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = self.users.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
