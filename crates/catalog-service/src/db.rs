//! Item collection repository.
//!
//! Review mutations are single atomic update expressions: the
//! one-review-per-user rule is enforced by a guarded `$push` rather than a
//! read-modify-write cycle, so concurrent reviews cannot duplicate.

use bson::doc;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::options::ReturnDocument;

use bazaar_core::{ItemId, StoreId, UserId};
use bazaar_gateway::db::RepositoryError;

use crate::models::{Item, Review, has_review_by};

const COLLECTION: &str = "items";

/// Total page count for `count` documents at `limit` per page.
#[must_use]
pub const fn total_pages(count: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    count.div_ceil(limit)
}

/// Data access for the `items` collection.
#[derive(Clone)]
pub struct ItemRepository {
    items: Collection<Item>,
}

impl ItemRepository {
    #[must_use]
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            items: db.collection(COLLECTION),
        }
    }

    pub async fn create(&self, mut item: Item) -> Result<Item, RepositoryError> {
        let result = self.items.insert_one(&item).await?;
        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            RepositoryError::DataCorruption("insert did not return an ObjectId".to_owned())
        })?;
        item.id = Some(ItemId::from(id));
        Ok(item)
    }

    pub async fn find_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let cursor = self.items.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_one(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self.items.find_one(doc! { "_id": id }).await?)
    }

    /// One page of items, 1-based, plus the total page count.
    pub async fn paginate(
        &self,
        page: u64,
        limit: i64,
    ) -> Result<(Vec<Item>, u64), RepositoryError> {
        let skip = page.saturating_sub(1).saturating_mul(limit.unsigned_abs());

        let cursor = self.items.find(doc! {}).skip(skip).limit(limit).await?;
        let items: Vec<Item> = cursor.try_collect().await?;

        let count = self.items.count_documents(doc! {}).await?;
        Ok((items, total_pages(count, limit.unsigned_abs())))
    }

    /// Apply a prebuilt `$set` update and return the new state.
    pub async fn apply_set(
        &self,
        id: ItemId,
        set: bson::Document,
    ) -> Result<Item, RepositoryError> {
        self.items
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Append a review, rejecting a second review from the same user.
    ///
    /// The filter matches only when no existing review carries this user
    /// id, so the uniqueness check and the push are one atomic operation.
    pub async fn add_review(&self, id: ItemId, review: &Review) -> Result<Item, RepositoryError> {
        let result = self
            .items
            .update_one(
                doc! {
                    "_id": id,
                    "reviews.userID": { "$ne": review.user_id },
                },
                doc! { "$push": { "reviews": bson::to_bson(review)
                    .map_err(|e| RepositoryError::DataCorruption(e.to_string()))? } },
            )
            .await?;

        if result.matched_count == 0 {
            // Distinguish a missing item from a duplicate review.
            return match self.find_one(id).await? {
                None => Err(RepositoryError::NotFound),
                Some(item) if has_review_by(&item.reviews, review.user_id) => Err(
                    RepositoryError::Conflict("user has already reviewed this item".to_owned()),
                ),
                Some(_) => Err(RepositoryError::Conflict(
                    "review lost to a concurrent write".to_owned(),
                )),
            };
        }

        self.find_one(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace the caller's review in place via an array filter.
    pub async fn modify_review(
        &self,
        id: ItemId,
        review: &Review,
    ) -> Result<Item, RepositoryError> {
        let result = self
            .items
            .update_one(
                doc! { "_id": id, "reviews.userID": review.user_id },
                doc! { "$set": {
                    "reviews.$[r].userName": &review.user_name,
                    "reviews.$[r].rating": i32::from(review.rating),
                    "reviews.$[r].comment": &review.comment,
                } },
            )
            .array_filters(vec![doc! { "r.userID": review.user_id }])
            .await?;

        if result.matched_count == 0 {
            // Distinguish a missing item from a missing review.
            return match self.find_one(id).await? {
                None => Err(RepositoryError::NotFound),
                Some(item) if !has_review_by(&item.reviews, review.user_id) => Err(
                    RepositoryError::Conflict("user has not reviewed this item".to_owned()),
                ),
                Some(_) => Err(RepositoryError::Conflict(
                    "review lost to a concurrent write".to_owned(),
                )),
            };
        }

        self.find_one(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Remove the caller's review.
    pub async fn delete_review(&self, id: ItemId, user_id: UserId) -> Result<Item, RepositoryError> {
        let result = self
            .items
            .update_one(
                doc! { "_id": id },
                doc! { "$pull": { "reviews": { "userID": user_id } } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.find_one(id).await?.ok_or(RepositoryError::NotFound)
    }

    pub async fn delete(&self, id: ItemId) -> Result<(), RepositoryError> {
        let result = self.items.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every item belonging to a store; returns the count removed.
    pub async fn delete_store_items(&self, store_id: StoreId) -> Result<u64, RepositoryError> {
        let result = self.items.delete_many(doc! { "storeID": store_id }).await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
    }

    #[test]
    fn test_total_pages_zero_limit() {
        assert_eq!(total_pages(25, 0), 0);
    }
}
