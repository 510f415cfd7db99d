//! Store collection repository.
//!
//! Embedded-inventory mutations are single atomic update expressions
//! (`$push`, `$pull`, positional `$set` with an array filter) so two
//! merchants editing one store never clobber each other's writes. There is
//! still no cross-document transaction; catalog and store copies of an
//! item converge best-effort.

use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::options::ReturnDocument;

use bazaar_core::{ItemId, StoreId};
use bazaar_gateway::db::RepositoryError;

use crate::models::{Store, StoreItem, StoreReview};

const COLLECTION: &str = "stores";

/// Projection dropping embedded item images from store reads.
fn without_item_images() -> Document {
    doc! { "items.itemImage": 0 }
}

/// Data access for the `stores` collection.
#[derive(Clone)]
pub struct StoreRepository {
    stores: Collection<Store>,
}

impl StoreRepository {
    #[must_use]
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            stores: db.collection(COLLECTION),
        }
    }

    pub async fn create(&self, mut store: Store) -> Result<Store, RepositoryError> {
        let result = self.stores.insert_one(&store).await?;
        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            RepositoryError::DataCorruption("insert did not return an ObjectId".to_owned())
        })?;
        store.id = Some(StoreId::from(id));
        Ok(store)
    }

    pub async fn find_all(&self) -> Result<Vec<Store>, RepositoryError> {
        let cursor = self.stores.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    /// One store with item images projected out (they are large and the
    /// storefront fetches them from the catalog anyway).
    pub async fn find_one(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        Ok(self
            .stores
            .find_one(doc! { "_id": id })
            .projection(without_item_images())
            .await?)
    }

    /// Embedded inventory size for one store.
    pub async fn item_count(&self, id: StoreId) -> Result<usize, RepositoryError> {
        let store = self.find_one(id).await?.ok_or(RepositoryError::NotFound)?;
        Ok(store.items.len())
    }

    /// Apply a prebuilt `$set` update and return the new state.
    pub async fn apply_set(&self, id: StoreId, set: Document) -> Result<Store, RepositoryError> {
        self.stores
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Push one inventory entry (atomic `$push`).
    pub async fn push_item(&self, id: StoreId, item: &StoreItem) -> Result<Store, RepositoryError> {
        let item = bson::to_bson(item)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        self.stores
            .find_one_and_update(doc! { "_id": id }, doc! { "$push": { "items": item } })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace one inventory entry in place (positional `$set` guarded by
    /// an array filter on the item id).
    pub async fn replace_item(
        &self,
        id: StoreId,
        item: &StoreItem,
    ) -> Result<Store, RepositoryError> {
        let item_doc = bson::to_bson(item)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let result = self
            .stores
            .update_one(
                doc! { "_id": id, "items.itemID": item.item_id },
                doc! { "$set": { "items.$[i]": item_doc } },
            )
            .array_filters(vec![doc! { "i.itemID": item.item_id }])
            .await?;

        if result.matched_count == 0 {
            // Distinguish a missing store from a missing item.
            return match self.find_one(id).await? {
                None => Err(RepositoryError::NotFound),
                Some(_) => Err(RepositoryError::Conflict(
                    "item is not in this store".to_owned(),
                )),
            };
        }

        self.find_one(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Remove one inventory entry (atomic `$pull`).
    pub async fn pull_item(&self, id: StoreId, item_id: ItemId) -> Result<Store, RepositoryError> {
        self.stores
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$pull": { "items": { "itemID": item_id } } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Append a store review (atomic `$push`).
    pub async fn push_review(
        &self,
        id: StoreId,
        review: &StoreReview,
    ) -> Result<Store, RepositoryError> {
        let review = bson::to_bson(review)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        self.stores
            .find_one_and_update(doc! { "_id": id }, doc! { "$push": { "reviews": review } })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    pub async fn delete(&self, id: StoreId) -> Result<(), RepositoryError> {
        let result = self.stores.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Inventory-mutation semantics, checked at the vector level the way
    //! the server applies them.

    use bazaar_core::UserId;

    use super::*;

    fn item(item_id: ItemId, name: &str) -> StoreItem {
        StoreItem {
            item_id,
            item_name: name.to_owned(),
            item_description: "desc".to_owned(),
            item_price: 9.99,
            item_quantity: 3,
            discount: 0,
            item_image: None,
        }
    }

    fn store_with(items: Vec<StoreItem>) -> Store {
        Store {
            id: Some(StoreId::new()),
            store_name: "corner shop".to_owned(),
            location: "5th and Main".to_owned(),
            description: None,
            owner_id: UserId::new(),
            items,
            reviews: Vec::new(),
        }
    }

    #[test]
    fn test_push_then_pull_restores_inventory() {
        let existing = item(ItemId::new(), "kept");
        let mut store = store_with(vec![existing.clone()]);

        let added = item(ItemId::new(), "transient");
        store.items.push(added.clone());
        store.items.retain(|i| i.item_id != added.item_id);

        assert_eq!(store.items, vec![existing]);
    }

    #[test]
    fn test_replace_targets_only_matching_item() {
        let target_id = ItemId::new();
        let other = item(ItemId::new(), "other");
        let mut store = store_with(vec![item(target_id, "before"), other.clone()]);

        let replacement = item(target_id, "after");
        for slot in &mut store.items {
            if slot.item_id == target_id {
                *slot = replacement.clone();
            }
        }

        assert_eq!(store.items, vec![replacement, other]);
    }

    #[test]
    fn test_image_projection_shape() {
        assert_eq!(without_item_images(), doc! { "items.itemImage": 0 });
    }
}
