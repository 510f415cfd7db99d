//! Order collection repository.

use bson::doc;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::options::ReturnDocument;

use bazaar_core::{OrderId, OrderStatus, StoreId, UserId};
use bazaar_gateway::db::RepositoryError;

use crate::models::Order;

const COLLECTION: &str = "orders";

/// Data access for the `orders` collection.
#[derive(Clone)]
pub struct OrderRepository {
    orders: Collection<Order>,
}

impl OrderRepository {
    #[must_use]
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            orders: db.collection(COLLECTION),
        }
    }

    pub async fn create(&self, mut order: Order) -> Result<Order, RepositoryError> {
        let result = self.orders.insert_one(&order).await?;
        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            RepositoryError::DataCorruption("insert did not return an ObjectId".to_owned())
        })?;
        order.id = Some(OrderId::from(id));
        Ok(order)
    }

    pub async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let cursor = self.orders.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    /// All orders with item images projected out.
    pub async fn find_all_slim(&self) -> Result<Vec<Order>, RepositoryError> {
        let cursor = self
            .orders
            .find(doc! {})
            .projection(doc! { "items.itemImage": 0 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_one(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_store(&self, store_id: StoreId) -> Result<Vec<Order>, RepositoryError> {
        let cursor = self.orders.find(doc! { "storeID": store_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let cursor = self.orders.find(doc! { "userID": user_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.orders.count_documents(doc! {}).await?)
    }

    /// Move an order to `status`, enforcing the forward-only lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the transition would move the order
    /// backwards, `NotFound` for an unknown order.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let current = self.find_one(id).await?.ok_or(RepositoryError::NotFound)?;
        if !current.status.can_transition_to(status) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {} to {}",
                current.status, status
            )));
        }

        self.orders
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str() } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Mark an order as reviewed.
    pub async fn set_reviewed(&self, id: OrderId) -> Result<Order, RepositoryError> {
        self.orders
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": { "reviewed": true } })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
