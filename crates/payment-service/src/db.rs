//! Payment collection repository.
//!
//! Revenue totals are computed server-side with `$group` aggregations
//! rather than shipping every record over the wire.

use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::options::ReturnDocument;

use bazaar_core::{PaymentId, PaymentStatus, StoreId};
use bazaar_gateway::db::RepositoryError;

use crate::models::Payment;

const COLLECTION: &str = "payments";

/// Data access for the `payments` collection.
#[derive(Clone)]
pub struct PaymentRepository {
    payments: Collection<Payment>,
}

impl PaymentRepository {
    #[must_use]
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            payments: db.collection(COLLECTION),
        }
    }

    pub async fn create(&self, mut payment: Payment) -> Result<Payment, RepositoryError> {
        let result = self.payments.insert_one(&payment).await?;
        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            RepositoryError::DataCorruption("insert did not return an ObjectId".to_owned())
        })?;
        payment.id = Some(PaymentId::from(id));
        Ok(payment)
    }

    pub async fn find_all(&self) -> Result<Vec<Payment>, RepositoryError> {
        let cursor = self.payments.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Sum of payment amounts for one store.
    pub async fn store_total(&self, store_id: StoreId) -> Result<f64, RepositoryError> {
        self.sum_amounts(Some(doc! { "storeID": store_id })).await
    }

    /// Sum of payment amounts across every store.
    pub async fn admin_total(&self) -> Result<f64, RepositoryError> {
        self.sum_amounts(None).await
    }

    async fn sum_amounts(&self, filter: Option<Document>) -> Result<f64, RepositoryError> {
        let mut pipeline = Vec::with_capacity(2);
        if let Some(filter) = filter {
            pipeline.push(doc! { "$match": filter });
        }
        pipeline.push(doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } });

        let mut cursor = self.payments.aggregate(pipeline).await?;
        let Some(group) = cursor.try_next().await? else {
            // No matching payments at all.
            return Ok(0.0);
        };

        group
            .get_f64("total")
            .or_else(|_| group.get_i64("total").map(|t| {
                #[allow(clippy::cast_precision_loss)]
                let t = t as f64;
                t
            }))
            .map_err(|e| RepositoryError::DataCorruption(format!("bad aggregation result: {e}")))
    }

    pub async fn update_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<Payment, RepositoryError> {
        self.payments
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str() } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    pub async fn delete(&self, id: PaymentId) -> Result<(), RepositoryError> {
        let result = self.payments.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
