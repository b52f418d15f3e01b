//! Batch (pricing tier) listing

use crate::errors::Result;
use crate::records::Batch;
use crate::storage::{Kind, Store};

/// All batches, in id order
pub async fn filter(store: &mut dyn Store) -> Result<Vec<Batch>> {
    let records = store.filter(Kind::Batch, &[]).await?;
    records.iter().map(Batch::from_record).collect()
}
