//! Battant prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartLine, CartStore, CartStoreError, CartSummary, LineKey, ProductId},
    changes::{
        BatchChange, BatchReport, ChangeEntry, ChangeId, ChangeKind, ChangesQueue, EntryOutcome,
        NewChange, Payload, QueueError, ReportScope, Resource, ResourceBatch, ResourceId,
        batch::{BatchResponse, ChangeResult, prepare_batches, reduce_results},
    },
    notify::{SubscriptionId, Subscribers},
    pricing::{PricingError, SHOP_CURRENCY},
    products::{Product, ProductError},
    storage::{
        CART_STORAGE_KEY, CHANGES_STORAGE_KEY, FileStorage, MemoryStorage, Storage, StorageError,
    },
    validation::{FieldError, ValidationErrors, validate_change},
};
