//! Battant
//!
//! Client-side core of the La Marque Du Battant shop: a persisted shopping
//! cart, a queue of pending admin edits, and the pure logic that turns that
//! queue into per-resource batches and reads back their results.

pub mod cart;
pub mod changes;
pub mod notify;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod storage;
pub mod validation;
