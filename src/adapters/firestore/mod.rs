//! Firestore adapter.

mod firestore_adapter;
mod value;

pub use firestore_adapter::FirestoreDocumentStore;
