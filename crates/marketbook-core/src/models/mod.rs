//! Data models for marketplace entities.
//!
//! This module contains the structures exchanged with the remote API:
//!
//! - `Seller`, `Attachment`: the authenticated merchant and uploaded media
//! - `Product`, `Category`: listings and their classification labels
//! - `NewSeller`, `SellerUpdate`: request bodies for seller creation and update

pub mod product;
pub mod seller;

pub use product::{Category, Product};
pub use seller::{Attachment, NewSeller, Seller, SellerUpdate};
