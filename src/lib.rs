//! Background-removal pipeline for wardrobe items.
//!
//! `POST /process-item-image` with `{ "itemId": "..." }` downloads the item's
//! original image, sends it to the background-removal service, stores the
//! cutout next to the original and points the item's cover at it. Whatever
//! fails along the way, the item ends in `ready` with the best asset available.

pub mod api;
pub mod bootstrap;
pub mod common;
pub mod config;
pub mod storage;
pub mod transform;
pub mod workflow;
