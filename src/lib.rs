//! Watches crowdfunding reward tiers and notifies subscribed chats when a
//! previously taken reward has open slots again.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
