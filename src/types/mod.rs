pub mod activity;
pub mod features;
pub mod label;
pub mod quality;
