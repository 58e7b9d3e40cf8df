pub mod controller;

pub use controller::{ProctorBuilder, ProctorController, ProctorSnapshot};
