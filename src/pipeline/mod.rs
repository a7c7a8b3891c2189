pub mod client;

pub use client::{JenkinsClient, JenkinsSession};
