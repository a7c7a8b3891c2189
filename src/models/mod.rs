pub mod approval;
pub mod interaction;
pub mod message;
pub mod pipeline;
