// Services module - Business logic

pub mod pass_workflow;
pub mod qr_generator;
pub mod signature;
pub mod status;
