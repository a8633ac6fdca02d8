// Application layer - Session use cases and collaborator seams
pub mod collaborators;
pub mod session_controller;
pub mod session_runtime;
pub mod status;
