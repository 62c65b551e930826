pub mod conversation;
pub mod gemini;
pub mod renderer;
pub mod session_manager;
