// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, PersonaConfig};
use crate::services::gemini::ChatModel;
use crate::services::renderer::Renderer;
use crate::services::session_manager::{SeedPair, SessionManager};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub sessions: SessionManager,
    pub model: Arc<dyn ChatModel>,
    pub persona: PersonaConfig,
    pub renderer: Renderer,
}

impl AppState {
    pub fn new(session_ttl: Duration, persona: PersonaConfig, model: Arc<dyn ChatModel>) -> Self {
        let seed = SeedPair::new(&persona.system_prompt, &persona.acknowledgement);
        Self {
            sessions: SessionManager::new(session_ttl, seed),
            renderer: Renderer::new(persona.show_seed),
            persona,
            model,
        }
    }

    pub fn from_config(config: &Config, model: Arc<dyn ChatModel>) -> Self {
        Self::new(config.session_ttl(), config.persona.clone(), model)
    }
}
