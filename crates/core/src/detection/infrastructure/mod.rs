pub mod model_resolver;
pub mod replay_analyzer;
