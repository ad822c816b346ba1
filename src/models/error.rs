use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model {model} needs at least {needed} training values, got {got}")]
    InsufficientData {
        model: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("Forecast horizon must be at least 1")]
    ZeroHorizon,

    #[error("Model {model} produced a non-finite forecast")]
    NonFiniteForecast { model: &'static str },

    #[error("Normal equations of the {model} model are singular")]
    SingularSystem { model: &'static str },
}
