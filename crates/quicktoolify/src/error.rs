#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Could not reach the API: {0}")]
    Transport(String),

    #[error("Unexpected API response: {0}")]
    Decode(String),
}
