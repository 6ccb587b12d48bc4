use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("required element `{0}` is missing from the page")]
    MissingElement(&'static str),
    #[error("invalid page config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("browser call failed: {0}")]
    Js(String),
}

impl From<wasm_bindgen::JsValue> for PageError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        PageError::Js(format!("{:?}", value))
    }
}

pub type Result<T> = std::result::Result<T, PageError>;
