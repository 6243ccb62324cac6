use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateAttrRequest {
    #[serde(default)]
    pub name: String,
}
