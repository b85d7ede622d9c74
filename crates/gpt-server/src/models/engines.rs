//! Engine listing types.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub id: String,
    pub object: &'static str,
    pub owner: &'static str,
    pub ready: bool,
}

impl EngineInfo {
    pub fn ready(id: &str) -> Self {
        Self {
            id: id.to_string(),
            object: "engine",
            owner: "openai",
            ready: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineList {
    pub object: &'static str,
    pub data: Vec<EngineInfo>,
}

impl FromIterator<EngineInfo> for EngineList {
    fn from_iter<I: IntoIterator<Item = EngineInfo>>(iter: I) -> Self {
        Self {
            object: "list",
            data: iter.into_iter().collect(),
        }
    }
}
