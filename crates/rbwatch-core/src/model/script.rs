use serde::Serialize;

/// A router-side script that can be triggered by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    pub id: String,
    pub name: String,
    pub comment: Option<String>,
}

/// A global variable from the router's script environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}
