use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct PrimaryKeyDef {
    #[serde(default)]
    pub auto_increment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case", untagged)]
pub enum PrimaryKeySyntax {
    Bool(bool),
    Object(PrimaryKeyDef),
}

impl PrimaryKeySyntax {
    pub fn is_primary_key(&self) -> bool {
        !matches!(self, PrimaryKeySyntax::Bool(false))
    }

    pub fn auto_increment(&self) -> bool {
        matches!(
            self,
            PrimaryKeySyntax::Object(PrimaryKeyDef {
                auto_increment: true
            })
        )
    }
}
