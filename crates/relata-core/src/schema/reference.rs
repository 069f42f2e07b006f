use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum ReferenceAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl fmt::Display for ReferenceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferenceAction::Cascade => "cascade",
            ReferenceAction::Restrict => "restrict",
            ReferenceAction::SetNull => "set_null",
            ReferenceAction::SetDefault => "set_default",
            ReferenceAction::NoAction => "no_action",
        };
        f.write_str(s)
    }
}
