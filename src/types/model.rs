use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Alias used when the caller asks for a model the registry does not know.
pub const DEFAULT_MODEL_ALIAS: &str = "l3-70";

/// Represents a Groq model identifier.
///
/// This can be one of the models reachable through a short alias or a custom
/// string value for models served by the endpoint but absent from the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    /// A model from the alias table.
    Known(KnownModel),

    /// Custom model identifier.
    Custom(String),
}

/// Models reachable through a short alias.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KnownModel {
    /// Llama 3 8B with an 8192 token context.
    Llama38b8192,

    /// Llama 3 70B with an 8192 token context.
    Llama370b8192,

    /// Gemma 7B instruction tuned.
    Gemma7bIt,

    /// Llama 2 70B with a 4096 token context.
    Llama270b4096,

    /// Mixtral 8x7B with a 32768 token context.
    Mixtral8x7b32768,
}

impl KnownModel {
    /// Every known model, in the order the alias table lists them.
    pub const ALL: [KnownModel; 5] = [
        KnownModel::Llama38b8192,
        KnownModel::Llama370b8192,
        KnownModel::Gemma7bIt,
        KnownModel::Llama270b4096,
        KnownModel::Mixtral8x7b32768,
    ];

    /// The short alias users type on the command line.
    pub fn alias(&self) -> &'static str {
        match self {
            KnownModel::Llama38b8192 => "l3-8",
            KnownModel::Llama370b8192 => "l3-70",
            KnownModel::Gemma7bIt => "ge",
            KnownModel::Llama270b4096 => "l2-70",
            KnownModel::Mixtral8x7b32768 => "mi",
        }
    }

    /// The identifier sent to the API.
    pub fn id(&self) -> &'static str {
        match self {
            KnownModel::Llama38b8192 => "llama3-8b-8192",
            KnownModel::Llama370b8192 => "llama3-70b-8192",
            KnownModel::Gemma7bIt => "gemma-7b-it",
            KnownModel::Llama270b4096 => "llama2-70b-4096",
            KnownModel::Mixtral8x7b32768 => "mixtral-8x7b-32768",
        }
    }

    /// Looks up a model by alias, ignoring ASCII case.
    pub fn from_alias(alias: &str) -> Option<Self> {
        let alias = alias.trim();
        Self::ALL
            .into_iter()
            .find(|model| model.alias().eq_ignore_ascii_case(alias))
    }

    /// The model behind [`DEFAULT_MODEL_ALIAS`].
    pub fn default_model() -> Self {
        KnownModel::Llama370b8192
    }
}

impl Model {
    /// Resolves a user-supplied alias to a model.
    ///
    /// Unknown aliases silently resolve to the default model.
    pub fn resolve(alias: &str) -> Self {
        Model::Known(KnownModel::from_alias(alias).unwrap_or_else(KnownModel::default_model))
    }

    /// The identifier sent to the API.
    pub fn id(&self) -> &str {
        match self {
            Model::Known(known) => known.id(),
            Model::Custom(custom) => custom,
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::default_model())
    }
}

/// Resolves a model alias to the identifier sent to the API.
pub fn resolve(alias: &str) -> &'static str {
    KnownModel::from_alias(alias)
        .unwrap_or_else(KnownModel::default_model)
        .id()
}

/// Lists `(alias, model id)` pairs in table order.
pub fn model_aliases() -> impl Iterator<Item = (&'static str, &'static str)> {
    KnownModel::ALL
        .into_iter()
        .map(|model| (model.alias(), model.id()))
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    /// Parses a full model identifier; anything outside the table is kept as custom.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(KnownModel::ALL
            .into_iter()
            .find(|model| model.id() == s)
            .map(Model::Known)
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        match id.parse::<Model>() {
            Ok(model) => Ok(model),
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_aliases_resolve_to_fixed_ids() {
        assert_eq!(resolve("l3-8"), "llama3-8b-8192");
        assert_eq!(resolve("l3-70"), "llama3-70b-8192");
        assert_eq!(resolve("ge"), "gemma-7b-it");
        assert_eq!(resolve("l2-70"), "llama2-70b-4096");
        assert_eq!(resolve("mi"), "mixtral-8x7b-32768");
    }

    #[test]
    fn unknown_alias_falls_back_to_default() {
        let default_id = resolve(DEFAULT_MODEL_ALIAS);
        assert_eq!(resolve("xx"), default_id);
        assert_eq!(resolve(""), default_id);
        assert_eq!(resolve("llama3-8b-8192"), default_id);
        assert_eq!(Model::resolve("xx"), Model::default());
    }

    #[test]
    fn alias_lookup_ignores_case_and_whitespace() {
        assert_eq!(KnownModel::from_alias(" MI "), Some(KnownModel::Mixtral8x7b32768));
        assert_eq!(KnownModel::from_alias("L3-8"), Some(KnownModel::Llama38b8192));
    }

    #[test]
    fn alias_table_is_listed_in_order() {
        let aliases: Vec<_> = model_aliases().map(|(alias, _)| alias).collect();
        assert_eq!(aliases, vec!["l3-8", "l3-70", "ge", "l2-70", "mi"]);
    }

    #[test]
    fn model_serializes_as_plain_id() {
        let json = serde_json::to_string(&Model::resolve("ge")).unwrap();
        assert_eq!(json, r#""gemma-7b-it""#);

        let json = serde_json::to_string(&Model::from("my-finetune")).unwrap();
        assert_eq!(json, r#""my-finetune""#);
    }

    #[test]
    fn model_deserializes_known_and_custom() {
        let model: Model = serde_json::from_str(r#""llama2-70b-4096""#).unwrap();
        assert_eq!(model, Model::Known(KnownModel::Llama270b4096));

        let model: Model = serde_json::from_str(r#""whisper-large-v3""#).unwrap();
        assert_eq!(model, Model::Custom("whisper-large-v3".to_string()));
    }
}
