use serde::{de::Error, ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};

use crate::{Definition, Expression};

/// The serialized form of a [`Definition`].
///
/// The escape character defaults to `\` and both quote kinds are skipped by default.
#[derive(Deserialize, Serialize)]
#[serde(rename = "Definition", deny_unknown_fields)]
struct DefinitionConfig<S> {
	start: S,
	end: S,
	#[serde(default = "default_escape")]
	escape: char,
	#[serde(default = "default_skip")]
	skip_single_quote: bool,
	#[serde(default = "default_skip")]
	skip_double_quote: bool,
}

fn default_escape() -> char {
	'\\'
}

fn default_skip() -> bool {
	true
}

impl Serialize for Definition {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		DefinitionConfig {
			start: self.start(),
			end: self.end(),
			escape: self.escape(),
			skip_single_quote: self.skip_single_quote(),
			skip_double_quote: self.skip_double_quote(),
		}
		.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Definition {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let config = DefinitionConfig::<String>::deserialize(deserializer)?;
		Definition::new(
			config.start,
			config.end,
			config.escape,
			config.skip_single_quote,
			config.skip_double_quote,
		)
		.map_err(D::Error::custom)
	}
}

impl Serialize for Expression {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut state = serializer.serialize_struct("Expression", 3)?;
		state.serialize_field("start", &self.start())?;
		state.serialize_field("full_text", self.full_text())?;
		state.serialize_field("inner_text", self.inner_text())?;
		state.end()
	}
}
