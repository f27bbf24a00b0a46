use serde::{Deserialize, Deserializer};

/// Различает отсутствующее поле и явный null: отсутствие даёт `None`,
/// `null` — `Some(None)`, значение — `Some(Some(v))`. Вешается вместе с
/// `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
