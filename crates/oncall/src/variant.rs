//! Flat tagged unions on the wire.
//!
//! Escalation policies and schedules are sent as a single JSON object whose
//! `type` field picks which extra fields are present. In memory they are a
//! plain header struct plus at most one variant enum; the discriminator is
//! never stored, it is derived from the active variant when encoding.
//!
//! Decoding is two passes over the same payload: first the header fields and
//! the discriminator, then (if the discriminator is registered) the whole
//! payload again into the variant's own schema. An unregistered discriminator
//! is not an error, the entity simply comes back without a variant.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

/// Name of the discriminator field.
pub const TYPE_FIELD: &str = "type";

/// Discriminator reported for a missing variant.
pub const UNKNOWN_TYPE: &str = "unknown";

/// A closed family of payload shapes sharing one discriminator field.
pub trait Variant: Sized {
    /// Fieldless tag naming each member of the family.
    type Kind: Copy + Eq + std::fmt::Debug + 'static;

    /// Family name, used in logs.
    const FAMILY: &'static str;

    /// Every admissible wire discriminator and the tag it maps to.
    const REGISTRY: &'static [(&'static str, Self::Kind)];

    /// Tag of the active member.
    fn kind(&self) -> Self::Kind;

    /// Build the member named by `kind` from the full flat payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not fit the member's schema.
    fn decode(kind: Self::Kind, payload: &Value) -> serde_json::Result<Self>;

    /// The member's own fields, without the discriminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the member does not serialize to a JSON object.
    fn encode_fields(&self) -> serde_json::Result<Map<String, Value>>;
}

/// Look up a discriminator, ignoring ASCII case.
#[must_use]
pub fn variant_for_type_string<V: Variant>(type_str: &str) -> Option<V::Kind> {
    V::REGISTRY
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(type_str))
        .map(|(_, kind)| *kind)
}

/// Wire name of a tag, or [`UNKNOWN_TYPE`] if it is not registered.
#[must_use]
pub fn type_string_for_kind<V: Variant>(kind: V::Kind) -> &'static str {
    V::REGISTRY
        .iter()
        .find(|(_, registered)| *registered == kind)
        .map_or(UNKNOWN_TYPE, |(name, _)| *name)
}

/// Wire name of a variant, or [`UNKNOWN_TYPE`] when there is none.
#[must_use]
pub fn type_string_for_variant<V: Variant>(variant: Option<&V>) -> &'static str {
    variant.map_or(UNKNOWN_TYPE, |v| type_string_for_kind::<V>(v.kind()))
}

/// Serialize `value` and require the result to be a JSON object.
///
/// # Errors
///
/// Returns an error if serialization fails or yields a non-object.
pub fn object_fields<T: Serialize>(value: &T) -> serde_json::Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// An entity made of fixed header fields plus one optional [`Variant`].
pub trait Polymorphic: Sized {
    /// Header fields, decoded with a schema that ignores everything else.
    /// Its `Serialize` impl decides which empty fields are left out.
    type Header: Serialize + DeserializeOwned;

    /// The variant family.
    type Variant: Variant;

    /// Reassemble the entity from its decoded parts.
    fn from_parts(header: Self::Header, variant: Option<Self::Variant>) -> Self;

    /// Header fields for encoding.
    fn header(&self) -> Self::Header;

    /// The active variant, if any.
    fn variant(&self) -> Option<&Self::Variant>;
}

#[derive(Deserialize)]
struct Headers<H> {
    #[serde(flatten)]
    header: H,
    #[serde(rename = "type", default)]
    type_str: Option<String>,
}

/// Decode a flat polymorphic object.
///
/// # Errors
///
/// Returns an error if the header fields do not decode, or if a registered
/// variant's schema rejects the payload.
pub fn decode_entity<E: Polymorphic>(payload: &Value) -> serde_json::Result<E> {
    let Headers { header, type_str } = Headers::<E::Header>::deserialize(payload)?;
    let type_str = type_str.unwrap_or_default();

    let variant = match variant_for_type_string::<E::Variant>(&type_str) {
        Some(kind) => Some(E::Variant::decode(kind, payload)?),
        None => {
            debug!(
                family = E::Variant::FAMILY,
                type_str = %type_str,
                "Unregistered discriminator, decoding without variant"
            );
            None
        }
    };

    Ok(E::from_parts(header, variant))
}

/// Encode a polymorphic entity into one flat object.
///
/// Variant fields go in first; header fields are merged over them and the
/// discriminator is set from the variant. Without a variant only the header
/// is written.
///
/// # Errors
///
/// Returns an error if the header or variant does not serialize to an object.
pub fn encode_entity<E: Polymorphic>(entity: &E) -> serde_json::Result<Value> {
    let mut out = match entity.variant() {
        Some(variant) => {
            let mut fields = variant.encode_fields()?;
            fields.insert(
                TYPE_FIELD.to_string(),
                Value::from(type_string_for_variant(Some(variant))),
            );
            fields
        }
        None => Map::new(),
    };

    out.extend(object_fields(&entity.header())?);
    Ok(Value::Object(out))
}

/// `Serialize` body for polymorphic entities.
///
/// # Errors
///
/// Propagates encoding failures as serializer errors.
pub fn serialize_entity<E, S>(entity: &E, serializer: S) -> Result<S::Ok, S::Error>
where
    E: Polymorphic,
    S: Serializer,
{
    encode_entity(entity)
        .map_err(serde::ser::Error::custom)?
        .serialize(serializer)
}

/// `Deserialize` body for polymorphic entities.
///
/// # Errors
///
/// Propagates decoding failures as deserializer errors.
pub fn deserialize_entity<'de, E, D>(deserializer: D) -> Result<E, D::Error>
where
    E: Polymorphic,
    D: Deserializer<'de>,
{
    let payload = Value::deserialize(deserializer)?;
    decode_entity(&payload).map_err(serde::de::Error::custom)
}
