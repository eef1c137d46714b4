//! Discriminated JSON unions with an unknown-variant fallback.
//!
//! A [`TaggedUnion`] reads one string field (the discriminator) out of a JSON
//! object, looks it up in a closed registry of variant shapes and decodes the
//! whole object into the matching shape. Payloads whose discriminator is not
//! registered are kept verbatim as an unknown variant so that newer API
//! responses still round-trip; they only fail when validated or dispatched on.
//!
//! ```text
//!          decode(raw)
//!               │
//!     discriminator registered? ── no ──► Unknown { raw }
//!               │ yes
//!     shape decodes? ── no ──► Lenient: Unknown { raw, rejected }
//!               │              Strict:  Err(VariantDecodingFailed)
//!               │ yes
//!               ▼
//!     Known { variant, raw (cached) }
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;

use serde::de::{self, Deserialize, DeserializeOwned, Deserializer};
use serde::ser::{self, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PricingError, PricingResult};

/// What to do when a registered discriminator's payload fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Keep the raw payload as an unknown variant along with the decode
    /// error; validate reports it as [`PricingError::MalformedVariant`]
    Lenient,
    /// Fail the decode with [`PricingError::VariantDecodingFailed`]
    Strict,
}

/// Structural validation for a model shape
pub trait ValidateModel {
    fn validate_model(&self) -> PricingResult<()>;
}

/// The closed registry of variant shapes for one discriminator.
///
/// Implemented by a plain enum with one tuple variant per shape, normally via
/// the `union_variants!` macro.
pub trait UnionVariants: Sized + Clone + PartialEq {
    /// JSON field holding the tag
    const DISCRIMINATOR: &'static str;
    /// Every registered tag
    const TAGS: &'static [&'static str];

    /// Decode `raw` as the shape registered for `tag`.
    ///
    /// Returns `None` when `tag` is not registered.
    fn attempt_decode(tag: &str, raw: &Value) -> Option<Result<Self, serde_json::Error>>;

    /// Encode the active shape, discriminator included
    fn encode(&self) -> Result<Value, serde_json::Error>;

    /// Tag of the active shape
    fn tag(&self) -> &'static str;

    /// Validate the active shape
    fn validate(&self) -> PricingResult<()>;
}

/// A single shape registered in the variant enum `V`
pub trait VariantOf<V>: Sized {
    fn project(variants: &V) -> Option<&Self>;
    fn inject(self) -> V;
}

/// Binds a union's name, its variant registry and its decode policy.
pub trait UnionSchema: 'static {
    type Variants: UnionVariants;
    const NAME: &'static str;
    const POLICY: DecodePolicy;
}

/// A decoded discriminated union value.
///
/// Either known (a decoded variant, with the raw JSON cached once available)
/// or unknown (the raw JSON only). Immutable after construction; the encode
/// cache is filled at most once and is safe to share across threads.
pub struct TaggedUnion<S: UnionSchema> {
    repr: Repr<S::Variants>,
    _schema: PhantomData<fn() -> S>,
}

enum Repr<V> {
    Known {
        variant: V,
        raw: OnceLock<Value>,
    },
    Unknown {
        raw: Value,
        rejected: Option<Rejection>,
    },
}

/// Why a registered tag's payload was kept as unknown
#[derive(Debug, Clone)]
struct Rejection {
    variant: &'static str,
    reason: String,
}

/// Read the discriminator string of `raw` for the variant registry `V`
pub fn discriminator_of<V: UnionVariants>(raw: &Value) -> Option<&str> {
    raw.get(V::DISCRIMINATOR).and_then(Value::as_str)
}

/// Decode a variant shape straight from a borrowed JSON value
pub fn decode_shape<T: DeserializeOwned>(raw: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(raw)
}

/// Encode a variant shape and stamp its discriminator onto the object.
///
/// Integral floats are written as integers, the way the API sends them.
pub fn encode_tagged<T: Serialize>(
    discriminator: &str,
    tag: &str,
    inner: &T,
) -> Result<Value, serde_json::Error> {
    let mut encoded = serde_json::to_value(inner)?;
    integral_floats_to_ints(&mut encoded);
    match encoded {
        Value::Object(mut map) => {
            map.insert(discriminator.to_string(), Value::String(tag.to_string()));
            Ok(Value::Object(map))
        }
        other => Err(<serde_json::Error as ser::Error>::custom(format!(
            "variant '{tag}' must encode as a JSON object, got {other}"
        ))),
    }
}

fn integral_floats_to_ints(value: &mut Value) {
    match value {
        Value::Number(number) => {
            let integral = number
                .as_f64()
                .filter(|f| number.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15);
            if let Some(f) = integral {
                *value = Value::from(f as i64);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(integral_floats_to_ints),
        Value::Object(map) => map.values_mut().for_each(integral_floats_to_ints),
        Value::Null | Value::Bool(_) | Value::String(_) => {}
    }
}

impl<S: UnionSchema> TaggedUnion<S> {
    /// Decode a raw JSON value according to the union's schema and policy.
    ///
    /// Under [`DecodePolicy::Lenient`] this never fails.
    pub fn decode(raw: Value) -> PricingResult<Self> {
        let registered = discriminator_of::<S::Variants>(&raw)
            .and_then(|d| S::Variants::TAGS.iter().copied().find(|tag| *tag == d));

        let Some(tag) = registered else {
            debug!(
                union = S::NAME,
                discriminator = ?discriminator_of::<S::Variants>(&raw),
                "unrecognized variant, keeping raw payload"
            );
            return Ok(Self::unknown(raw, None));
        };

        match S::Variants::attempt_decode(tag, &raw) {
            Some(Ok(variant)) => Ok(Self {
                repr: Repr::Known {
                    variant,
                    raw: OnceLock::from(raw),
                },
                _schema: PhantomData,
            }),
            Some(Err(source)) => match S::POLICY {
                DecodePolicy::Lenient => {
                    warn!(
                        union = S::NAME,
                        variant = tag,
                        error = %source,
                        "payload does not fit its variant, keeping raw payload"
                    );
                    let rejected = Rejection {
                        variant: tag,
                        reason: source.to_string(),
                    };
                    Ok(Self::unknown(raw, Some(rejected)))
                }
                DecodePolicy::Strict => Err(PricingError::VariantDecodingFailed {
                    union: S::NAME,
                    variant: tag,
                    source,
                }),
            },
            None => Ok(Self::unknown(raw, None)),
        }
    }

    /// Decode from JSON text
    pub fn from_json_str(json: &str) -> PricingResult<Self> {
        Self::decode(serde_json::from_str(json)?)
    }

    /// Wrap an already decoded variant enum
    pub fn new(variants: S::Variants) -> Self {
        Self {
            repr: Repr::Known {
                variant: variants,
                raw: OnceLock::new(),
            },
            _schema: PhantomData,
        }
    }

    /// Wrap a single variant shape
    pub fn from_variant<T: VariantOf<S::Variants>>(value: T) -> Self {
        Self::new(value.inject())
    }

    fn unknown(raw: Value, rejected: Option<Rejection>) -> Self {
        Self {
            repr: Repr::Unknown { raw, rejected },
            _schema: PhantomData,
        }
    }

    /// Name of this union type, as used in errors
    pub fn union_name(&self) -> &'static str {
        S::NAME
    }

    pub fn is_known(&self) -> bool {
        matches!(self.repr, Repr::Known { .. })
    }

    /// Tag of the decoded variant; `None` when unknown
    pub fn tag(&self) -> Option<&'static str> {
        match &self.repr {
            Repr::Known { variant, .. } => Some(variant.tag()),
            Repr::Unknown { .. } => None,
        }
    }

    /// Discriminator value as seen on the wire, registered or not
    pub fn discriminator(&self) -> Option<&str> {
        match &self.repr {
            Repr::Known { variant, .. } => Some(variant.tag()),
            Repr::Unknown { raw, .. } => discriminator_of::<S::Variants>(raw),
        }
    }

    pub fn variant(&self) -> Option<&S::Variants> {
        match &self.repr {
            Repr::Known { variant, .. } => Some(variant),
            Repr::Unknown { .. } => None,
        }
    }

    pub fn into_variant(self) -> Option<S::Variants> {
        match self.repr {
            Repr::Known { variant, .. } => Some(variant),
            Repr::Unknown { .. } => None,
        }
    }

    /// The raw JSON this value was decoded from, or has cached since
    pub fn raw(&self) -> Option<&Value> {
        match &self.repr {
            Repr::Known { raw, .. } => raw.get(),
            Repr::Unknown { raw, .. } => Some(raw),
        }
    }

    /// Registered tag and decode error of a payload that did not fit its
    /// variant and was kept as unknown
    pub fn rejection(&self) -> Option<(&'static str, &str)> {
        match &self.repr {
            Repr::Unknown {
                rejected: Some(rejected),
                ..
            } => Some((rejected.variant, rejected.reason.as_str())),
            _ => None,
        }
    }

    /// Probe for a specific variant shape without failing
    pub fn try_get<T: VariantOf<S::Variants>>(&self) -> Option<&T> {
        self.variant().and_then(T::project)
    }

    /// The decoded variant, or [`PricingError::DispatchOnUnknown`]
    pub fn known(&self) -> PricingResult<&S::Variants> {
        self.variant()
            .ok_or(PricingError::DispatchOnUnknown { union: S::NAME })
    }

    /// Exhaustive dispatch: `f` receives the variant enum and matches on it
    pub fn visit<T>(&self, f: impl FnOnce(&S::Variants) -> T) -> PricingResult<T> {
        self.known().map(f)
    }

    /// Unknown payloads fail; known ones defer to their variant's validator
    pub fn validate(&self) -> PricingResult<()> {
        match &self.repr {
            Repr::Known { variant, .. } => variant.validate(),
            Repr::Unknown {
                rejected: Some(rejected),
                ..
            } => Err(PricingError::MalformedVariant {
                union: S::NAME,
                variant: rejected.variant,
                reason: rejected.reason.clone(),
            }),
            Repr::Unknown { raw, rejected: None } => Err(PricingError::UnrecognizedVariant {
                union: S::NAME,
                discriminator: discriminator_of::<S::Variants>(raw).map(str::to_string),
            }),
        }
    }

    /// JSON representation: the cached raw payload if any, else the encoded
    /// variant (which is then cached)
    pub fn to_json(&self) -> PricingResult<&Value> {
        match &self.repr {
            Repr::Unknown { raw, .. } => Ok(raw),
            Repr::Known { variant, raw } => {
                if let Some(cached) = raw.get() {
                    return Ok(cached);
                }
                let encoded = variant.encode()?;
                Ok(raw.get_or_init(|| encoded))
            }
        }
    }

    pub fn into_json(self) -> PricingResult<Value> {
        match self.repr {
            Repr::Unknown { raw, .. } => Ok(raw),
            Repr::Known { variant, raw } => match raw.into_inner() {
                Some(cached) => Ok(cached),
                None => Ok(variant.encode()?),
            },
        }
    }
}

impl<S: UnionSchema> Clone for TaggedUnion<S> {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Known { variant, raw } => Repr::Known {
                variant: variant.clone(),
                raw: raw.clone(),
            },
            Repr::Unknown { raw, rejected } => Repr::Unknown {
                raw: raw.clone(),
                rejected: rejected.clone(),
            },
        };
        Self {
            repr,
            _schema: PhantomData,
        }
    }
}

impl<S: UnionSchema> fmt::Debug for TaggedUnion<S>
where
    S::Variants: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Known { variant, .. } => f.debug_tuple(S::NAME).field(variant).finish(),
            Repr::Unknown { raw, .. } => f.debug_struct(S::NAME).field("unknown", raw).finish(),
        }
    }
}

/// Deep JSON equality; the active variant is not compared separately.
///
/// Falls back to comparing decoded variants when either side cannot be encoded.
impl<S: UnionSchema> PartialEq for TaggedUnion<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_json(), other.to_json()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.variant() == other.variant(),
        }
    }
}

impl<S: UnionSchema> Serialize for TaggedUnion<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.to_json()
            .map_err(<Ser::Error as ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de, S: UnionSchema> Deserialize<'de> for TaggedUnion<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(raw).map_err(de::Error::custom)
    }
}

/// Declare a variant registry enum and its codec plumbing.
///
/// ```ignore
/// union_variants! {
///     pub enum ShapeVariant on "kind" {
///         Circle(Circle) = "circle",
///         Square(Square) = "square",
///     }
/// }
/// ```
///
/// Each shape must be `Serialize + DeserializeOwned + ValidateModel` and
/// encode as a JSON object without the discriminator; it is stamped on by the
/// codec.
macro_rules! union_variants {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident on $disc:literal {
            $( $(#[$vmeta:meta])* $variant:ident($ty:ty) = $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant($ty), )+
        }

        impl $crate::union::UnionVariants for $name {
            const DISCRIMINATOR: &'static str = $disc;
            const TAGS: &'static [&'static str] = &[$($tag),+];

            fn attempt_decode(
                tag: &str,
                raw: &::serde_json::Value,
            ) -> Option<Result<Self, ::serde_json::Error>> {
                match tag {
                    $( $tag => Some($crate::union::decode_shape::<$ty>(raw).map($name::$variant)), )+
                    _ => None,
                }
            }

            fn encode(&self) -> Result<::serde_json::Value, ::serde_json::Error> {
                match self {
                    $( $name::$variant(inner) => $crate::union::encode_tagged($disc, $tag, inner), )+
                }
            }

            fn tag(&self) -> &'static str {
                match self {
                    $( $name::$variant(_) => $tag, )+
                }
            }

            fn validate(&self) -> $crate::error::PricingResult<()> {
                match self {
                    $( $name::$variant(inner) => $crate::union::ValidateModel::validate_model(inner), )+
                }
            }
        }

        $(
            impl $crate::union::VariantOf<$name> for $ty {
                fn project(variants: &$name) -> Option<&Self> {
                    match variants {
                        $name::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn inject(self) -> $name {
                    $name::$variant(self)
                }
            }

            impl<S> From<$ty> for $crate::union::TaggedUnion<S>
            where
                S: $crate::union::UnionSchema<Variants = $name>,
            {
                fn from(value: $ty) -> Self {
                    Self::from_variant(value)
                }
            }
        )+
    };
}

/// Named constructors, probes and handler-per-variant dispatch for one
/// concrete union type.
macro_rules! union_accessors {
    (
        $union:ty, $variants:ident {
            $( $variant:ident($ty:ty) => $from:ident, $try_get:ident, $on:ident );+ $(;)?
        }
    ) => {
        impl $union {
            $(
                #[doc = concat!("Wrap a [`", stringify!($ty), "`] as a known variant.")]
                pub fn $from(value: $ty) -> Self {
                    Self::from_variant(value)
                }

                #[doc = concat!("The decoded [`", stringify!($ty), "`], if it is the active variant.")]
                pub fn $try_get(&self) -> Option<&$ty> {
                    self.try_get::<$ty>()
                }
            )+

            /// Run exactly the handler matching the active variant.
            ///
            /// Fails with `DispatchOnUnknown` when the payload holds an unknown variant.
            pub fn switch(&self, $( $on: impl FnOnce(&$ty) ),+) -> $crate::error::PricingResult<()> {
                match self.known()? {
                    $( $variants::$variant(inner) => $on(inner), )+
                }
                Ok(())
            }

            /// Like `switch`, returning the handler's result.
            pub fn match_variant<T>(
                &self,
                $( $on: impl FnOnce(&$ty) -> T ),+
            ) -> $crate::error::PricingResult<T> {
                Ok(match self.known()? {
                    $( $variants::$variant(inner) => $on(inner), )+
                })
            }
        }
    };
}

pub(crate) use union_accessors;
pub(crate) use union_variants;
