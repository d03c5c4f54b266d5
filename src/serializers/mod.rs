//! Payload serialization subsystem.
//!
//! # Data Flow
//! ```text
//! Operation registration (typed Req/Res)
//!     → TypedCodec::of::<T>() captures the serde entry points once
//!     → stored on the Operation, erased behind Any
//!
//! Per request:
//!     negotiated Format + body bytes → TypedCodec::decode → Box<dyn Any>
//!     response Any + Format → TypedCodec::encode → bytes
//! ```
//!
//! # Design Decisions
//! - No runtime type introspection: every codec closure is bound at
//!   registration, mirroring the once-bound operation invoker
//! - JSON/XML/CSV ride serde_json, quick-xml, and csv; JSV is in-crate
//! - SOAP body payloads reuse the XML entry points; envelope handling is
//!   the soap module's concern

pub mod jsv;
pub mod kv;

use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::content::Format;
use crate::errors::CodecError;

/// An erased request or response payload.
pub type BoxedValue = Box<dyn Any + Send>;

/// Deserialize `bytes` in the given wire format.
pub fn decode_body<T: DeserializeOwned>(format: Format, bytes: &[u8]) -> Result<T, CodecError> {
    match format {
        Format::Json => Ok(serde_json::from_slice(bytes)?),
        Format::Xml | Format::Soap11 | Format::Soap12 => {
            let text = std::str::from_utf8(bytes).map_err(|e| CodecError::Xml(e.to_string()))?;
            quick_xml::de::from_str(text).map_err(|e| CodecError::Xml(e.to_string()))
        }
        Format::Jsv => jsv::decode(bytes),
        Format::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_reader(bytes);
            match reader.deserialize::<T>().next() {
                Some(record) => Ok(record?),
                None => Err(CodecError::Binding("empty csv body".to_string())),
            }
        }
    }
}

/// Serialize `value` in the given wire format.
pub fn encode_body<T: Serialize>(format: Format, value: &T) -> Result<Vec<u8>, CodecError> {
    match format {
        Format::Json => Ok(serde_json::to_vec(value)?),
        Format::Xml | Format::Soap11 | Format::Soap12 => {
            let text = quick_xml::se::to_string(value).map_err(|e| CodecError::Xml(e.to_string()))?;
            Ok(text.into_bytes())
        }
        Format::Jsv => jsv::encode(value),
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.serialize(value)?;
            writer
                .into_inner()
                .map_err(|e| CodecError::Binding(e.to_string()))
        }
    }
}

/// Strip module path and generics from a type name.
pub fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Serialization entry points for one message type, captured at operation
/// registration and erased so the pipeline stays monomorphization-free.
#[derive(Clone)]
pub struct TypedCodec {
    type_name: &'static str,
    decode: Arc<dyn Fn(Format, &[u8]) -> Result<BoxedValue, CodecError> + Send + Sync>,
    encode: Arc<dyn Fn(Format, &dyn Any) -> Result<Vec<u8>, CodecError> + Send + Sync>,
    default_value: Arc<dyn Fn() -> BoxedValue + Send + Sync>,
    merge_pairs:
        Arc<dyn Fn(BoxedValue, &[(String, String)]) -> Result<BoxedValue, CodecError> + Send + Sync>,
    inspect: Arc<dyn Fn(&dyn Any) -> Result<serde_json::Value, CodecError> + Send + Sync>,
}

impl std::fmt::Debug for TypedCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCodec")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl TypedCodec {
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Default + Send + 'static,
    {
        Self {
            type_name: short_type_name::<T>(),
            decode: Arc::new(|format, bytes| {
                let value: T = decode_body(format, bytes)?;
                Ok(Box::new(value) as BoxedValue)
            }),
            encode: Arc::new(|format, any| {
                let value = any
                    .downcast_ref::<T>()
                    .ok_or_else(|| CodecError::Binding("payload type mismatch".to_string()))?;
                encode_body(format, value)
            }),
            default_value: Arc::new(|| Box::new(T::default()) as BoxedValue),
            merge_pairs: Arc::new(|boxed, pairs| {
                let value = *boxed
                    .downcast::<T>()
                    .map_err(|_| CodecError::Binding("payload type mismatch".to_string()))?;
                let merged: T = kv::merge(value, pairs)?;
                Ok(Box::new(merged) as BoxedValue)
            }),
            inspect: Arc::new(|any| {
                let value = any
                    .downcast_ref::<T>()
                    .ok_or_else(|| CodecError::Binding("payload type mismatch".to_string()))?;
                Ok(serde_json::to_value(value)?)
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn decode(&self, format: Format, bytes: &[u8]) -> Result<BoxedValue, CodecError> {
        (self.decode)(format, bytes)
    }

    pub fn encode(&self, format: Format, value: &dyn Any) -> Result<Vec<u8>, CodecError> {
        (self.encode)(format, value)
    }

    /// A non-null default instance; the empty-body fallback.
    pub fn default_value(&self) -> BoxedValue {
        (self.default_value)()
    }

    /// Overlay route/query/form pairs onto an existing instance.
    pub fn merge_pairs(
        &self,
        value: BoxedValue,
        pairs: &[(String, String)],
    ) -> Result<BoxedValue, CodecError> {
        (self.merge_pairs)(value, pairs)
    }

    /// JSON value tree of the payload, for the debug-inspection mode.
    pub fn inspect(&self, value: &dyn Any) -> Result<serde_json::Value, CodecError> {
        (self.inspect)(value)
    }
}
