//! Inbound frame decoding.

use std::borrow::Cow;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Error when decode an inbound frame as operation
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum DecodeError {
    /// data is invalid json
    #[snafu(display("parse json failed: {source}"))]
    ParseJSONFailed {
        /// data for decode
        data: Bytes,
        /// source error
        source: serde_json::Error,
    },

    /// data json is not an object
    #[snafu(display("parsed message is not object: {json}"))]
    MessageNotObject {
        /// json string
        json: String,
    },

    /// data json has no operation tag field
    #[snafu(display("message has no {field} field: {json}"))]
    NoOperation {
        /// tag field name
        field: String,
        /// json string
        json: String,
    },

    /// operation tag is not a string
    #[snafu(display("message has non-string {field} field: {json}"))]
    OperationNotString {
        /// tag field name
        field: String,
        /// json string
        json: String,
    },
}

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// operation tag
    pub op: String,
    /// operation payload, `null` when the frame carries none
    pub data: serde_json::Value,
}

impl Operation {
    /// Create an operation
    pub fn new<S: Into<String>>(op: S, data: serde_json::Value) -> Self {
        Self { op: op.into(), data }
    }
}

/// Classify an inbound frame into an [`Operation`].
pub trait Decoder: Send + 'static {
    /// decode one frame
    fn decode(&self, frame: &Bytes) -> Result<Operation, DecodeError>;
}

impl<F> Decoder for F
where
    F: Fn(&Bytes) -> Result<Operation, DecodeError> + Send + 'static,
{
    fn decode(&self, frame: &Bytes) -> Result<Operation, DecodeError> {
        self(frame)
    }
}

/// Decode json object frames like `{"op": "block", "x": {...}}`.
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    tag_field: Cow<'static, str>,
    data_field: Cow<'static, str>,
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::new("op", "x")
    }
}

impl JsonDecoder {
    /// Create a decoder reading the operation tag from `tag_field` and payload from `data_field`
    pub fn new<T, D>(tag_field: T, data_field: D) -> Self
    where
        T: Into<Cow<'static, str>>,
        D: Into<Cow<'static, str>>,
    {
        Self {
            tag_field: tag_field.into(),
            data_field: data_field.into(),
        }
    }
}

impl Decoder for JsonDecoder {
    fn decode(&self, frame: &Bytes) -> Result<Operation, DecodeError> {
        let mut value: serde_json::Value =
            serde_json::from_slice(frame).context(error::ParseJSONFailed { data: frame.clone() })?;

        let obj = value
            .as_object_mut()
            .with_context(|| error::MessageNotObject {
                json: String::from_utf8_lossy(frame),
            })?;

        let op = obj
            .get(self.tag_field.as_ref())
            .with_context(|| error::NoOperation {
                field: self.tag_field.as_ref(),
                json: String::from_utf8_lossy(frame),
            })?
            .as_str()
            .with_context(|| error::OperationNotString {
                field: self.tag_field.as_ref(),
                json: String::from_utf8_lossy(frame),
            })?
            .to_string();

        let data = obj
            .remove(self.data_field.as_ref())
            .unwrap_or(serde_json::Value::Null);

        Ok(Operation { op, data })
    }
}
