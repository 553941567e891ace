//! JSON request handling for the bridge surfaces.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::bridge::VisionBridge;
use crate::core::{BufferType, ObjectSpec, WrappedValue};
use crate::dispatch::Arg;
use crate::utils::{BridgeError, BridgeResult};

/// One host request, tagged by the surface it targets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    Invoke {
        verb: String,
        #[serde(default)]
        args: Vec<Arg>,
    },
    CreateObject {
        object: ObjectSpec,
    },
    ToValue {
        value: WrappedValue,
    },
    CopyObjectFromVector {
        vector: WrappedValue,
        index: usize,
    },
    FrameBufferToMat {
        rows: usize,
        cols: usize,
        channels: usize,
        data: Vec<u8>,
    },
    Base64ToMat {
        data: String,
    },
    MatToBuffer {
        mat: WrappedValue,
        #[serde(rename = "bufferType")]
        buffer_type: BufferType,
    },
    MatData {
        mat: WrappedValue,
    },
    MatRoi {
        mat: WrappedValue,
        rect: WrappedValue,
    },
    ClearBuffers,
}

impl Request {
    pub fn op(&self) -> &'static str {
        match self {
            Self::Invoke { .. } => "invoke",
            Self::CreateObject { .. } => "createObject",
            Self::ToValue { .. } => "toValue",
            Self::CopyObjectFromVector { .. } => "copyObjectFromVector",
            Self::FrameBufferToMat { .. } => "frameBufferToMat",
            Self::Base64ToMat { .. } => "base64ToMat",
            Self::MatToBuffer { .. } => "matToBuffer",
            Self::MatData { .. } => "matData",
            Self::MatRoi { .. } => "matRoi",
            Self::ClearBuffers => "clearBuffers",
        }
    }
}

fn to_json<T: Serialize>(value: T) -> BridgeResult<Value> {
    serde_json::to_value(value).map_err(|e| BridgeError::processing(format!("Failed to serialize result: {}", e)))
}

/// Runs one request against the bridge.
pub fn handle_request(bridge: &mut VisionBridge, request: Request) -> BridgeResult<Value> {
    debug!("Handling {} request", request.op());
    match request {
        Request::Invoke { verb, args } => to_json(bridge.invoke(&verb, &args)?),
        Request::CreateObject { object } => to_json(bridge.create_object(object)?),
        Request::ToValue { value } => bridge.to_value(&value),
        Request::CopyObjectFromVector { vector, index } => to_json(bridge.copy_object_from_vector(&vector, index)?),
        Request::FrameBufferToMat {
            rows,
            cols,
            channels,
            data,
        } => to_json(bridge.frame_buffer_to_mat(rows, cols, channels, &data)?),
        Request::Base64ToMat { data } => to_json(bridge.base64_to_mat(&data)?),
        Request::MatToBuffer { mat, buffer_type } => to_json(bridge.mat_to_buffer(&mat, buffer_type)?),
        Request::MatData { mat } => to_json(bridge.mat_data(&mat)?),
        Request::MatRoi { mat, rect } => to_json(bridge.mat_roi(&mat, &rect)?),
        Request::ClearBuffers => {
            bridge.clear_buffers();
            Ok(Value::Bool(true))
        }
    }
}

/// Envelope written back to the host: `{"ok": true, "result": ..}` or
/// `{"ok": false, "error": {"kind": .., "detail": ..}}`.
pub fn respond(result: BridgeResult<Value>) -> Value {
    match result {
        Ok(value) => json!({ "ok": true, "result": value }),
        Err(err) => json!({ "ok": false, "error": err }),
    }
}
