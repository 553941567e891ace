pub mod error;
pub mod formats;
pub mod validation;

pub use error::{BridgeError, BridgeResult};
pub use formats::{decode_base64, decode_image_bgr, encode_base64, encode_png};
pub use validation::{validate_frame, validate_region};
