//! Browser bindings.
//!
//! Threads are not available to wasm here, so the host runs these entry
//! points inside its own Web Worker and posts the returned matrix back to
//! the page. Each call decodes one request JSON string and runs the
//! matching engine synchronously.

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

use crate::engine::{
    ComputeEngine, ContactFrequencyEngine, DistanceMatrixEngine,
};
use crate::options::Options;
use crate::transport::codec::decode_request;
use crate::transport::{ComputeResponse, Mode};

/// Route `log` output to the browser console and report panics there.
#[wasm_bindgen(js_name = initLivemap)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Result of one computation as seen from JavaScript.
#[wasm_bindgen]
pub struct WebResponse {
    response: ComputeResponse,
}

#[wasm_bindgen]
impl WebResponse {
    /// `"trace"` or `"ensemble"`.
    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        match self.response.mode {
            Mode::Trace => "trace".to_owned(),
            Mode::Ensemble => "ensemble".to_owned(),
        }
    }

    /// Row-major matrix cells; `-1` marks an undefined distance.
    #[wasm_bindgen(getter, js_name = matrixBuffer)]
    pub fn matrix_buffer(&self) -> Float32Array {
        Float32Array::from(self.response.matrix_buffer.as_slice())
    }

    /// Largest distance, `undefined` for contact results and for traces
    /// without a defined pair.
    #[wasm_bindgen(getter, js_name = maxDistance)]
    pub fn max_distance(&self) -> Option<f64> {
        self.response.max_distance
    }
}

fn run(
    engine: &impl ComputeEngine,
    request_json: &str,
) -> Result<WebResponse, JsError> {
    let request = decode_request(request_json.as_bytes())?;
    let response = engine.execute(&request)?;
    Ok(WebResponse { response })
}

/// Contact-frequency matrix for a request, using default options.
///
/// # Errors
///
/// A `JsError` carrying the decode or compute failure.
#[wasm_bindgen(js_name = computeContactFrequency)]
pub fn compute_contact_frequency(
    request_json: &str,
) -> Result<WebResponse, JsError> {
    run(&ContactFrequencyEngine::default(), request_json)
}

/// Contact-frequency matrix for a request, with options given as TOML.
///
/// # Errors
///
/// A `JsError` if the options do not parse or the computation fails.
#[wasm_bindgen(js_name = computeContactFrequencyWithOptions)]
pub fn compute_contact_frequency_with_options(
    request_json: &str,
    options_toml: &str,
) -> Result<WebResponse, JsError> {
    let options = Options::from_toml(options_toml)?;
    run(&ContactFrequencyEngine::new(&options), request_json)
}

/// Distance matrix (single trace or ensemble average) for a request.
///
/// # Errors
///
/// A `JsError` carrying the decode or compute failure.
#[wasm_bindgen(js_name = computeDistanceMatrix)]
pub fn compute_distance_matrix(
    request_json: &str,
) -> Result<WebResponse, JsError> {
    run(&DistanceMatrixEngine::default(), request_json)
}
