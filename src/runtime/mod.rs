#[cfg(target_arch = "wasm32")]
pub mod wasm;
#[cfg(target_arch = "wasm32")]
pub use wasm::WasmSynth;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(not(target_arch = "wasm32"))]
pub use native::{Controller, NativeSynth};
#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub use native::{start, NativeRuntime};
