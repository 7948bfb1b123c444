//! Windowed multi-step sequence forecasting

pub mod calendar;
pub mod device;
pub mod forecaster;
pub mod handle;
pub mod model;
pub mod scaler;
pub mod weights;

pub use calendar::DateStep;
pub use device::{Device, DevicePreference};
pub use forecaster::{ForecastPoint, Forecaster};
pub use handle::ModelHandle;
pub use model::{SequenceModel, TransAm};
pub use scaler::MinMaxScaler;
pub use weights::{ModelConfig, ModelWeights, TensorData};
