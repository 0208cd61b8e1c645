//! Configuration models for classification, scheduling and admission.

pub mod dispatch;

pub use dispatch::{
    AdmissionConfig, ClassifierConfig, DispatchConfig, SchedulingConfig, CONFIG_PATH_ENV,
    DEFAULT_POLICY_ENV,
};
