//! Effect-only nodes

pub mod effects;

pub use effects::{
    EffectKind, EffectNode, EffectRequest, EffectSink, LogEffectSink, RecordingEffectSink,
};
