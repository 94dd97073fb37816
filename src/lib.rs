#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod alias;
mod container;
mod controller;
mod error;
mod parameter;
mod proxy;
mod value;

#[cfg(test)]
mod testing;

// public, flat re-exports
pub use error::Error;

pub use value::{ObjectRef, SharedObject, TextModel, Value};

pub use signal::{Message, MessageId, Observer, ObserverList};

pub use controller::{
    command_dispatcher, set_command_dispatcher, CommandDispatcher, CommandMsg, Controller,
};

pub use parameter::{
    downcast_parameter, inc_dec_normalized, same_parameter, Color, ColorPalette, ColorParam,
    CommandParam, FloatParam, ImageProvider, IntParam, ListEntry, ListParam, NormalizedValue,
    Parameter, ParameterCore, ParameterRef, ParameterState, ParameterStates, ParameterType,
    ScrollParam, StringParam, TextModelProvider, ToggleParam,
};

pub use alias::AliasParam;

pub use proxy::{MultiSourceProxy, ProxyPolicy};

pub use container::{
    persistence::{persistence_key, persistent_value, restore_value, AttributeStore, Attributes},
    IndexedArray, ParameterContainer,
};

// public mods
pub mod signal;
pub mod utils;

pub mod curves {
    //! Curves which map a parameter's normalized value to a display position.

    pub use super::parameter::{
        create_curve, ConcaveCurve, ConvexCurve, CurveKind, InterpolatorCurve, ParameterCurve,
        RangeFunction, Scaling,
    };
}

pub mod formatters {
    //! Value to text converters which can be attached to parameters.

    pub use super::parameter::{
        FloatFormatter, FnFormatter, Formatter, IntFormatter, PercentFormatter,
        StringListFormatter,
    };
}
