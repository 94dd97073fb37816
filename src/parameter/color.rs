use std::{
    any::Any,
    cell::{Cell, RefCell},
    fmt::{self, Debug},
    rc::Rc,
    str::FromStr,
};

use super::{Parameter, ParameterCore, ParameterRef, ParameterState, ParameterType};
use crate::{error::Error, value::Value};

// -------------------------------------------------------------------------------------------------

/// A packed `0xAARRGGBB` color.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn from_packed(packed: u32) -> Self {
        Self(packed)
    }

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::rgba(red, green, blue, 0xFF)
    }

    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self((alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32)
    }

    pub const fn packed(&self) -> u32 {
        self.0
    }

    pub const fn red(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(&self) -> u8 {
        self.0 as u8
    }

    pub const fn alpha(&self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({self})")
    }
}

/// `#RRGGBB` for opaque colors, else `#RRGGBBAA`.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red(), self.green(), self.blue())?;
        if self.alpha() != 0xFF {
            write!(f, "{:02X}", self.alpha())?;
        }
        Ok(())
    }
}

/// Parses `#RRGGBB` and `#RRGGBBAA` strings. The leading `#` is optional.
impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::ParseError(s.to_string()));
        }
        let code = u32::from_str_radix(hex, 16)?;
        if hex.len() == 6 {
            Ok(Self(0xFF00_0000 | code))
        } else {
            Ok(Self(code.rotate_right(8)))
        }
    }
}

impl From<Color> for Value {
    fn from(color: Color) -> Self {
        Value::Int(color.packed() as i64)
    }
}

// -------------------------------------------------------------------------------------------------

/// An ordered set of colors to pick from.
pub trait ColorPalette: Debug {
    fn count(&self) -> usize;
    fn color_at(&self, index: usize) -> Option<Color>;

    fn index_of(&self, color: Color) -> Option<usize> {
        (0..self.count()).find(|index| self.color_at(*index) == Some(color))
    }

    /// The color after the given one. Colors which are not part of the palette step to the
    /// first color.
    fn next_color(&self, color: Color, wrap: bool) -> Color {
        let count = self.count();
        let next = match self.index_of(color) {
            Some(index) if index + 1 < count => index + 1,
            Some(_) if !wrap => return color,
            _ => 0,
        };
        self.color_at(next).unwrap_or(color)
    }

    /// The color before the given one. Colors which are not part of the palette step to the
    /// last color.
    fn prev_color(&self, color: Color, wrap: bool) -> Color {
        let count = self.count();
        let prev = match self.index_of(color) {
            Some(index) if index > 0 => index - 1,
            Some(_) if !wrap => return color,
            _ => count.saturating_sub(1),
        };
        self.color_at(prev).unwrap_or(color)
    }
}

impl ColorPalette for Vec<Color> {
    fn count(&self) -> usize {
        self.len()
    }

    fn color_at(&self, index: usize) -> Option<Color> {
        self.get(index).copied()
    }
}

// -------------------------------------------------------------------------------------------------

/// A color parameter. The plain value is the packed color code.
///
/// With a palette attached, the parameter can be incremented and decremented, stepping through
/// the palette's colors.
#[derive(Debug)]
pub struct ColorParam {
    core: ParameterCore,
    color: Cell<Color>,
    palette: RefCell<Option<Rc<dyn ColorPalette>>>,
}

const RGB_MASK: u32 = 0x00FF_FFFF;

impl ColorParam {
    pub fn new(name: &str) -> Self {
        let core = ParameterCore::new(name);
        core.set_default_value(Color::BLACK.into());
        Self {
            core,
            color: Cell::new(Color::BLACK),
            palette: RefCell::new(None),
        }
    }

    /// Set the initial and default color.
    pub fn with_default(self, color: Color) -> Self {
        self.core.set_default_value(color.into());
        self.color.set(color);
        self
    }

    pub fn with_palette(self, palette: Rc<dyn ColorPalette>) -> Self {
        *self.palette.borrow_mut() = Some(palette);
        self
    }

    pub fn color(&self) -> Color {
        self.color.get()
    }

    pub fn set_color(&self, color: Color, update: bool) {
        let changed = color != self.color.get();
        self.core
            .commit(self, changed, update, || self.color.set(color));
    }

    pub fn palette(&self) -> Option<Rc<dyn ColorPalette>> {
        self.palette.borrow().clone()
    }

    pub fn set_palette(&self, palette: Option<Rc<dyn ColorPalette>>) {
        *self.palette.borrow_mut() = palette;
        self.core.range_changed(self);
    }

    /// To be called when the attached palette's colors changed. Mutable parameters then notify
    /// their observers about a range change.
    pub fn palette_changed(&self) {
        if self.state(ParameterState::Mutable) {
            self.core.range_changed(self);
        }
    }

    /// Read a single bit of the packed color code. Bits 0 to 31 are valid, all others read as
    /// unset.
    pub fn is_bit_set(&self, index: u32) -> bool {
        index < 32 && self.color.get().packed() & (1 << index) != 0
    }

    /// Write a single bit of the packed color code and notify the controller. Invalid bit
    /// indices are ignored.
    pub fn set_bit(&self, index: u32, state: bool) {
        if index >= 32 {
            log::warn!("Ignoring invalid color bit index {index}");
            return;
        }
        let packed = self.color.get().packed();
        let packed = if state {
            packed | (1 << index)
        } else {
            packed & !(1 << index)
        };
        self.set_color(Color::from_packed(packed), true);
    }

    fn color_from_value(value: &Value) -> Option<Color> {
        match value {
            Value::String(text) => Color::from_str(text)
                .ok()
                .or_else(|| text.trim().parse::<u32>().ok().map(Color::from_packed)),
            value if value.is_numeric() => Some(Color::from_packed(value.as_int() as u32)),
            _ => None,
        }
    }
}

impl Parameter for ColorParam {
    fn core(&self) -> &ParameterCore {
        &self.core
    }

    fn as_parameter(&self) -> &dyn Parameter {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Color
    }

    fn value(&self) -> Value {
        self.color.get().into()
    }

    fn set_value(&self, value: Value, update: bool) {
        match Self::color_from_value(&value) {
            Some(color) => self.set_color(color, update),
            None => log::warn!(
                "Invalid value type '{}' for color parameter '{}'",
                value.kind_name(),
                self.name()
            ),
        }
    }

    fn min(&self) -> Value {
        Value::Int(0)
    }

    fn max(&self) -> Value {
        Value::Int(u32::MAX as i64)
    }

    fn clone_parameter(&self) -> ParameterRef {
        Self {
            core: self.core.duplicate(),
            color: self.color.clone(),
            palette: RefCell::new(self.palette()),
        }
        .into_shared()
    }

    fn can_increment(&self) -> bool {
        self.palette.borrow().is_some()
    }

    fn increment(&self) {
        if let Some(palette) = self.palette() {
            self.set_color(palette.next_color(self.color.get(), false), true);
        }
    }

    fn decrement(&self) {
        if let Some(palette) = self.palette() {
            self.set_color(palette.prev_color(self.color.get(), false), true);
        }
    }

    fn value_normalized(&self, value: &Value) -> f64 {
        let code = value.as_int() as u32 & RGB_MASK;
        code as f64 / RGB_MASK as f64
    }

    fn value_plain(&self, normalized: f64) -> Value {
        let code = (normalized.clamp(0.0, 1.0) * RGB_MASK as f64) as u32 & RGB_MASK;
        Value::Int(code as i64)
    }

    fn string_for(&self, value: &Value) -> String {
        Self::color_from_value(value)
            .map(|color| color.to_string())
            .unwrap_or_default()
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        Color::from_str(text).ok().map(Value::from)
    }
}

impl Drop for ColorParam {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------
