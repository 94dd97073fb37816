use std::{any::Any, cell::RefCell, rc::Rc};

use super::{Parameter, ParameterCore, ParameterRef, ParameterType};
use crate::{
    error::Error,
    value::{ObjectRef, Value},
};

// -------------------------------------------------------------------------------------------------

fn same_object(a: &Option<ObjectRef>, b: &Option<ObjectRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Shared object carried by the given value. `Empty` values clear the object.
fn object_from_value(value: Value) -> Result<Option<ObjectRef>, Error> {
    match value {
        Value::Object(object) => Ok(Some(object)),
        Value::Empty => Ok(None),
        other => Err(Error::TypeMismatch {
            expected: "object",
            found: other.kind_name(),
        }),
    }
}

// -------------------------------------------------------------------------------------------------

/// Provides a shared image resource. Images have no meaningful numeric representation.
#[derive(Debug)]
pub struct ImageProvider {
    core: ParameterCore,
    image: RefCell<Option<ObjectRef>>,
}

impl ImageProvider {
    pub fn new(name: &str) -> Self {
        Self {
            core: ParameterCore::new(name),
            image: RefCell::new(None),
        }
    }

    pub fn image(&self) -> Option<ObjectRef> {
        self.image.borrow().clone()
    }

    /// Replace the image. Images are compared by identity.
    pub fn set_image(&self, image: Option<ObjectRef>, update: bool) {
        let changed = !same_object(&self.image.borrow(), &image);
        self.core.commit(self, changed, update, || {
            *self.image.borrow_mut() = image;
        });
    }
}

impl Parameter for ImageProvider {
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
        ParameterType::Image
    }

    fn value(&self) -> Value {
        self.image().map(Value::Object).unwrap_or_default()
    }

    fn set_value(&self, value: Value, update: bool) {
        match object_from_value(value) {
            Ok(image) => self.set_image(image, update),
            Err(err) => log::warn!("Ignoring value for parameter '{}': {err}", self.name()),
        }
    }

    fn min(&self) -> Value {
        Value::Empty
    }

    fn max(&self) -> Value {
        Value::Empty
    }

    fn clone_parameter(&self) -> ParameterRef {
        Self {
            core: self.core.duplicate(),
            image: RefCell::new(self.image()),
        }
        .into_shared()
    }

    fn can_increment(&self) -> bool {
        false
    }

    fn increment(&self) {}

    fn decrement(&self) {}

    fn value_normalized(&self, _value: &Value) -> f64 {
        0.0
    }

    fn value_plain(&self, _normalized: f64) -> Value {
        self.value()
    }

    fn set_normalized(&self, _normalized: f64, _update: bool) {}

    fn string_for(&self, _value: &Value) -> String {
        String::new()
    }

    fn scan_string(&self, _text: &str) -> Option<Value> {
        None
    }
}

impl Drop for ImageProvider {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------

/// Provides a shared text model. The model's text is the parameter's string representation.
#[derive(Debug)]
pub struct TextModelProvider {
    core: ParameterCore,
    model: RefCell<Option<ObjectRef>>,
}

impl TextModelProvider {
    pub fn new(name: &str) -> Self {
        Self {
            core: ParameterCore::new(name),
            model: RefCell::new(None),
        }
    }

    pub fn text_model(&self) -> Option<ObjectRef> {
        self.model.borrow().clone()
    }

    /// Replace the text model. Models are compared by identity.
    pub fn set_text_model(&self, model: Option<ObjectRef>, update: bool) {
        let changed = !same_object(&self.model.borrow(), &model);
        self.core.commit(self, changed, update, || {
            *self.model.borrow_mut() = model;
        });
    }
}

impl Parameter for TextModelProvider {
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
        ParameterType::TextModel
    }

    fn value(&self) -> Value {
        self.text_model().map(Value::Object).unwrap_or_default()
    }

    fn set_value(&self, value: Value, update: bool) {
        match object_from_value(value) {
            Ok(model) => self.set_text_model(model, update),
            Err(err) => log::warn!("Ignoring value for parameter '{}': {err}", self.name()),
        }
    }

    fn min(&self) -> Value {
        Value::Empty
    }

    fn max(&self) -> Value {
        Value::Empty
    }

    fn clone_parameter(&self) -> ParameterRef {
        Self {
            core: self.core.duplicate(),
            model: RefCell::new(self.text_model()),
        }
        .into_shared()
    }

    fn can_increment(&self) -> bool {
        false
    }

    fn increment(&self) {}

    fn decrement(&self) {}

    fn value_normalized(&self, _value: &Value) -> f64 {
        0.0
    }

    fn value_plain(&self, _normalized: f64) -> Value {
        self.value()
    }

    fn set_normalized(&self, _normalized: f64, _update: bool) {}

    fn string_for(&self, value: &Value) -> String {
        value
            .as_object()
            .and_then(|object| object.as_text_model())
            .map(|model| model.to_param_string())
            .unwrap_or_default()
    }

    fn scan_string(&self, _text: &str) -> Option<Value> {
        None
    }

    /// Pass the text to the bound text model, which is modified in place.
    fn set_string(&self, text: &str, update: bool) {
        let Some(model) = self.text_model() else {
            log::warn!("Text model parameter '{}' has no model", self.name());
            return;
        };
        match model.as_text_model() {
            Some(text_model) => {
                if !text_model.from_param_string(text) {
                    log::warn!(
                        "Text model of parameter '{}' rejected text '{}'",
                        self.name(),
                        text
                    );
                    return;
                }
            }
            None => {
                log::warn!(
                    "Object '{}' of parameter '{}' is not a text model",
                    model.describe(),
                    self.name()
                );
                return;
            }
        }
        self.defer_changed();
        if update {
            self.perform_update();
        }
    }
}

impl Drop for TextModelProvider {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        signal::{self, MessageId},
        testing::{RecordingController, RecordingObserver},
        value::{SharedObject, TextModel},
    };

    #[derive(Debug, Default)]
    struct Bitmap;

    impl SharedObject for Bitmap {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug, Default)]
    struct Document {
        text: RefCell<String>,
    }

    impl SharedObject for Document {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_text_model(&self) -> Option<&dyn TextModel> {
            Some(self)
        }
    }

    impl TextModel for Document {
        fn to_param_string(&self) -> String {
            self.text.borrow().clone()
        }

        fn from_param_string(&self, text: &str) -> bool {
            if text.len() > 8 {
                return false;
            }
            *self.text.borrow_mut() = text.to_string();
            true
        }
    }

    #[test]
    fn object_values() {
        assert!(matches!(object_from_value(Value::Empty), Ok(None)));
        let bitmap: ObjectRef = Rc::new(Bitmap);
        assert!(matches!(
            object_from_value(Value::Object(bitmap.clone())),
            Ok(Some(object)) if Rc::ptr_eq(&object, &bitmap)
        ));
        assert_eq!(
            object_from_value(Value::Int(1)).err(),
            Some(Error::TypeMismatch {
                expected: "object",
                found: "int"
            })
        );
    }

    #[test]
    fn image_identity() {
        let controller = RecordingController::new();
        let param = ImageProvider::new("icon").into_shared();
        param.connect(controller.weak(), 1);
        assert!(param.value().is_empty());

        let bitmap: ObjectRef = Rc::new(Bitmap);
        param.set_value(Value::Object(bitmap.clone()), true);
        param.set_image(Some(bitmap.clone()), true);
        assert_eq!(controller.changed.borrow().len(), 1);
        assert!(param.image().is_some_and(|image| Rc::ptr_eq(&image, &bitmap)));

        // another instance is a change
        param.set_image(Some(Rc::new(Bitmap)), true);
        assert_eq!(controller.changed.borrow().len(), 2);

        // no numeric behavior
        param.increment();
        param.set_normalized(1.0, true);
        param.set_value(Value::Int(1), true);
        assert_eq!(controller.changed.borrow().len(), 2);
        assert!(!param.can_increment());
        assert_eq!(param.value_string(), "");

        param.set_value(Value::Empty, false);
        assert!(param.image().is_none());
    }

    #[test]
    fn text_model_strings() {
        signal::flush();
        let controller = RecordingController::new();
        let observer = RecordingObserver::new();
        let document = Rc::new(Document::default());
        let param = TextModelProvider::new("notes").into_shared();
        param.connect(controller.weak(), 2);
        param.add_observer(observer.weak());

        // no model: ignored
        param.set_string("lost", true);
        assert!(controller.changed.borrow().is_empty());

        param.set_text_model(Some(document.clone() as ObjectRef), false);
        param.set_string("hello", true);
        assert_eq!(*document.text.borrow(), "hello");
        assert_eq!(param.value_string(), "hello");
        assert_eq!(controller.changed.borrow().len(), 1);

        // rejected by the model
        param.set_string("much too long", true);
        assert_eq!(param.value_string(), "hello");
        assert_eq!(controller.changed.borrow().len(), 1);

        signal::flush();
        assert_eq!(observer.count(MessageId::Changed), 1);
        assert!(!param.can_increment());
    }
}
