//! Owning collections of parameters with lookup, bulk operations and persistence.

use std::rc::{Rc, Weak};

use crate::{
    alias::AliasParam,
    controller::Controller,
    error::Error,
    parameter::{
        downcast_parameter, same_parameter, ColorParam, CommandParam, FloatParam, ImageProvider,
        IntParam, ListParam, Parameter, ParameterRef, ParameterState, ScrollParam, StringParam,
        TextModelProvider, ToggleParam,
    },
};

// -------------------------------------------------------------------------------------------------

pub mod persistence;
use persistence::{persistence_key, persistent_value, AttributeStore};

// -------------------------------------------------------------------------------------------------

/// A named group of sibling parameters, e.g. one parameter per row of a list view, which can be
/// accessed by index.
#[derive(Debug, Clone)]
pub struct IndexedArray {
    name: String,
    params: Vec<ParameterRef>,
}

impl IndexedArray {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<ParameterRef> {
        self.params.get(index).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterRef> {
        self.params.iter()
    }
}

// -------------------------------------------------------------------------------------------------

/// Owns a set of parameters, which all get connected to the container's controller.
///
/// Parameters are created with the `add_*` factory functions, which connect them to the
/// container's controller with the given tag. Tags are caller chosen correlation keys and don't
/// need to be unique.
#[derive(Debug, Default)]
pub struct ParameterContainer {
    params: Vec<ParameterRef>,
    arrays: Vec<IndexedArray>,
    controller: Option<Weak<dyn Controller>>,
}

impl ParameterContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container which connects its parameters to the given controller.
    pub fn with_controller(controller: Weak<dyn Controller>) -> Self {
        Self {
            controller: Some(controller),
            ..Self::default()
        }
    }

    pub fn controller(&self) -> Option<Rc<dyn Controller>> {
        self.controller.as_ref().and_then(Weak::upgrade)
    }

    /// Set a new controller and reconnect all parameters, keeping their tags.
    pub fn set_controller(&mut self, controller: Option<Weak<dyn Controller>>) {
        self.controller = controller;
        for param in &self.params {
            param.connect(self.controller.clone(), param.tag());
        }
    }

    // ---------------------------------------------------------------------------------------------

    /// Take ownership of an already created parameter, connecting it with the given tag.
    pub fn add<P: Parameter + 'static>(&mut self, param: Rc<P>, tag: i32) -> Rc<P> {
        param.connect(self.controller.clone(), tag);
        self.params.push(param.clone());
        param
    }

    /// Add a toggle parameter.
    pub fn add_param(&mut self, name: &str, tag: i32) -> Rc<ToggleParam> {
        self.add(ToggleParam::new(name).into_shared(), tag)
    }

    pub fn add_integer(&mut self, min: i64, max: i64, name: &str, tag: i32) -> Rc<IntParam> {
        self.add(IntParam::new(min, max, name).into_shared(), tag)
    }

    pub fn add_float(&mut self, min: f64, max: f64, name: &str, tag: i32) -> Rc<FloatParam> {
        self.add(FloatParam::new(min, max, name).into_shared(), tag)
    }

    pub fn add_string(&mut self, name: &str, tag: i32) -> Rc<StringParam> {
        self.add(StringParam::new(name).into_shared(), tag)
    }

    pub fn add_list(&mut self, name: &str, tag: i32) -> Rc<ListParam> {
        self.add(ListParam::new(name).into_shared(), tag)
    }

    /// Add a list which is used as a menu: a transient selection which doesn't get persisted.
    pub fn add_menu(&mut self, name: &str, tag: i32) -> Rc<ListParam> {
        let menu = ListParam::new(name).with_state(ParameterState::Storable, false);
        self.add(menu.into_shared(), tag)
    }

    pub fn add_color(&mut self, name: &str, tag: i32) -> Rc<ColorParam> {
        self.add(ColorParam::new(name).into_shared(), tag)
    }

    pub fn add_image(&mut self, name: &str, tag: i32) -> Rc<ImageProvider> {
        self.add(ImageProvider::new(name).into_shared(), tag)
    }

    pub fn add_text_model(&mut self, name: &str, tag: i32) -> Rc<TextModelProvider> {
        self.add(TextModelProvider::new(name).into_shared(), tag)
    }

    /// Add a command parameter. Commands are not storable.
    pub fn add_command(
        &mut self,
        category: &str,
        command: &str,
        name: &str,
        tag: i32,
    ) -> Rc<CommandParam> {
        let param = CommandParam::new(name, category, command)
            .with_state(ParameterState::Storable, false);
        self.add(param.into_shared(), tag)
    }

    pub fn add_scroll(&mut self, name: &str, tag: i32) -> Rc<ScrollParam> {
        self.add(ScrollParam::new(name).into_shared(), tag)
    }

    /// Add an unbound alias. Aliases are not storable: their originals usually are persisted by
    /// their own containers.
    pub fn add_alias(&mut self, name: &str, tag: i32) -> Rc<AliasParam> {
        let alias = AliasParam::new(name);
        alias.set_state(ParameterState::Storable, false);
        self.add(alias, tag)
    }

    // ---------------------------------------------------------------------------------------------

    pub fn count(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<ParameterRef> {
        self.params.get(index).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterRef> {
        self.params.iter()
    }

    pub fn index_of(&self, param: &dyn Parameter) -> Option<usize> {
        self.params
            .iter()
            .position(|p| same_parameter(p.as_ref(), param))
    }

    /// First parameter with the given name.
    pub fn lookup(&self, name: &str) -> Option<ParameterRef> {
        self.params.iter().find(|p| p.name() == name).cloned()
    }

    /// First parameter with the given name, downcasted to its concrete type.
    pub fn lookup_as<P: Parameter + 'static>(&self, name: &str) -> Option<Rc<P>> {
        self.lookup(name).and_then(downcast_parameter::<P>)
    }

    /// First parameter with the given tag.
    pub fn by_tag(&self, tag: i32) -> Option<ParameterRef> {
        self.params.iter().find(|p| p.tag() == tag).cloned()
    }

    /// First command parameter which sends the given command.
    pub fn by_command(&self, category: &str, name: &str) -> Option<Rc<CommandParam>> {
        self.params
            .iter()
            .find(|p| {
                p.as_command().is_some_and(|command| {
                    command.command_category() == category && command.command_name() == name
                })
            })
            .cloned()
            .and_then(downcast_parameter::<CommandParam>)
    }

    /// Remove a parameter from the container and all arrays. Returns false when the parameter
    /// is not part of this container.
    pub fn remove(&mut self, param: &dyn Parameter) -> bool {
        let Some(index) = self.index_of(param) else {
            return false;
        };
        for array in &mut self.arrays {
            array.params.retain(|p| !same_parameter(p.as_ref(), param));
        }
        let removed = self.params.remove(index);
        removed.connect(None, removed.tag());
        true
    }

    /// Remove all parameters and arrays.
    pub fn remove_all(&mut self) {
        self.arrays.clear();
        for param in self.params.drain(..) {
            param.connect(None, param.tag());
        }
    }

    // ---------------------------------------------------------------------------------------------

    /// Create a new, empty indexed array. Returns false if an array with this name exists.
    pub fn add_array(&mut self, name: &str) -> bool {
        if self.array(name).is_some() {
            return false;
        }
        self.arrays.push(IndexedArray::new(name));
        true
    }

    pub fn array(&self, name: &str) -> Option<&IndexedArray> {
        self.arrays.iter().find(|array| array.name == name)
    }

    /// Append a parameter of this container to the given array, creating the array if needed.
    /// Returns the parameter's index in the array.
    pub fn add_to_array(&mut self, name: &str, param: ParameterRef) -> usize {
        debug_assert!(
            self.index_of(param.as_ref()).is_some(),
            "Expecting the parameter to be part of the container"
        );
        let index = match self.arrays.iter().position(|array| array.name == name) {
            Some(index) => index,
            None => {
                self.arrays.push(IndexedArray::new(name));
                self.arrays.len() - 1
            }
        };
        let array = &mut self.arrays[index];
        array.params.push(param);
        array.params.len() - 1
    }

    pub fn lookup_indexed(&self, name: &str, index: usize) -> Option<ParameterRef> {
        self.array(name).and_then(|array| array.at(index))
    }

    // ---------------------------------------------------------------------------------------------

    /// Reset all parameters to their default values.
    pub fn set_default_values(&self, update: bool) {
        for param in &self.params {
            param.reset_value(update);
        }
    }

    pub fn enable_all(&self, state: bool) {
        for param in &self.params {
            param.enable(state);
        }
    }

    /// Add clones of all parameters of another container, connected to this container's
    /// controller with their original tags.
    pub fn add_parameters_from(&mut self, other: &ParameterContainer) {
        for param in &other.params {
            let clone = param.clone_parameter();
            clone.connect(self.controller.clone(), param.tag());
            self.params.push(clone);
        }
    }

    // ---------------------------------------------------------------------------------------------

    /// Write the values of all parameters, or only the storable ones, into the given store.
    pub fn store_values(&self, store: &mut dyn AttributeStore, storable_only: bool) {
        for param in &self.params {
            if storable_only && !param.state(ParameterState::Storable) {
                continue;
            }
            let key = persistence_key(param.as_ref());
            if key.is_empty() {
                continue;
            }
            if let Some(value) = persistent_value(param.as_ref()) {
                store.set(&key, value);
            }
        }
    }

    /// Restore values of all parameters, or only the storable ones, from the given store. Values
    /// which are missing or can't be applied are skipped. Returns the number of restored values.
    pub fn restore_values(
        &self,
        store: &dyn AttributeStore,
        storable_only: bool,
        update: bool,
    ) -> usize {
        let mut restored = 0;
        for param in &self.params {
            if storable_only && !param.state(ParameterState::Storable) {
                continue;
            }
            if persistent_value(param.as_ref()).is_none() {
                continue;
            }
            let key = persistence_key(param.as_ref());
            let Some(value) = store.get(&key) else {
                continue;
            };
            match persistence::restore_value(param.as_ref(), &value, update) {
                Ok(()) => restored += 1,
                Err(err) => log::warn!("Failed to restore parameter '{key}': {err}"),
            }
        }
        restored
    }

    /// Write a single parameter's value into the given store.
    pub fn store_value(&self, store: &mut dyn AttributeStore, param: &dyn Parameter) -> bool {
        let key = persistence_key(param);
        debug_assert!(!key.is_empty(), "Expecting a named parameter");
        match persistent_value(param) {
            Some(value) if !key.is_empty() => {
                store.set(&key, value);
                true
            }
            _ => false,
        }
    }

    /// Restore a single parameter's value from the given store.
    pub fn restore_value(
        &self,
        store: &dyn AttributeStore,
        param: &dyn Parameter,
        update: bool,
    ) -> Result<(), Error> {
        let key = persistence_key(param);
        let value = store
            .get(&key)
            .ok_or_else(|| Error::ParameterNotFound(key.clone()))?;
        persistence::restore_value(param, &value, update)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        container::persistence::Attributes,
        testing::{create_logger, RecordingController},
        value::Value,
    };

    #[test]
    fn factories_and_lookup() {
        let controller = RecordingController::new();
        let mut container = ParameterContainer::new();
        container.set_controller(controller.weak());

        let volume = container.add_float(0.0, 1.0, "volume", 1);
        let mute = container.add_param("mute", 2);
        container.add_command("File", "Save", "save", 3);
        container.add_list("mode", 4);
        assert_eq!(container.count(), 4);

        assert!(container
            .lookup("volume")
            .is_some_and(|p| same_parameter(p.as_ref(), volume.as_ref())));
        assert!(container.lookup_as::<FloatParam>("volume").is_some());
        assert!(container.lookup_as::<IntParam>("volume").is_none());
        assert!(container.lookup("missing").is_none());
        assert_eq!(container.by_tag(2).map(|p| p.name()), Some("mute".to_string()));
        assert!(container.by_command("File", "Save").is_some());
        assert!(container.by_command("File", "Open").is_none());
        assert_eq!(container.index_of(mute.as_ref()), Some(1));

        volume.set_value(Value::Float(0.5), true);
        mute.set_value(Value::Int(1), true);
        assert_eq!(
            *controller.changed.borrow(),
            vec![(1, Value::Float(0.5)), (2, Value::Int(1))]
        );

        assert!(container.remove(volume.as_ref()));
        assert!(!container.remove(volume.as_ref()));
        assert!(volume.controller().is_none());
        assert_eq!(container.count(), 3);
        container.remove_all();
        assert!(container.is_empty());
    }

    #[test]
    fn arrays() {
        let mut container = ParameterContainer::new();
        for row in 0..3 {
            let param = container.add_param(&format!("row{row}"), row);
            container.add_to_array("rows", param);
        }
        assert!(!container.add_array("rows"));
        assert_eq!(container.array("rows").map(IndexedArray::len), Some(3));
        assert_eq!(
            container.lookup_indexed("rows", 1).map(|p| p.name()),
            Some("row1".to_string())
        );
        assert!(container.lookup_indexed("rows", 3).is_none());
        assert!(container.lookup_indexed("columns", 0).is_none());

        let row1 = container.lookup("row1").unwrap();
        container.remove(row1.as_ref());
        assert_eq!(
            container.lookup_indexed("rows", 1).map(|p| p.name()),
            Some("row2".to_string())
        );
    }

    #[test]
    fn bulk_operations() {
        let mut container = ParameterContainer::new();
        let int = container.add(IntParam::new(0, 10, "int").with_default(5).into_shared(), 1);
        let toggle = container.add_param("toggle", 2);
        int.set_value(Value::Int(9), false);
        toggle.set_value(Value::Int(1), false);

        container.set_default_values(false);
        assert_eq!(int.int_value(), 5);
        assert!(!toggle.is_on());

        container.enable_all(false);
        assert!(container.iter().all(|p| !p.is_enabled()));
        container.enable_all(true);

        let controller = RecordingController::new();
        let mut copy = ParameterContainer::new();
        copy.set_controller(controller.weak());
        copy.add_parameters_from(&container);
        assert_eq!(copy.count(), 2);
        let int_copy = copy.lookup_as::<IntParam>("int").unwrap();
        assert_eq!(int_copy.int_value(), 5);
        assert_eq!(int_copy.tag(), 1);
        int_copy.set_value(Value::Int(2), true);
        assert_eq!(int.int_value(), 5);
        assert_eq!(controller.changed_values(), vec![Value::Int(2)]);
    }

    #[test]
    fn persistence_round_trip() {
        create_logger();
        let mut container = ParameterContainer::new();
        let gain = container.add_float(-60.0, 0.0, "Main Gain", 1);
        let list = container.add_list("preset", 2);
        for entry in ["A", "B", "C"] {
            list.append(entry);
        }
        let menu = container.add_menu("actions", 3);
        menu.append("Copy");
        container.add_command("Edit", "Undo", "undo", 4);
        let name = container.add_string("name", 5);
        name.set_value(Value::from("Lead"), false);

        gain.set_value(Value::Float(-12.0), false);
        assert!(list.select_value(&Value::from("B"), false));

        let mut attributes = Attributes::new();
        container.store_values(&mut attributes, true);
        assert_eq!(attributes.get("Main_Gain"), Some(Value::Float(-12.0)));
        assert_eq!(attributes.get("preset"), Some(Value::from("B")));
        assert_eq!(attributes.get("name"), Some(Value::from("Lead")));
        assert!(!attributes.contains("actions"));
        assert!(!attributes.contains("undo"));

        // the stored selection no longer exists: the nearest remaining entry gets selected
        gain.set_value(Value::Float(0.0), false);
        assert!(list.remove_at(1));
        assert_eq!(container.restore_values(&attributes, true, false), 3);
        assert_eq!(gain.float_value(), -12.0);
        assert_eq!(list.selected_value(), Value::from("A"));

        // broken values leave the parameter unchanged
        attributes.set("Main_Gain", Value::from("loud"));
        assert_eq!(container.restore_values(&attributes, true, false), 2);
        assert_eq!(gain.float_value(), -12.0);

        let mut single = Attributes::new();
        assert!(container.store_value(&mut single, gain.as_ref()));
        assert!(container.restore_value(&single, gain.as_ref(), false).is_ok());
        assert_eq!(
            container.restore_value(&single, list.as_ref(), false),
            Err(Error::ParameterNotFound("preset".to_string()))
        );
    }
}
