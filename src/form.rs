// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Generic form state: values, per-field errors and the submitting flag

use std::collections::BTreeSet;
use std::fmt;

use crate::validation::ValidationState;

/// A record that can be bound to a form.
///
/// `Field` is a closed set of paths into the record, so every consumer of the
/// binding addresses fields through the type system rather than strings.
pub trait FormModel: Clone + Default + Send + 'static {
    type Field: Copy + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn value(&self, field: Self::Field) -> &str;

    fn set_value(&mut self, field: Self::Field, value: String);

    fn validate(&self) -> ValidationState<Self::Field>;
}

/// Form state with validate-on-change semantics
#[derive(Debug, Clone)]
pub struct FormController<M: FormModel> {
    values: M,
    errors: ValidationState<M::Field>,
    dirty: BTreeSet<M::Field>,
    is_submitting: bool,
}

impl<M: FormModel> Default for FormController<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<M: FormModel> FormController<M> {
    pub fn new(values: M) -> Self {
        let errors = values.validate();
        Self {
            values,
            errors,
            dirty: BTreeSet::new(),
            is_submitting: false,
        }
    }

    pub fn values(&self) -> &M {
        &self.values
    }

    pub fn value(&self, field: M::Field) -> &str {
        self.values.value(field)
    }

    pub fn errors(&self) -> &ValidationState<M::Field> {
        &self.errors
    }

    pub fn error(&self, field: M::Field) -> Option<&str> {
        self.errors.error(field)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_valid()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.is_submitting = submitting;
    }

    /// Fields the user has edited by hand
    pub fn is_dirty(&self, field: M::Field) -> bool {
        self.dirty.contains(&field)
    }

    /// User edit: marks the field dirty and re-validates
    pub fn set_field(&mut self, field: M::Field, value: impl Into<String>) {
        self.dirty.insert(field);
        self.write(field, value.into());
    }

    /// Programmatic edit (suggestions, lookups): re-validates, leaves dirty flags alone
    pub fn apply_field(&mut self, field: M::Field, value: impl Into<String>) {
        self.write(field, value.into());
    }

    /// Re-run validation and return the fresh state
    pub fn validate(&mut self) -> &ValidationState<M::Field> {
        self.errors = self.values.validate();
        &self.errors
    }

    /// Discard all values and flags
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn write(&mut self, field: M::Field, value: String) {
        self.values.set_value(field, value);
        self.errors = self.values.validate();
    }
}
