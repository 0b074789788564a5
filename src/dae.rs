//! Per-variable metadata for DAE index reduction
//!
//! The graph never reads these records; they travel next to the independents
//! of a handler so that index-reduction code built on top of it can tell
//! states, derivatives, and constants apart.

use std::fmt;

/// Role of one DAE variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaeVarInfo {
    anti_derivative: Option<usize>,
    derivative: Option<usize>,
    integrated_dependent: bool,
    integrated_variable: bool,
    name: String,
    original_index: Option<usize>,
}

impl Default for DaeVarInfo {
    fn default() -> Self {
        Self::new("")
    }
}

impl DaeVarInfo {
    /// A variable that depends on the integrated variable
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            anti_derivative: None,
            derivative: None,
            integrated_dependent: true,
            integrated_variable: false,
            name: name.into(),
            original_index: None,
        }
    }

    /// The time derivative of variable `anti_derivative`
    pub fn derivative_of(anti_derivative: usize, name: impl Into<String>) -> Self {
        Self {
            anti_derivative: Some(anti_derivative),
            ..Self::new(name)
        }
    }

    /// Index of the variable this one is the derivative of
    #[inline]
    pub fn anti_derivative(&self) -> Option<usize> {
        self.anti_derivative
    }

    pub fn set_anti_derivative(&mut self, index: Option<usize>) {
        self.anti_derivative = index;
    }

    /// Index of the derivative of this variable
    #[inline]
    pub fn derivative(&self) -> Option<usize> {
        self.derivative
    }

    pub fn set_derivative(&mut self, index: Option<usize>) {
        self.derivative = index;
    }

    /// Whether the variable is a function of the integrated variable
    #[inline]
    pub fn is_integrated_dependent(&self) -> bool {
        self.integrated_dependent
    }

    /// Whether this is the integrated variable itself (usually time)
    #[inline]
    pub fn is_integrated_variable(&self) -> bool {
        self.integrated_variable
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        !self.integrated_dependent && !self.integrated_variable
    }

    /// Mark as a parameter: no dependency on the integrated variable
    pub fn make_constant(&mut self) {
        self.integrated_variable = false;
        self.integrated_dependent = false;
        self.anti_derivative = None;
    }

    /// Mark as the integrated variable
    pub fn make_integrated_variable(&mut self) {
        self.integrated_variable = true;
        self.integrated_dependent = false;
        self.anti_derivative = None;
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Position of the variable in the model before index reduction
    #[inline]
    pub fn original_index(&self) -> Option<usize> {
        self.original_index
    }

    pub fn set_original_index(&mut self, index: Option<usize>) {
        self.original_index = index;
    }
}

impl fmt::Display for DaeVarInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(of) = self.anti_derivative {
            write!(f, " (d/dt of #{of})")?;
        }
        if self.integrated_variable {
            write!(f, " (integrated)")?;
        } else if !self.integrated_dependent {
            write!(f, " (constant)")?;
        }
        Ok(())
    }
}
