//! Naming of independents, dependents and temporaries in generated code

/// Produces the identifiers a renderer uses for materialized values
pub trait VariableNameGenerator {
    /// Name of the independent at roster position `index`
    fn independent_name(&self, index: usize, display: Option<&str>) -> String;

    /// Name of the output at position `index`
    fn dependent_name(&self, index: usize) -> String;

    /// Name of the temporary `offset` positions past the first temporary id
    fn temporary_name(&self, offset: usize, display: Option<&str>) -> String;

    /// The array holding temporaries, when they live in one
    fn temporary_array(&self) -> Option<&str> {
        None
    }
}

/// Array-style names: `x[i]`, `y[i]` and `v[i]`.
///
/// Display names set on nodes take precedence for independents. Temporaries
/// always live in the declared array, since a reused slot may hold values
/// with different names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultNameGenerator {
    independent: String,
    dependent: String,
    temporary: String,
}

impl Default for DefaultNameGenerator {
    fn default() -> Self {
        Self::new("y", "x", "v")
    }
}

impl DefaultNameGenerator {
    pub fn new(
        dependent: impl Into<String>,
        independent: impl Into<String>,
        temporary: impl Into<String>,
    ) -> Self {
        Self {
            independent: independent.into(),
            dependent: dependent.into(),
            temporary: temporary.into(),
        }
    }
}

impl VariableNameGenerator for DefaultNameGenerator {
    fn independent_name(&self, index: usize, display: Option<&str>) -> String {
        display.map_or_else(|| format!("{}[{index}]", self.independent), str::to_owned)
    }

    fn dependent_name(&self, index: usize) -> String {
        format!("{}[{index}]", self.dependent)
    }

    fn temporary_name(&self, offset: usize, _display: Option<&str>) -> String {
        format!("{}[{offset}]", self.temporary)
    }

    fn temporary_array(&self) -> Option<&str> {
        Some(&self.temporary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = DefaultNameGenerator::default();
        assert_eq!(names.independent_name(2, None), "x[2]");
        assert_eq!(names.dependent_name(0), "y[0]");
        assert_eq!(names.temporary_name(1, None), "v[1]");
        assert_eq!(names.temporary_name(1, Some("tmp")), "v[1]");
        assert_eq!(names.temporary_array(), Some("v"));
    }

    #[test]
    fn test_custom_prefixes() {
        let names = DefaultNameGenerator::new("out", "in", "work");
        assert_eq!(names.independent_name(0, Some("speed")), "speed");
        assert_eq!(names.independent_name(0, None), "in[0]");
        assert_eq!(names.dependent_name(3), "out[3]");
    }
}
