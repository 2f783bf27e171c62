// Irradose - core/isotope.rs
//
// Isotope name -> decay constant table. Built once at startup from the
// built-in constants plus any config overrides, then only read.

use crate::util::constants;
use crate::util::error::IsotopeError;
use std::collections::BTreeMap;

/// Immutable mapping from isotope name to decay constant λ (1/second).
#[derive(Debug, Clone, PartialEq)]
pub struct IsotopeTable {
    constants: BTreeMap<String, f64>,
}

impl IsotopeTable {
    /// Table containing only the built-in isotopes.
    pub fn builtin() -> Self {
        Self {
            constants: constants::BUILTIN_ISOTOPES
                .iter()
                .map(|(name, lambda)| (name.to_string(), *lambda))
                .collect(),
        }
    }

    /// Built-ins with `overrides` merged on top. Entries with a non-positive
    /// or non-finite constant are rejected.
    pub fn with_overrides<I>(overrides: I) -> Result<Self, IsotopeError>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut table = Self::builtin();
        for (name, lambda) in overrides {
            validate_constant(&name, lambda)?;
            if table.constants.insert(name.clone(), lambda).is_some() {
                tracing::info!(isotope = %name, lambda, "Decay constant overridden by config");
            } else {
                tracing::info!(isotope = %name, lambda, "Isotope added from config");
            }
        }
        Ok(table)
    }

    /// Decay constant for `name`.
    pub fn lambda(&self, name: &str) -> Result<f64, IsotopeError> {
        self.constants
            .get(name)
            .copied()
            .ok_or_else(|| IsotopeError::Unknown {
                name: name.to_string(),
                known: self.names(),
            })
    }

    /// Isotope names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.constants.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.constants.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for IsotopeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Check that a decay constant is usable.
pub fn validate_constant(name: &str, lambda: f64) -> Result<(), IsotopeError> {
    if lambda.is_finite() && lambda > 0.0 {
        Ok(())
    } else {
        Err(IsotopeError::InvalidConstant {
            name: name.to_string(),
            value: lambda,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_constants() {
        let table = IsotopeTable::builtin();
        assert_eq!(table.lambda("11C").unwrap(), 0.000566);
        assert_eq!(table.lambda("18F").unwrap(), 0.000105);
        assert_eq!(table.names(), vec!["11C", "18F"]);
    }

    #[test]
    fn test_unknown_isotope_lists_known_names() {
        let err = IsotopeTable::builtin().lambda("99Tc").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("99Tc"));
        assert!(msg.contains("11C, 18F"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(IsotopeTable::builtin().lambda("18f").is_err());
    }

    #[test]
    fn test_overrides_merge_over_builtins() {
        let table = IsotopeTable::with_overrides(vec![
            ("18F".to_string(), 0.0001053),
            ("15O".to_string(), 0.00567),
        ])
        .unwrap();
        assert_eq!(table.lambda("18F").unwrap(), 0.0001053);
        assert_eq!(table.lambda("15O").unwrap(), 0.00567);
        assert_eq!(table.lambda("11C").unwrap(), 0.000566);
    }

    #[test]
    fn test_invalid_constants_rejected() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = IsotopeTable::with_overrides(vec![("X".to_string(), bad)]);
            assert!(
                matches!(result, Err(IsotopeError::InvalidConstant { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
