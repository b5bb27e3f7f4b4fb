//! The closed set of G-Portugol types (§3.1-§3.2 of the language spec).

use std::fmt;

/// One of the six primitive type tags. Fixed, closed set — there is no user
/// type declaration syntax in the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Inteiro,
    Real,
    Caractere,
    Literal,
    Logico,
    /// No-value: the return type of procedures, and an "unknown" sentinel
    /// used while the analyzer is still resolving a declaration.
    Nulo,
}

impl PrimitiveType {
    /// INTEIRO and REAL form the numeric subtype; widening/narrowing rules
    /// (§3.1) only apply within this pair.
    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveType::Inteiro | PrimitiveType::Real)
    }

    /// Condition/boolean-context operands accept LOGICO or INTEIRO (§4.3.1:
    /// "non-zero is truthy").
    pub fn is_boolean_context(self) -> bool {
        matches!(self, PrimitiveType::Logico | PrimitiveType::Inteiro)
    }

    pub fn zero_value_name(self) -> &'static str {
        match self {
            PrimitiveType::Inteiro => "0",
            PrimitiveType::Real => "0.0",
            PrimitiveType::Caractere => "\\0",
            PrimitiveType::Literal => "\"\"",
            PrimitiveType::Logico => "falso",
            PrimitiveType::Nulo => "nulo",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveType::Inteiro => "inteiro",
            PrimitiveType::Real => "real",
            PrimitiveType::Caractere => "caractere",
            PrimitiveType::Literal => "literal",
            PrimitiveType::Logico => "logico",
            PrimitiveType::Nulo => "nulo",
        };
        write!(f, "{s}")
    }
}

/// A symbol's type: either a bare primitive, or a primitive element type
/// with a non-empty list of positive dimensions (§3.2).
///
/// Matrix-of-matrix is not representable: `Matrix` always carries a
/// primitive element, never another `SymbolType`.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolType {
    Primitive(PrimitiveType),
    Matrix {
        element: PrimitiveType,
        dims: Vec<u32>,
    },
}

/// Error returned when constructing a `SymbolType::Matrix` whose shape
/// violates §3.2's invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolTypeError {
    EmptyDimensions,
    NonPositiveDimension,
    NuloElement,
}

impl fmt::Display for SymbolTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolTypeError::EmptyDimensions => write!(f, "matrix type must have at least one dimension"),
            SymbolTypeError::NonPositiveDimension => write!(f, "matrix dimensions must be positive"),
            SymbolTypeError::NuloElement => write!(f, "matrix element type cannot be nulo"),
        }
    }
}

impl std::error::Error for SymbolTypeError {}

impl SymbolType {
    pub fn matrix(element: PrimitiveType, dims: Vec<u32>) -> Result<Self, SymbolTypeError> {
        if dims.is_empty() {
            return Err(SymbolTypeError::EmptyDimensions);
        }
        if dims.iter().any(|&d| d == 0) {
            return Err(SymbolTypeError::NonPositiveDimension);
        }
        if element == PrimitiveType::Nulo {
            return Err(SymbolTypeError::NuloElement);
        }
        Ok(SymbolType::Matrix { element, dims })
    }

    pub fn element_type(&self) -> PrimitiveType {
        match self {
            SymbolType::Primitive(p) => *p,
            SymbolType::Matrix { element, .. } => *element,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, SymbolType::Matrix { .. })
    }

    /// Total element count of a matrix type (product of dimensions).
    pub fn element_count(&self) -> Option<u32> {
        match self {
            SymbolType::Primitive(_) => None,
            SymbolType::Matrix { dims, .. } => Some(dims.iter().product()),
        }
    }

    /// §4.3.1 type compatibility. Assignment, argument passing, and
    /// equality all reuse this predicate.
    pub fn is_compatible_with(&self, other: &SymbolType) -> bool {
        match (self, other) {
            (SymbolType::Primitive(a), SymbolType::Primitive(b)) => {
                a == b || (a.is_numeric() && b.is_numeric())
            }
            (
                SymbolType::Matrix { element: ea, dims: da },
                SymbolType::Matrix { element: eb, dims: db },
            ) => ea == eb && da == db,
            _ => false,
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolType::Primitive(p) => write!(f, "{p}"),
            SymbolType::Matrix { element, dims } => {
                write!(f, "{element}")?;
                for d in dims {
                    write!(f, "[{d}]")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_widening_is_compatible() {
        let int_t = SymbolType::Primitive(PrimitiveType::Inteiro);
        let real_t = SymbolType::Primitive(PrimitiveType::Real);
        assert!(int_t.is_compatible_with(&real_t));
        assert!(real_t.is_compatible_with(&int_t));
    }

    #[test]
    fn literal_is_not_compatible_with_inteiro() {
        let lit = SymbolType::Primitive(PrimitiveType::Literal);
        let int_t = SymbolType::Primitive(PrimitiveType::Inteiro);
        assert!(!lit.is_compatible_with(&int_t));
    }

    #[test]
    fn matrix_requires_matching_dims() {
        let a = SymbolType::matrix(PrimitiveType::Inteiro, vec![3, 4]).unwrap();
        let b = SymbolType::matrix(PrimitiveType::Inteiro, vec![3, 5]).unwrap();
        assert!(!a.is_compatible_with(&b));
    }

    #[test]
    fn matrix_rejects_zero_dimension() {
        assert_eq!(
            SymbolType::matrix(PrimitiveType::Inteiro, vec![3, 0]),
            Err(SymbolTypeError::NonPositiveDimension)
        );
    }

    #[test]
    fn matrix_rejects_nulo_element() {
        assert_eq!(
            SymbolType::matrix(PrimitiveType::Nulo, vec![3]),
            Err(SymbolTypeError::NuloElement)
        );
    }
}
