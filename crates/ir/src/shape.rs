//! Array and tuple shapes.

use core::fmt;
use smallvec::SmallVec;
#[cfg(feature = "enable-serde")]
use serde_derive::{Deserialize, Serialize};

/// Element type of an array shape, or `Tuple` for tuple shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ElementType {
    /// Boolean predicate.
    Pred,
    /// 8-bit signed integer.
    S8,
    /// 16-bit signed integer.
    S16,
    /// 32-bit signed integer.
    S32,
    /// 64-bit signed integer.
    S64,
    /// 8-bit unsigned integer.
    U8,
    /// 32-bit unsigned integer.
    U32,
    /// IEEE half precision float.
    F16,
    /// bfloat16.
    BF16,
    /// IEEE single precision float.
    F32,
    /// IEEE double precision float.
    F64,
    /// Not an element type: marks a tuple shape.
    Tuple,
}

impl ElementType {
    /// Lower case name used in the text format.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pred => "pred",
            Self::S8 => "s8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::S64 => "s64",
            Self::U8 => "u8",
            Self::U32 => "u32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Tuple => "tuple",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The shape of an instruction result.
///
/// An array shape is an element type and an ordered list of non-negative dimension sizes. A tuple
/// shape has element type [`ElementType::Tuple`], no dimensions, and a list of element shapes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Shape {
    element_type: ElementType,
    dimensions: SmallVec<[u64; 4]>,
    tuple_shapes: Vec<Shape>,
}

impl Shape {
    /// Create an array shape.
    pub fn array(element_type: ElementType, dimensions: &[u64]) -> Self {
        debug_assert_ne!(element_type, ElementType::Tuple);
        Self {
            element_type,
            dimensions: SmallVec::from_slice(dimensions),
            tuple_shapes: Vec::new(),
        }
    }

    /// Create a tuple shape.
    pub fn tuple(tuple_shapes: Vec<Shape>) -> Self {
        Self {
            element_type: ElementType::Tuple,
            dimensions: SmallVec::new(),
            tuple_shapes,
        }
    }

    /// The element type.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Is this an array shape?
    pub fn is_array(&self) -> bool {
        self.element_type != ElementType::Tuple
    }

    /// Is this a tuple shape?
    pub fn is_tuple(&self) -> bool {
        self.element_type == ElementType::Tuple
    }

    /// Element shapes of a tuple shape; empty for arrays.
    pub fn tuple_shapes(&self) -> &[Shape] {
        &self.tuple_shapes
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// All dimension sizes, major to minor.
    pub fn dimensions(&self) -> &[u64] {
        &self.dimensions
    }

    /// Size of dimension `dim`.
    ///
    /// Panics if `dim` is out of range.
    pub fn dimension(&self, dim: usize) -> u64 {
        self.dimensions[dim]
    }

    /// Change the size of dimension `dim`.
    pub fn set_dimension(&mut self, dim: usize, size: u64) {
        self.dimensions[dim] = size;
    }

    /// Number of elements of an array shape: the product of all dimension sizes.
    ///
    /// Scalars have one element.
    pub fn elements(&self) -> u64 {
        debug_assert!(self.is_array(), "elements() of tuple shape {self}");
        self.dimensions.iter().product()
    }

    /// Do `self` and `other` describe the same values? Tuples compare element-wise.
    pub fn compatible(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_tuple() {
            write!(f, "(")?;
            for (i, shape) in self.tuple_shapes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{shape}")?;
            }
            return write!(f, ")");
        }
        write!(f, "{}[", self.element_type)?;
        for (i, size) in self.dimensions.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{size}")?;
        }
        write!(f, "]")
    }
}

/// Compute the dimensions of `input` which a reshape to `output` leaves unmodified.
///
/// Returns the pairs `(i, j)` such that dimension `i` of `input` is carried unchanged, as far as
/// its size and its position relative to the other dimensions go, into dimension `j` of `output`.
/// The shapes are walked major to minor in step, with the products of all dimensions visited so
/// far on each side equal between steps:
///
/// - dimensions of equal size at a step are paired, including unit dimensions;
/// - a unit dimension present on only one side is skipped;
/// - otherwise dimensions are merged on the smaller side until the products agree again, and
///   none of the merged dimensions are unmodified.
///
/// For example `[4,8] -> [1,4,8,1]` leaves both input dimensions unmodified, while
/// `[1,4,8] -> [4,8]` reports only two of the three input dimensions and `[2,6] -> [12]` none.
pub fn dimensions_unmodified_by_reshape(input: &Shape, output: &Shape) -> Vec<(usize, usize)> {
    let a = input.dimensions();
    let b = output.dimensions();
    let mut unmodified = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            unmodified.push((i, j));
            i += 1;
            j += 1;
        } else if a[i] == 1 {
            i += 1;
        } else if b[j] == 1 {
            j += 1;
        } else {
            let (mut partial_a, mut partial_b) = (a[i], b[j]);
            i += 1;
            j += 1;
            while partial_a != partial_b {
                if partial_a < partial_b {
                    let Some(&size) = a.get(i) else {
                        return unmodified;
                    };
                    partial_a *= size;
                    i += 1;
                } else {
                    let Some(&size) = b.get(j) else {
                        return unmodified;
                    };
                    partial_b *= size;
                    j += 1;
                }
            }
        }
    }
    unmodified
}
