//! Vector spaces and their identities.
//!
//! A space is an immutable, cheaply cloned handle. Two spaces are the same
//! space iff their identities match, whatever their dimension or label, so
//! operands built in different spaces can never be combined by accident.

use crate::algebra::Scalar;
use crate::error::{AlgebraError, AlgebraResult};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_REGISTRY: AtomicU32 = AtomicU32::new(1);
static GLOBAL_REGISTRY: SpaceRegistry = SpaceRegistry::with_tag(0);

/// Opaque identity of a vector space.
///
/// Ordered by issuing registry, then by issue order within that registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpaceId {
    registry: u32,
    serial: u64,
}

impl SpaceId {
    /// Position of this identity in its registry's issue order.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.registry, self.serial)
    }
}

/// Issues space identities from a monotonically increasing atomic counter.
///
/// Every registry carries its own tag, so identities from different
/// registries never collide.
#[derive(Debug)]
pub struct SpaceRegistry {
    tag: u32,
    next: AtomicU64,
}

impl Default for SpaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SpaceRegistry {
    pub fn new() -> Self {
        Self::with_tag(NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed))
    }

    const fn with_tag(tag: u32) -> Self {
        Self {
            tag,
            next: AtomicU64::new(0),
        }
    }

    /// The process-wide registry used by [`VectorSpace::new`].
    pub fn global() -> &'static SpaceRegistry {
        &GLOBAL_REGISTRY
    }

    fn issue(&self) -> SpaceId {
        SpaceId {
            registry: self.tag,
            serial: self.next.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn make_space(
        &self,
        dimension: usize,
        label: impl Into<String>,
    ) -> AlgebraResult<VectorSpace> {
        if dimension == 0 {
            return Err(AlgebraError::ZeroDimension);
        }
        Ok(VectorSpace(Arc::new(SpaceData {
            id: self.issue(),
            dimension,
            label: label.into(),
            factors: Vec::new(),
        })))
    }

    /// Builds the tensor product of two or more distinct spaces.
    ///
    /// Factors are stored sorted by identity; that order is the canonical
    /// order operands are matched against.
    pub fn make_tensor_product_space(
        &self,
        spaces: &[&VectorSpace],
        label: impl Into<String>,
    ) -> AlgebraResult<VectorSpace> {
        if spaces.len() < 2 {
            return Err(AlgebraError::TensorArity {
                required: 2,
                actual: spaces.len(),
            });
        }

        let mut factors: Vec<VectorSpace> = spaces.iter().map(|&space| space.clone()).collect();
        factors.sort_by_key(VectorSpace::id);
        for pair in factors.windows(2) {
            if pair[0] == pair[1] {
                return Err(AlgebraError::DuplicateFactor(pair[0].id()));
            }
        }

        let dimension = factors.iter().map(VectorSpace::dimension).product();
        let label = format!("{} (tensor product space)", label.into());
        Ok(VectorSpace(Arc::new(SpaceData {
            id: self.issue(),
            dimension,
            label,
            factors,
        })))
    }
}

#[derive(Debug)]
struct SpaceData {
    id: SpaceId,
    dimension: usize,
    label: String,
    factors: Vec<VectorSpace>,
}

/// A finite-dimensional vector space, shared by every vector and operator built in it.
#[derive(Debug, Clone)]
pub struct VectorSpace(Arc<SpaceData>);

impl VectorSpace {
    /// Creates a space with an identity from the global registry.
    pub fn new(dimension: usize, label: impl Into<String>) -> AlgebraResult<Self> {
        SpaceRegistry::global().make_space(dimension, label)
    }

    /// Tensor product space from the global registry.
    pub fn tensor_product_of(
        spaces: &[&VectorSpace],
        label: impl Into<String>,
    ) -> AlgebraResult<Self> {
        SpaceRegistry::global().make_tensor_product_space(spaces, label)
    }

    pub fn id(&self) -> SpaceId {
        self.0.id
    }

    pub fn dimension(&self) -> usize {
        self.0.dimension
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    pub fn is_composite(&self) -> bool {
        !self.0.factors.is_empty()
    }

    /// Component spaces sorted by identity. A simple space is its own only factor.
    pub fn factors(&self) -> Vec<VectorSpace> {
        if self.is_composite() {
            self.0.factors.clone()
        } else {
            vec![self.clone()]
        }
    }

    pub fn identity_operator<T: Scalar>(&self) -> Matrix<T> {
        Matrix::identity(self)
    }

    pub(crate) fn ensure_same(&self, other: &VectorSpace) -> AlgebraResult<()> {
        if self == other {
            Ok(())
        } else {
            Err(AlgebraError::SpaceMismatch {
                lhs: self.to_string(),
                rhs: other.to_string(),
            })
        }
    }
}

impl PartialEq for VectorSpace {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for VectorSpace {}

impl Hash for VectorSpace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Display for VectorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {})", self.label(), self.id())
    }
}

/// Anything tied to exactly one vector space.
pub trait LivesInSpace {
    fn space(&self) -> &VectorSpace;
}

pub(crate) fn ensure_same_space(
    lhs: &impl LivesInSpace,
    rhs: &impl LivesInSpace,
) -> AlgebraResult<()> {
    lhs.space().ensure_same(rhs.space())
}
