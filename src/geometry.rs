//! Intrusion geometries and the boolean masks they paint onto a grid.
//!
//! Shapes are described in physical coordinates (meters) and tested against
//! the cell positions `(i·dx, j·dy, k·dz)`. Parts of a shape that fall outside
//! the grid are clipped silently.

use crate::error::{GeothermError, GeothermResult};
use crate::grid::GridDomain;
use glam::{DVec2, DVec3};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Intrusion body in physical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntrusionShape {
    /// Axis-aligned box (sill) with its lower corner at `origin`
    Planar {
        origin: DVec3,
        width: f64,
        height: f64,
        thickness: f64,
    },
    /// Vertical cylinder (dike / plug) whose axis passes through `base`,
    /// spanning `base.z ..= base.z + height`
    Cylindrical { base: DVec3, radius: f64, height: f64 },
    /// Sphere (pluton)
    Spherical { center: DVec3, radius: f64 },
    /// Union of independently parametrized components
    Complex { components: Vec<IntrusionShape> },
}

impl IntrusionShape {
    /// Inclusion test for a single point
    pub fn contains(&self, p: DVec3) -> bool {
        match self {
            IntrusionShape::Planar {
                origin,
                width,
                height,
                thickness,
            } => {
                let far = *origin + DVec3::new(*width, *height, *thickness);
                p.cmpge(*origin).all() && p.cmple(far).all()
            }
            IntrusionShape::Cylindrical { base, radius, height } => {
                let radial = DVec2::new(p.x - base.x, p.y - base.y).length();
                radial <= *radius && p.z >= base.z && p.z <= base.z + height
            }
            IntrusionShape::Spherical { center, radius } => p.distance(*center) <= *radius,
            IntrusionShape::Complex { components } => components.iter().any(|c| c.contains(p)),
        }
    }

    pub fn validate(&self) -> GeothermResult<()> {
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(GeothermError::Config(format!("intrusion {} must be >= 0, got {}", name, v)))
            }
        };
        match self {
            IntrusionShape::Planar {
                width,
                height,
                thickness,
                ..
            } => {
                non_negative("width", *width)?;
                non_negative("height", *height)?;
                non_negative("thickness", *thickness)
            }
            IntrusionShape::Cylindrical { radius, height, .. } => {
                non_negative("radius", *radius)?;
                non_negative("height", *height)
            }
            IntrusionShape::Spherical { radius, .. } => non_negative("radius", *radius),
            IntrusionShape::Complex { components } => components.iter().try_for_each(|c| c.validate()),
        }
    }

    pub fn build_mask(&self, domain: &GridDomain) -> IntrusionMask {
        build_mask(self, domain)
    }
}

/// Paints `shape` onto every cell of `domain`
pub fn build_mask(shape: &IntrusionShape, domain: &GridDomain) -> IntrusionMask {
    let cells = Array3::from_shape_fn(domain.shape(), |(i, j, k)| shape.contains(domain.position(i, j, k)));
    IntrusionMask { cells }
}

/// Dense boolean array co-indexed with the temperature field
#[derive(Debug, Clone, PartialEq)]
pub struct IntrusionMask {
    cells: Array3<bool>,
}

impl IntrusionMask {
    pub fn empty(domain: &GridDomain) -> Self {
        Self {
            cells: Array3::from_elem(domain.shape(), false),
        }
    }

    /// Wraps an externally painted mask (e.g. from a grid painter)
    pub fn from_array(domain: &GridDomain, cells: Array3<bool>) -> GeothermResult<Self> {
        let found = cells.dim();
        if found != domain.shape() {
            return Err(GeothermError::ShapeMismatch {
                expected: domain.shape(),
                found,
            });
        }
        Ok(Self { cells })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.cells.dim()
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> bool {
        self.cells.get((i, j, k)).copied().unwrap_or(false)
    }

    /// Number of cells occupied by intrusion material
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&inside| inside).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Logical OR with another mask of the same shape
    pub fn union(&self, other: &IntrusionMask) -> GeothermResult<IntrusionMask> {
        if self.shape() != other.shape() {
            return Err(GeothermError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        let mut cells = self.cells.clone();
        cells.zip_mut_with(&other.cells, |a, &b| *a = *a || b);
        Ok(IntrusionMask { cells })
    }

    pub fn as_array(&self) -> &Array3<bool> {
        &self.cells
    }
}

/// Sill dimensions used by the centered presets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SillSize {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
}

/// Intrusion placed at the domain center, sized in meters.
///
/// This is the configuration-facing form; `resolve` turns it into an
/// [`IntrusionShape`] positioned on a concrete grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntrusionPreset {
    Sill(SillSize),
    Dike { radius: f64, height: f64 },
    Pluton { radius: f64 },
    Composite {
        #[serde(default)]
        sill: Option<SillSize>,
        #[serde(default)]
        pluton_radius: Option<f64>,
    },
    /// Shape given directly in physical coordinates
    Custom { shape: IntrusionShape },
}

impl IntrusionPreset {
    pub fn resolve(&self, domain: &GridDomain) -> GeothermResult<IntrusionShape> {
        let shape = match self {
            IntrusionPreset::Sill(size) => centered_sill(domain, size),
            IntrusionPreset::Dike { radius, height } => {
                let [cx, cy, cz] = domain.center_index();
                let height_cells = cells_in(*height, domain.dz);
                IntrusionShape::Cylindrical {
                    base: DVec3::new(
                        cx as f64 * domain.dx,
                        cy as f64 * domain.dy,
                        (cz as i64 - height_cells / 2) as f64 * domain.dz,
                    ),
                    radius: *radius,
                    height: *height,
                }
            }
            IntrusionPreset::Pluton { radius } => IntrusionShape::Spherical {
                center: domain.center_position(),
                radius: *radius,
            },
            IntrusionPreset::Composite { sill, pluton_radius } => {
                let mut components = Vec::new();
                if let Some(size) = sill {
                    components.push(centered_sill(domain, size));
                }
                if let Some(radius) = pluton_radius {
                    components.push(IntrusionShape::Spherical {
                        center: domain.center_position(),
                        radius: *radius,
                    });
                }
                if components.is_empty() {
                    return Err(GeothermError::Config(
                        "composite intrusion needs a sill, a pluton radius, or both".to_string(),
                    ));
                }
                IntrusionShape::Complex { components }
            }
            IntrusionPreset::Custom { shape } => shape.clone(),
        };
        shape.validate()?;
        Ok(shape)
    }
}

// whole cells covered by `length`, truncated toward zero
fn cells_in(length: f64, spacing: f64) -> i64 {
    (length / spacing) as i64
}

fn centered_sill(domain: &GridDomain, size: &SillSize) -> IntrusionShape {
    let [cx, cy, cz] = domain.center_index();
    let x0 = cx as i64 - cells_in(size.width, domain.dx) / 2;
    let y0 = cy as i64 - cells_in(size.height, domain.dy) / 2;
    let z0 = cz as i64 - cells_in(size.thickness, domain.dz) / 2;
    IntrusionShape::Planar {
        origin: DVec3::new(x0 as f64 * domain.dx, y0 as f64 * domain.dy, z0 as f64 * domain.dz),
        width: size.width,
        height: size.height,
        thickness: size.thickness,
    }
}
