pub mod curve;
pub mod face;

pub use curve::{Curve, CurveId, CurvePoint, CurveSource};
pub use face::{Face, FaceId, TrimBy};

use crate::error::TopologyError;
use crate::math::Point3;
use slotmap::SlotMap;

/// A collection of trimmed faces forming the boundary of a candidate
/// solid, with the curves that trim them.
///
/// Faces and curves carry stable handles unique within their owning
/// shell; iteration follows insertion order, so handle assignment in a
/// Boolean result is deterministic in input order.
#[derive(Debug, Default)]
pub struct Shell {
    faces: SlotMap<FaceId, Face>,
    curves: SlotMap<CurveId, Curve>,
    /// Set when a Boolean could not close some face's trim polygon.
    pub boolean_failed: bool,
    /// Diagnostic edges recorded when a trim polygon fails to close.
    pub naked_edges: Vec<(Point3, Point3)>,
}

impl Shell {
    /// Creates a new, empty shell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a face and returns its handle.
    pub fn add_face(&mut self, face: Face) -> FaceId {
        self.faces.insert(face)
    }

    /// Inserts a curve and returns its handle.
    pub fn add_curve(&mut self, curve: Curve) -> CurveId {
        self.curves.insert(curve)
    }

    /// Returns a reference to a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not in this shell.
    pub fn face(&self, id: FaceId) -> Result<&Face, TopologyError> {
        self.faces
            .get(id)
            .ok_or(TopologyError::EntityNotFound("face"))
    }

    /// Returns a mutable reference to a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not in this shell.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut Face, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or(TopologyError::EntityNotFound("face"))
    }

    /// Returns a reference to a curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not in this shell.
    pub fn curve(&self, id: CurveId) -> Result<&Curve, TopologyError> {
        self.curves
            .get(id)
            .ok_or(TopologyError::EntityNotFound("curve"))
    }

    /// Returns a mutable reference to a curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not in this shell.
    pub fn curve_mut(&mut self, id: CurveId) -> Result<&mut Curve, TopologyError> {
        self.curves
            .get_mut(id)
            .ok_or(TopologyError::EntityNotFound("curve"))
    }

    /// Iterates over faces in insertion order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.faces.iter()
    }

    /// Iterates over curves in insertion order.
    pub fn curves(&self) -> impl Iterator<Item = (CurveId, &Curve)> {
        self.curves.iter()
    }

    /// Iterates mutably over curves in insertion order.
    pub fn curves_mut(&mut self) -> impl Iterator<Item = (CurveId, &mut Curve)> {
        self.curves.iter_mut()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of curves.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// True if the shell has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Resolves the operand shell that owns `curve.surf_a`.
    ///
    /// Curves copied from an operand reference faces of that operand;
    /// intersection curves reference one face in each.
    #[must_use]
    pub fn surface_a_owner<'a>(curve: &Curve, a: &'a Shell, b: &'a Shell) -> &'a Shell {
        match curve.source {
            CurveSource::A | CurveSource::Intersection => a,
            CurveSource::B => b,
        }
    }

    /// Resolves the operand shell that owns `curve.surf_b`.
    #[must_use]
    pub fn surface_b_owner<'a>(curve: &Curve, a: &'a Shell, b: &'a Shell) -> &'a Shell {
        match curve.source {
            CurveSource::A => a,
            CurveSource::B | CurveSource::Intersection => b,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::RationalSurface;
    use crate::math::Vector3;

    fn flat_face() -> Face {
        Face::new(
            RationalSurface::plane(
                Point3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            )
            .unwrap(),
        )
    }

    #[test]
    fn handles_are_stable_and_ordered() {
        let mut shell = Shell::new();
        let f1 = shell.add_face(flat_face());
        let f2 = shell.add_face(flat_face());
        assert_ne!(f1, f2);

        let order: Vec<FaceId> = shell.faces().map(|(id, _)| id).collect();
        assert_eq!(order, vec![f1, f2]);
    }

    #[test]
    fn missing_handle_is_an_error() {
        let shell = Shell::new();
        assert!(shell.face(FaceId::default()).is_err());
        assert!(shell.curve(CurveId::default()).is_err());
    }
}
