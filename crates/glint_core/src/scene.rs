//! Scene container for Glint.
//!
//! The scene is a flat ordered list of spheres. It is mutated by external
//! collaborators (add/move/remove) and never by the render core itself.

use glint_math::Vec3;
use thiserror::Error;

use crate::sphere::Sphere;

/// Errors raised by scene mutation and acceleration structure builds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("Object index {index} out of range for scene of {len} objects")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Ordered collection of spheres.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    objects: Vec<Sphere>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scene from a list of spheres, validating each one.
    pub fn from_objects(objects: Vec<Sphere>) -> SceneResult<Self> {
        for sphere in &objects {
            sphere.validate()?;
        }
        Ok(Self { objects })
    }

    /// The default demo scene: a huge red floor sphere, an overhead light,
    /// and a mirror, green and blue sphere in a row.
    pub fn showcase() -> Self {
        let objects = vec![
            Sphere::new(Vec3::new(0.0, 1000.0, 0.0), 990.0)
                .with_reflectivity(Vec3::new(1.0, 0.0, 0.0))
                .with_roughness(3.0),
            Sphere::new(Vec3::new(0.0, -40.0, 40.0), 5.0)
                .with_emission(Vec3::splat(15.0))
                .with_reflectivity(Vec3::ONE)
                .with_roughness(3.0),
            Sphere::new(Vec3::new(15.0, 2.0, 20.0), 3.0),
            Sphere::new(Vec3::new(0.0, 2.0, 20.0), 3.0)
                .with_reflectivity(Vec3::new(0.0, 1.0, 0.0))
                .with_roughness(5.0),
            Sphere::new(Vec3::new(-15.0, 2.0, 20.0), 3.0)
                .with_reflectivity(Vec3::new(0.0, 0.0, 1.0))
                .with_roughness(3.0),
        ];
        Self { objects }
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects in insertion order.
    pub fn objects(&self) -> &[Sphere] {
        &self.objects
    }

    /// Get the object at `index`.
    pub fn get(&self, index: usize) -> SceneResult<&Sphere> {
        self.objects.get(index).ok_or(SceneError::IndexOutOfRange {
            index,
            len: self.objects.len(),
        })
    }

    /// Index of the designated light (first sphere with emission.x > 0).
    pub fn light_index(&self) -> Option<usize> {
        self.objects.iter().position(Sphere::is_light)
    }

    /// Append a sphere. Returns its index.
    pub fn add(&mut self, sphere: Sphere) -> SceneResult<usize> {
        sphere.validate()?;
        self.objects.push(sphere);
        Ok(self.objects.len() - 1)
    }

    /// Remove the sphere at `index`.
    ///
    /// The last remaining object is protected: removing it would leave
    /// nothing to build a BVH from.
    pub fn remove(&mut self, index: usize) -> SceneResult<Sphere> {
        let len = self.objects.len();
        if index >= len || len <= 1 {
            return Err(SceneError::IndexOutOfRange { index, len });
        }
        Ok(self.objects.remove(index))
    }

    /// Move the sphere at `index` to `position`.
    pub fn move_object(&mut self, index: usize, position: Vec3) -> SceneResult<()> {
        if !position.is_finite() {
            return Err(SceneError::InvalidParameter(format!(
                "object position must be finite, got {}",
                position
            )));
        }
        let len = self.objects.len();
        let sphere = self
            .objects
            .get_mut(index)
            .ok_or(SceneError::IndexOutOfRange { index, len })?;
        sphere.position = position;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_showcase_scene() {
        let scene = Scene::showcase();
        assert_eq!(scene.len(), 5);
        assert_eq!(scene.light_index(), Some(1));
        for sphere in scene.objects() {
            assert!(sphere.validate().is_ok());
        }
    }

    #[test]
    fn test_add_rejects_invalid_sphere() {
        let mut scene = Scene::showcase();
        let err = scene.add(Sphere::new(Vec3::ZERO, -1.0)).unwrap_err();
        assert!(matches!(err, SceneError::InvalidParameter(_)));
        assert_eq!(scene.len(), 5);

        assert_eq!(scene.add(Sphere::new(Vec3::ZERO, 1.0)), Ok(5));
    }

    #[test]
    fn test_remove_last_object_is_protected() {
        let mut scene = Scene::from_objects(vec![Sphere::new(Vec3::ZERO, 5.0)]).unwrap();
        let err = scene.remove(0).unwrap_err();
        assert_eq!(err, SceneError::IndexOutOfRange { index: 0, len: 1 });
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.objects()[0].radius, 5.0);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut scene = Scene::showcase();
        assert!(matches!(
            scene.remove(7),
            Err(SceneError::IndexOutOfRange { index: 7, len: 5 })
        ));

        let removed = scene.remove(2).unwrap();
        assert_eq!(removed.position, Vec3::new(15.0, 2.0, 20.0));
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn test_move_object() {
        let mut scene = Scene::showcase();
        scene.move_object(1, Vec3::new(5.0, -30.0, 35.0)).unwrap();
        assert_eq!(scene.objects()[1].position, Vec3::new(5.0, -30.0, 35.0));

        assert!(matches!(
            scene.move_object(9, Vec3::ZERO),
            Err(SceneError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            scene.move_object(0, Vec3::new(f32::INFINITY, 0.0, 0.0)),
            Err(SceneError::InvalidParameter(_))
        ));
        assert_eq!(scene.objects()[0].position, Vec3::new(0.0, 1000.0, 0.0));
    }

    #[test]
    fn test_light_index_absent() {
        let scene = Scene::from_objects(vec![Sphere::new(Vec3::ZERO, 1.0)]).unwrap();
        assert_eq!(scene.light_index(), None);
    }
}
