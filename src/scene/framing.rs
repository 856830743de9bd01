//! Camera auto-framing around a model's bounding box.

use glam::Vec3;

use super::bounds::Aabb;
use super::camera::PerspectiveCamera;
use crate::error::FramingError;

/// Multiplier applied to the fitting distance so the model has headroom.
pub const FRAMING_HEADROOM: f32 = 2.0;
/// Height added above the box center for the camera position.
pub const FRAMING_LIFT: f32 = 0.5;
/// Lower bound for the camera distance (zero-volume models).
pub const MIN_FRAMING_DISTANCE: f32 = 0.5;

/// Distance along +Z at which a box of extent `max_dim` fits the vertical fov,
/// with headroom. Never below [`MIN_FRAMING_DISTANCE`].
pub fn framing_distance(max_dim: f32, fov_radians: f32) -> f32 {
    let fit = (max_dim / 2.0) / (fov_radians / 2.0).tan();
    (fit.abs() * FRAMING_HEADROOM).max(MIN_FRAMING_DISTANCE)
}

/// Move `camera` so that `bounds` is framed and look at its center.
///
/// On error the camera is left untouched.
pub fn frame(camera: &mut PerspectiveCamera, bounds: &Aabb) -> Result<(), FramingError> {
    if !bounds.is_finite() {
        return Err(FramingError::NonFiniteBounds);
    }
    if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
        return Err(FramingError::InvalidFieldOfView(camera.fov_degrees));
    }

    let center = bounds.center();
    let distance = framing_distance(bounds.max_dimension(), camera.fov_radians());
    let position = Vec3::new(center.x, center.y + FRAMING_LIFT, center.z + distance);
    if !position.is_finite() {
        return Err(FramingError::NonFiniteBounds);
    }

    camera.position = position;
    camera.look_at(center);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::camera::{CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR};

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(
            CAMERA_FOV_DEGREES,
            800.0 / 600.0,
            CAMERA_NEAR,
            CAMERA_FAR,
            Vec3::new(0.0, 1.2, 2.5),
        )
    }

    #[test]
    fn test_frames_reference_model() {
        let mut cam = camera();
        let bounds = Aabb::from_center_size(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 2.0, 0.5));
        frame(&mut cam, &bounds).unwrap();

        let expected = 2.0 * 1.0 / (22.5f32.to_radians()).tan();
        assert!((cam.position.z - expected).abs() < 1e-4);
        assert!((cam.position.y - 1.5).abs() < 1e-6);
        assert_eq!(cam.position.x, 0.0);
        assert_eq!(cam.target, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_box_fits_in_field_of_view() {
        let mut cam = camera();
        let bounds = Aabb::from_center_size(Vec3::new(0.3, 0.8, -0.2), Vec3::new(0.6, 1.6, 0.4));
        frame(&mut cam, &bounds).unwrap();

        let view_proj = cam.view_proj();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { bounds.min.x } else { bounds.max.x },
                if i & 2 == 0 { bounds.min.y } else { bounds.max.y },
                if i & 4 == 0 { bounds.min.z } else { bounds.max.z },
            );
            let ndc = view_proj.project_point3(corner);
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "corner {corner} at {ndc}");
        }
    }

    #[test]
    fn test_distance_grows_with_model_size() {
        let fov = CAMERA_FOV_DEGREES.to_radians();
        let mut last = 0.0;
        for step in 1..50 {
            let d = framing_distance(step as f32 * 0.25, fov);
            assert!(d >= last);
            last = d;
        }
        assert!(framing_distance(4.0, fov) > framing_distance(2.0, fov));
    }

    #[test]
    fn test_zero_volume_bounds_give_finite_positive_distance() {
        let mut cam = camera();
        frame(&mut cam, &Aabb::EMPTY).unwrap();
        assert!(cam.position.is_finite());
        assert!(cam.position.z >= MIN_FRAMING_DISTANCE);
    }

    #[test]
    fn test_non_finite_bounds_keep_prior_position() {
        let mut cam = camera();
        let before = cam.clone();
        let bounds = Aabb {
            min: Vec3::new(f32::NAN, 0.0, 0.0),
            max: Vec3::ONE,
        };
        assert_eq!(frame(&mut cam, &bounds), Err(FramingError::NonFiniteBounds));
        assert_eq!(cam, before);
    }

    #[test]
    fn test_invalid_fov_is_rejected() {
        let mut cam = camera();
        cam.fov_degrees = 0.0;
        let before = cam.clone();
        assert!(matches!(
            frame(&mut cam, &Aabb::EMPTY),
            Err(FramingError::InvalidFieldOfView(_))
        ));
        assert_eq!(cam, before);
    }
}
