use glam::Vec3;

/// Axis-aligned box, as produced by the scene for each placed model.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Build boxes from a flat `[min.x, min.y, min.z, max.x, max.y, max.z, ...]` list.
    /// A trailing partial group is ignored.
    pub fn from_flat(values: &[f32]) -> Vec<Aabb> {
        values
            .chunks_exact(6)
            .map(|c| Aabb::new(Vec3::new(c[0], c[1], c[2]), Vec3::new(c[3], c[4], c[5])))
            .collect()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Slab test. Returns the ray parameter of the entry point, or of the exit
    /// point when the origin is inside the box. `None` if the box is missed or
    /// lies entirely behind the origin.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        const EPSILON: f32 = 1e-8;

        // Near-zero components get a huge finite inverse instead of inf so that
        // 0 * inf never turns into NaN for origins on a slab plane.
        let inv = |d: f32| {
            if d.abs() < EPSILON {
                1.0 / EPSILON.copysign(d)
            } else {
                1.0 / d
            }
        };
        let inv_dir = Vec3::new(inv(self.dir.x), inv(self.dir.y), inv(self.dir.z));

        let t_min = (aabb.min - self.origin) * inv_dir;
        let t_max = (aabb.max - self.origin) * inv_dir;

        let t1 = t_min.min(t_max);
        let t2 = t_min.max(t_max);

        let t_near = t1.max_element();
        let t_far = t2.min_element();

        if t_near > t_far || t_far < 0.0 {
            return None;
        }

        Some(if t_near >= 0.0 { t_near } else { t_far })
    }

    /// World-space hit point, see [`Ray::intersect_aabb`].
    pub fn hit_point(&self, aabb: &Aabb) -> Option<Vec3> {
        self.intersect_aabb(aabb).map(|t| self.at(t))
    }
}
