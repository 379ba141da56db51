//! Entity arena holding the scene graph.
//!
//! Entities live in a flat `Vec<Option<Entity>>` and refer to each other by
//! [`EntityId`]. Slots are never reused, so a stale id simply resolves to
//! nothing. Despawned ids are queued for the renderer, which frees the GPU
//! resources it created for them.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::material::Drawable;

/// Index of an entity in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// What role an entity plays in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Grouping node without geometry.
    Group,
    /// Rotating node that carries an orbiting child.
    Pivot,
    Mesh,
    Light,
    Line,
    Points,
}

/// Local transform. Rotation is Euler angles applied in XYZ order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.translation)
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub transform: Transform,
    pub visible: bool,
    pub drawable: Option<Drawable>,
}

#[derive(Debug, Default)]
pub struct SceneArena {
    entities: Vec<Option<Entity>>,
    released: Vec<EntityId>,
}

impl SceneArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity under `parent` (or at the root).
    ///
    /// A parent id that no longer resolves leaves the entity at the root.
    /// Ids are never reused. Each despawn leaves one vacant slot
    /// (see [`slot_count`](Self::slot_count)).
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        kind: EntityKind,
        parent: Option<EntityId>,
        transform: Transform,
        drawable: Option<Drawable>,
    ) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        let parent = parent.filter(|&p| self.get(p).is_some());
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.push(id);
        }
        self.entities.push(Some(Entity {
            name: name.into(),
            kind,
            parent,
            children: Vec::new(),
            transform,
            visible: true,
            drawable,
        }));
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform> {
        self.get_mut(id).map(|e| &mut e.transform)
    }

    pub fn drawable_mut(&mut self, id: EntityId) -> Option<&mut Drawable> {
        self.get_mut(id).and_then(|e| e.drawable.as_mut())
    }

    /// Add `delta` to the entity's Y rotation.
    pub fn rotate_y(&mut self, id: EntityId, delta: f32) {
        if let Some(t) = self.transform_mut(id) {
            t.rotation.y += delta;
        }
    }

    pub fn set_visible(&mut self, id: EntityId, visible: bool) {
        if let Some(e) = self.get_mut(id) {
            e.visible = visible;
        }
    }

    /// Visible itself and through every ancestor.
    pub fn is_visible(&self, id: EntityId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.get(cur) {
                Some(e) if e.visible => current = e.parent,
                _ => return false,
            }
        }
        true
    }

    /// Remove an entity and its whole subtree. Returns how many entities were removed.
    pub fn despawn(&mut self, id: EntityId) -> usize {
        let Some(parent) = self.get(id).map(|e| e.parent) else {
            return 0;
        };
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|&c| c != id);
        }

        let mut stack = vec![id];
        let mut removed = 0;
        while let Some(cur) = stack.pop() {
            if let Some(entity) = self.entities.get_mut(cur.0 as usize).and_then(Option::take) {
                stack.extend(entity.children);
                self.released.push(cur);
                removed += 1;
            }
        }
        removed
    }

    /// Remove every entity.
    pub fn clear(&mut self) {
        let roots: Vec<EntityId> = self
            .iter()
            .filter(|(_, e)| e.parent.is_none())
            .map(|(id, _)| id)
            .collect();
        for root in roots {
            self.despawn(root);
        }
    }

    /// Ids removed since the last call.
    pub fn drain_released(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.released)
    }

    /// Compose local transforms from the root down to `id`.
    pub fn world_matrix(&self, id: EntityId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.get(cur) {
                Some(e) => {
                    matrix = e.transform.matrix() * matrix;
                    current = e.parent;
                }
                None => break,
            }
        }
        matrix
    }

    pub fn world_position(&self, id: EntityId) -> Vec3 {
        self.world_matrix(id).w_axis.truncate()
    }

    /// Live entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EntityId(i as u32), e)))
    }

    pub fn len(&self) -> usize {
        self.entities.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots ever allocated, live or vacant. Grows by one per spawn.
    pub fn slot_count(&self) -> usize {
        self.entities.len()
    }
}
