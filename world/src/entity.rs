//! Pooled entity state and the strategies that recycle it.

use wave_warden_core::{EntityTemplate, MovementTarget, Signal, Vec3, WaveId};

use crate::pool::PoolStrategies;

/// Arguments handed to the pool when an entity is activated.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Activation {
    pub(crate) position: Vec3,
    pub(crate) wave: WaveId,
    pub(crate) template: EntityTemplate,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Body {
    pub(crate) velocity: Vec3,
    pub(crate) kinematic: bool,
}

impl Body {
    const AT_REST: Self = Self {
        velocity: Vec3::ZERO,
        kinematic: false,
    };
}

/// Damage counter that raises the death signal at the health threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Vitality {
    health: f32,
    damage: f32,
}

impl Vitality {
    fn fresh(health: f32) -> Self {
        Self {
            health,
            damage: 0.0,
        }
    }

    /// Accumulates damage and reports whether the threshold is reached.
    ///
    /// Keeps reporting death on every call past the threshold.
    pub(crate) fn absorb(&mut self, amount: f32) -> bool {
        if amount.is_finite() && amount > 0.0 {
            self.damage += amount;
        }
        self.damage >= self.health
    }

    pub(crate) fn damage(&self) -> f32 {
        self.damage
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) position: Vec3,
    pub(crate) visible: bool,
    pub(crate) target: Option<MovementTarget>,
    pub(crate) wave: Option<WaveId>,
    pub(crate) body: Body,
    pub(crate) vitality: Vitality,
    pub(crate) death: Signal,
}

pub(crate) const STRATEGIES: PoolStrategies<Entity, Activation> = PoolStrategies {
    create,
    on_acquire: activate,
    on_release: deactivate,
    dispose,
};

fn create(activation: &Activation) -> Entity {
    Entity {
        position: activation.position,
        visible: false,
        target: None,
        wave: None,
        body: Body::AT_REST,
        vitality: Vitality::fresh(activation.template.health),
        death: Signal::new(),
    }
}

fn activate(entity: &mut Entity, activation: &Activation) {
    if !entity.death.is_empty() {
        tracing::warn!(
            leftover = entity.death.len(),
            "dropping death subscriptions left from a previous activation"
        );
        let _ = entity.death.clear();
    }

    entity.position = activation.position;
    entity.visible = false;
    entity.target = Some(MovementTarget::Observer);
    entity.wave = Some(activation.wave);
    entity.body = Body::AT_REST;
    entity.vitality = Vitality::fresh(activation.template.health);
}

fn deactivate(entity: &mut Entity) {
    entity.visible = false;
    entity.target = None;
    entity.wave = None;
    entity.body = Body::AT_REST;
}

fn dispose(entity: Entity) {
    tracing::trace!(position = ?entity.position, "disposing pooled entity");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activation() -> Activation {
        Activation {
            position: Vec3::new(1.0, 0.0, 2.0),
            wave: WaveId::new(4),
            template: EntityTemplate {
                half_height: 1.0,
                health: 10.0,
            },
        }
    }

    #[test]
    fn vitality_reports_death_at_threshold_and_beyond() {
        let mut vitality = Vitality::fresh(10.0);
        assert!(!vitality.absorb(4.0));
        assert!(vitality.absorb(6.0));
        assert!(vitality.absorb(1.0));
        assert!((vitality.damage() - 11.0).abs() < f32::EPSILON);
    }

    #[test]
    fn vitality_ignores_negative_damage() {
        let mut vitality = Vitality::fresh(5.0);
        assert!(!vitality.absorb(-20.0));
        assert!(!vitality.absorb(f32::NAN));
        assert!(vitality.damage().abs() < f32::EPSILON);
    }

    #[test]
    fn activation_hides_entity_and_targets_observer() {
        let mut entity = create(&activation());
        entity.visible = true;
        activate(&mut entity, &activation());

        assert!(!entity.visible);
        assert_eq!(entity.target, Some(MovementTarget::Observer));
        assert_eq!(entity.wave, Some(WaveId::new(4)));
    }

    #[test]
    fn deactivation_resets_physical_state() {
        let mut entity = create(&activation());
        activate(&mut entity, &activation());
        entity.body = Body {
            velocity: Vec3::new(3.0, 1.0, 0.0),
            kinematic: true,
        };

        deactivate(&mut entity);

        assert_eq!(entity.body, Body::AT_REST);
        assert!(entity.target.is_none());
    }
}
