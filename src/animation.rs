//! Idle animations for the supported vehicles
//!
//! Each vehicle has a rule naming the nodes it spins and their angular
//! speeds. Building resolves every node once; a missing node is an error,
//! never a silent no-op.

use crate::catalog::{ModelId, Vehicle};
use crate::error::{Result, ViewerError};
use crate::model::{NodeRef, SceneGraph};

/// Per-frame update; the argument is seconds since the previous frame
pub type AnimationFn = Box<dyn FnMut(f32) + Send>;

/// One animated node and its angular speed about X in radians per second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub node: &'static str,
    pub speed: f32,
}

const WHEEL_SPEED: f32 = 5.0;
const ROTOR_SPEED: f32 = 10.0;

const ROVER_WHEELS: [Spin; 6] = [
    Spin { node: "Wheels-F_R", speed: WHEEL_SPEED },
    Spin { node: "Wheels-M_R", speed: WHEEL_SPEED },
    Spin { node: "Wheels-F_L", speed: WHEEL_SPEED },
    Spin { node: "Wheels-M_L", speed: WHEEL_SPEED },
    Spin { node: "Wheels-R_R", speed: -WHEEL_SPEED },
    Spin { node: "Wheels-R_L", speed: -WHEEL_SPEED },
];

// Coaxial rotors turn in opposite directions.
const COAXIAL_ROTORS: [Spin; 2] = [
    Spin { node: "rotors_01", speed: ROTOR_SPEED },
    Spin { node: "rotors_02", speed: -ROTOR_SPEED },
];

/// Animation rule per supported model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationRule {
    /// Six-wheeled rover: front and middle wheels forward, rear wheels reversed
    Rover,
    /// Coaxial helicopter: counter-rotating rotor pair
    Rotorcraft,
}

impl AnimationRule {
    pub fn for_vehicle(vehicle: Vehicle) -> Self {
        match vehicle {
            Vehicle::Perseverance => Self::Rover,
            Vehicle::Ingenuity => Self::Rotorcraft,
        }
    }

    /// Rule for an identifier, by logical name
    pub fn for_model(id: &ModelId) -> Result<Self> {
        Vehicle::from_identifier(id)
            .map(Self::for_vehicle)
            .ok_or_else(|| ViewerError::UnsupportedModel(format!("no animation rule for {id}")))
    }

    pub fn spins(self) -> &'static [Spin] {
        match self {
            Self::Rover => &ROVER_WHEELS,
            Self::Rotorcraft => &COAXIAL_ROTORS,
        }
    }

    /// Resolve every node of this rule against `scene`
    pub fn bind(self, scene: &SceneGraph) -> Result<Animator> {
        let mut bound = Vec::with_capacity(self.spins().len());
        let mut missing = Vec::new();

        for spin in self.spins() {
            match scene.find_by_name(spin.node) {
                Some(node) => bound.push((node, spin.speed)),
                None => missing.push(spin.node),
            }
        }

        if !missing.is_empty() {
            return Err(ViewerError::UnsupportedModel(format!(
                "{:?} scene is missing nodes: {}",
                self,
                missing.join(", ")
            )));
        }
        Ok(Animator { rule: self, bound })
    }
}

/// Nodes bound to their speeds, ready to advance
#[derive(Debug, Clone)]
pub struct Animator {
    rule: AnimationRule,
    bound: Vec<(NodeRef, f32)>,
}

impl Animator {
    pub fn rule(&self) -> AnimationRule {
        self.rule
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRef> {
        self.bound.iter().map(|(node, _)| node)
    }

    /// Advance every bound node by `speed * delta`
    pub fn advance(&mut self, delta: f32) {
        for (node, speed) in &self.bound {
            node.rotate_x(speed * delta);
        }
    }

    pub fn into_fn(mut self) -> AnimationFn {
        Box::new(move |delta| self.advance(delta))
    }
}

/// Build the per-frame animation for `id` against its parsed scene
pub fn build(id: &ModelId, scene: &SceneGraph) -> Result<AnimationFn> {
    let animator = AnimationRule::for_model(id)?.bind(scene)?;
    log::debug!("Bound {:?} animation for {id}", animator.rule());
    Ok(animator.into_fn())
}
