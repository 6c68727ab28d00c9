//! Semantic scene roles
//!
//! The cabinet model exposes named nodes. Names are resolved to roles once
//! when the model loads; after that the renderer only deals with
//! [`SceneRole`] and the poses computed here from [`MachineState`].

use std::collections::HashMap;

use glam::Vec3;

use crate::consts::{CARRIAGE_OFFSET_Y, TRACK_RAIL_X};
use crate::sim::MachineState;

/// Parts of the cabinet that follow the claw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneRole {
    /// The grabbing end-effector
    ClawGrip,
    /// Carriage the grip hangs from
    ClawBase,
    /// Rail the carriage slides along (moves in z only)
    TrackRail,
    /// Prize shown in the grip after a win
    Prize,
}

impl SceneRole {
    pub const ALL: [SceneRole; 4] = [
        SceneRole::ClawGrip,
        SceneRole::ClawBase,
        SceneRole::TrackRail,
        SceneRole::Prize,
    ];

    /// Node name used by the cabinet model
    pub fn node_name(&self) -> &'static str {
        match self {
            SceneRole::ClawGrip => "claw",
            SceneRole::ClawBase => "clawBase",
            SceneRole::TrackRail => "track",
            SceneRole::Prize => "bear",
        }
    }

    pub fn from_node_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.node_name() == name)
    }

    fn index(&self) -> usize {
        match self {
            SceneRole::ClawGrip => 0,
            SceneRole::ClawBase => 1,
            SceneRole::TrackRail => 2,
            SceneRole::Prize => 3,
        }
    }
}

/// Role to node index, built once from the model's node list
#[derive(Debug, Clone, Default)]
pub struct SceneBindings {
    nodes: HashMap<SceneRole, usize>,
}

impl SceneBindings {
    /// Bind roles from `(node index, node name)` pairs. First match wins.
    pub fn bind<'a>(nodes: impl IntoIterator<Item = (usize, &'a str)>) -> Self {
        let mut bound = HashMap::new();
        for (index, name) in nodes {
            if let Some(role) = SceneRole::from_node_name(name) {
                bound.entry(role).or_insert(index);
            }
        }
        for role in SceneRole::ALL {
            if !bound.contains_key(&role) {
                log::warn!("Model has no node for {:?} ({})", role, role.node_name());
            }
        }
        Self { nodes: bound }
    }

    pub fn node(&self, role: SceneRole) -> Option<usize> {
        self.nodes.get(&role).copied()
    }

    pub fn is_complete(&self) -> bool {
        SceneRole::ALL.iter().all(|r| self.nodes.contains_key(r))
    }
}

/// Pose of one role
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolePose {
    pub translation: Vec3,
    pub visible: bool,
}

impl Default for RolePose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            visible: true,
        }
    }
}

/// Current pose of every role
#[derive(Debug, Clone, Default)]
pub struct SceneRig {
    poses: [RolePose; 4],
}

impl SceneRig {
    pub fn new(state: &MachineState) -> Self {
        let mut rig = Self::default();
        rig.place_carriage(state.claw);
        rig.update(state);
        rig
    }

    /// Recompute poses. The carriage keeps its last idle pose while a round
    /// is in flight; only the grip and prize follow the drop.
    pub fn update(&mut self, state: &MachineState) {
        let claw = state.claw;
        self.poses[SceneRole::ClawGrip.index()] = RolePose {
            translation: claw,
            visible: true,
        };
        self.poses[SceneRole::Prize.index()] = RolePose {
            translation: claw,
            visible: state.holding,
        };
        if state.is_idle() {
            self.place_carriage(claw);
        }
    }

    fn place_carriage(&mut self, claw: Vec3) {
        let carriage_y = claw.y + CARRIAGE_OFFSET_Y;
        self.poses[SceneRole::ClawBase.index()] = RolePose {
            translation: Vec3::new(claw.x, carriage_y, claw.z),
            visible: true,
        };
        self.poses[SceneRole::TrackRail.index()] = RolePose {
            translation: Vec3::new(TRACK_RAIL_X, carriage_y, claw.z),
            visible: true,
        };
    }

    pub fn pose(&self, role: SceneRole) -> RolePose {
        self.poses[role.index()]
    }

    /// Poses paired with the bound node indices
    pub fn bound_poses<'a>(
        &'a self,
        bindings: &'a SceneBindings,
    ) -> impl Iterator<Item = (usize, RolePose)> + 'a {
        SceneRole::ALL
            .into_iter()
            .filter_map(move |role| bindings.node(role).map(|node| (node, self.pose(role))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RoundPhase;
    use crate::tuning::Tuning;

    #[test]
    fn test_bind_once_from_node_names() {
        let names = ["cabinet", "track", "claw", "clawBase", "bear", "claw"];
        let bindings = SceneBindings::bind(names.iter().copied().enumerate());
        assert!(bindings.is_complete());
        assert_eq!(bindings.node(SceneRole::ClawGrip), Some(2));
        assert_eq!(bindings.node(SceneRole::TrackRail), Some(1));
        assert_eq!(bindings.node(SceneRole::Prize), Some(4));
    }

    #[test]
    fn test_missing_roles() {
        let bindings = SceneBindings::bind([(0, "claw")]);
        assert!(!bindings.is_complete());
        assert_eq!(bindings.node(SceneRole::Prize), None);
    }

    #[test]
    fn test_idle_pose_follows_claw() {
        let mut state = MachineState::new(&Tuning::default());
        state.claw = Vec3::new(0.2, 2.7, -0.1);
        let rig = SceneRig::new(&state);

        assert_eq!(rig.pose(SceneRole::ClawGrip).translation, state.claw);
        let base = rig.pose(SceneRole::ClawBase).translation;
        assert!((base.y - 2.85).abs() < 1e-5);
        let rail = rig.pose(SceneRole::TrackRail).translation;
        assert_eq!(rail.x, TRACK_RAIL_X);
        assert_eq!(rail.z, -0.1);
        assert!(!rig.pose(SceneRole::Prize).visible);
    }

    #[test]
    fn test_carriage_frozen_during_round() {
        let mut state = MachineState::new(&Tuning::default());
        let mut rig = SceneRig::new(&state);
        let base_before = rig.pose(SceneRole::ClawBase);

        state.phase = RoundPhase::Lowering;
        state.claw.y = 2.2;
        state.holding = true;
        rig.update(&state);

        assert_eq!(rig.pose(SceneRole::ClawBase), base_before);
        assert_eq!(rig.pose(SceneRole::ClawGrip).translation.y, 2.2);
        assert!(rig.pose(SceneRole::Prize).visible);
    }

    #[test]
    fn test_bound_poses_skip_unbound() {
        let state = MachineState::new(&Tuning::default());
        let rig = SceneRig::new(&state);
        let bindings = SceneBindings::bind([(7, "claw"), (9, "bear")]);
        let nodes: Vec<usize> = rig.bound_poses(&bindings).map(|(n, _)| n).collect();
        assert_eq!(nodes, vec![7, 9]);
    }
}
