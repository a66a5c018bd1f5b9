//! Core simulation types: nodes, per-node values, flow channels, and result rows.

use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::face::FaceMap;

/// A thermal mass integrated by the solver.
///
/// Ambient is a boundary with an imposed temperature and has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Battery,
    InnerWall,
    OuterWall,
}

impl Node {
    pub const ALL: [Node; 3] = [Node::Battery, Node::InnerWall, Node::OuterWall];

    pub fn as_str(self) -> &'static str {
        match self {
            Node::Battery => "battery",
            Node::InnerWall => "inner_wall",
            Node::OuterWall => "outer_wall",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `f64` per integrated node: temperatures, capacities, or energies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerNode {
    pub battery: f64,
    pub inner_wall: f64,
    pub outer_wall: f64,
}

/// Node temperatures in °C.
pub type NodeTemperatures = PerNode;

impl PerNode {
    pub fn new(battery: f64, inner_wall: f64, outer_wall: f64) -> Self {
        Self {
            battery,
            inner_wall,
            outer_wall,
        }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Node, f64)> + '_ {
        Node::ALL.into_iter().map(move |n| (n, self[n]))
    }

    pub fn max(&self) -> f64 {
        self.battery.max(self.inner_wall).max(self.outer_wall)
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|(_, v)| v.is_finite())
    }
}

impl Index<Node> for PerNode {
    type Output = f64;

    fn index(&self, node: Node) -> &f64 {
        match node {
            Node::Battery => &self.battery,
            Node::InnerWall => &self.inner_wall,
            Node::OuterWall => &self.outer_wall,
        }
    }
}

impl IndexMut<Node> for PerNode {
    fn index_mut(&mut self, node: Node) -> &mut f64 {
        match node {
            Node::Battery => &mut self.battery,
            Node::InnerWall => &mut self.inner_wall,
            Node::OuterWall => &mut self.outer_wall,
        }
    }
}

impl AddAssign for PerNode {
    fn add_assign(&mut self, rhs: Self) {
        self.battery += rhs.battery;
        self.inner_wall += rhs.inner_wall;
        self.outer_wall += rhs.outer_wall;
    }
}

/// Heat carried by each mechanism across one path.
///
/// The unit is whatever the producer uses: watts from the network, joules in
/// a [`ResultRow`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Mechanisms {
    pub conduction: f64,
    pub convection: f64,
    pub radiation: f64,
}

impl Mechanisms {
    pub fn total(&self) -> f64 {
        self.conduction + self.convection + self.radiation
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            conduction: self.conduction * factor,
            convection: self.convection * factor,
            radiation: self.radiation * factor,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.conduction == 0.0 && self.convection == 0.0 && self.radiation == 0.0
    }
}

impl Add for Mechanisms {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            conduction: self.conduction + rhs.conduction,
            convection: self.convection + rhs.convection,
            radiation: self.radiation + rhs.radiation,
        }
    }
}

impl AddAssign for Mechanisms {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// One recorded simulation step.
///
/// Path channels are signed positive from the first-named node to the
/// second: battery → inner wall (per battery face), inner wall → outer wall,
/// outer wall → ambient (per container face). Solar gain and heater terms
/// are positive into their node. Node net energies are positive when the
/// node gains energy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    /// Start of the step.
    pub timestamp: NaiveDateTime,
    /// Ambient temperature imposed for the step (°C).
    pub ambient_c: f64,
    /// Horizontal irradiance for the step (W/m²).
    pub irradiance_w_m2: f64,
    /// Electrical load served by the battery (W).
    pub load_w: f64,
    /// Relative humidity passed through from the weather feed (%).
    pub relative_humidity_pct: Option<f64>,
    /// Node temperatures at the end of the step (°C).
    pub temperatures: NodeTemperatures,
    pub heater_on: bool,
    /// Electrical energy drawn by the heater (J).
    pub heater_energy_j: f64,
    pub heater_to_battery_j: f64,
    /// Heater output lost to the enclosed air; tracked only.
    pub heater_to_air_j: f64,
    /// Internal loss heat generated inside the battery (J).
    pub battery_loss_heat_j: f64,
    /// Battery → inner wall energy per battery face (J).
    pub battery_faces: FaceMap<Mechanisms>,
    pub inner_outer_conduction_j: f64,
    /// Outer wall → ambient energy per container face (J).
    pub container_faces: FaceMap<Mechanisms>,
    pub solar_gain_j: f64,
    /// Net energy gained by each node during the step (J).
    pub node_net_j: PerNode,
    /// Running total of `node_net_j` from the first step (J).
    pub cumulative_j: PerNode,
    /// Internal integration sub-steps used for this row.
    pub substeps: u32,
}

impl ResultRow {
    /// Battery → inner wall energy summed over faces (J).
    pub fn battery_inner(&self) -> Mechanisms {
        sum_faces(&self.battery_faces)
    }

    /// Outer wall → ambient energy summed over faces (J).
    pub fn outer_ambient(&self) -> Mechanisms {
        sum_faces(&self.container_faces)
    }
}

pub(crate) fn sum_faces(faces: &FaceMap<Mechanisms>) -> Mechanisms {
    faces
        .iter()
        .fold(Mechanisms::default(), |acc, (_, m)| acc + m)
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | amb={:>6.2}°C bat={:>6.2}°C in={:>6.2}°C out={:>6.2}°C | heater={} {:>8.1} J | net bat={:>9.1} J",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.ambient_c,
            self.temperatures.battery,
            self.temperatures.inner_wall,
            self.temperatures.outer_wall,
            if self.heater_on { "on " } else { "off" },
            self.heater_energy_j,
            self.node_net_j.battery,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_node_index_targets_named_node() {
        let mut v = PerNode::new(1.0, 2.0, 3.0);
        v[Node::InnerWall] = 5.0;
        assert_eq!(v.inner_wall, 5.0);
        assert_eq!(v[Node::OuterWall], 3.0);
        assert_eq!(v.max(), 5.0);
    }

    #[test]
    fn mechanisms_total_and_scale() {
        let m = Mechanisms {
            conduction: 1.0,
            convection: 2.0,
            radiation: 0.5,
        };
        assert_eq!(m.total(), 3.5);
        assert_eq!(m.scaled(60.0).total(), 210.0);
        assert!(Mechanisms::default().is_zero());
    }

    #[test]
    fn per_node_accumulates() {
        let mut acc = PerNode::default();
        acc += PerNode::new(1.0, -2.0, 0.5);
        acc += PerNode::new(1.0, -2.0, 0.5);
        assert_eq!(acc, PerNode::new(2.0, -4.0, 1.0));
    }

    #[test]
    fn face_energies_add_up_per_face() {
        use crate::model::face::Face;

        let one = Mechanisms {
            conduction: 1.0,
            convection: 0.0,
            radiation: 0.25,
        };
        let mut faces = FaceMap::<Mechanisms>::default();
        faces[Face::Bottom] = one;
        let mut acc = FaceMap::<Mechanisms>::default();
        acc += faces;
        acc += faces;
        assert_eq!(acc[Face::Bottom].total(), 2.5);
        assert!(acc[Face::Top].is_zero());
        assert_eq!(sum_faces(&acc).radiation, 0.5);
    }
}
